use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use image::ExtendedColorType;
use image::codecs::jpeg::JpegEncoder;
use pdfium_render::prelude::*;
use tracing::{debug, warn};

use crate::config::Config;

/// Turns a PDF on disk into one image file per page.
pub trait DocumentToImages: Send + Sync {
    fn name(&self) -> &str;

    /// Writes the images and returns their paths in page order. An empty list
    /// means the PDF itself should be posted.
    fn convert(&self, pdf: &Path) -> anyhow::Result<Vec<PathBuf>>;
}

/// Used when image conversion is switched off.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoImages;

impl DocumentToImages for NoImages {
    fn name(&self) -> &str {
        "none"
    }

    fn convert(&self, _pdf: &Path) -> anyhow::Result<Vec<PathBuf>> {
        Ok(Vec::new())
    }
}

/// Fixed rendering settings for menu pages.
#[derive(Debug, Clone, Copy)]
pub struct ImageOptions {
    pub dpi: f32,
    pub jpeg_quality: u8,
    pub background: PdfColor,
}

impl Default for ImageOptions {
    fn default() -> Self {
        ImageOptions {
            dpi: 150.0,
            jpeg_quality: 90,
            background: PdfColor::WHITE,
        }
    }
}

/// Renders pages through a dynamically loaded pdfium library.
#[derive(Debug, Clone, Default)]
pub struct PdfiumRasterizer {
    library_dir: Option<PathBuf>,
    options: ImageOptions,
}

impl PdfiumRasterizer {
    pub fn new(library_dir: Option<PathBuf>, options: ImageOptions) -> Self {
        PdfiumRasterizer {
            library_dir,
            options,
        }
    }

    /// Looks in the configured directory first, then the working directory,
    /// then the system library paths.
    fn bind(&self) -> anyhow::Result<Pdfium> {
        let configured = self.library_dir.as_ref().and_then(|dir| {
            match Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir)) {
                Ok(bindings) => Some(bindings),
                Err(e) => {
                    warn!(
                        dir = %dir.display(),
                        "configured pdfium library did not load, falling back: {e:?}"
                    );
                    None
                }
            }
        });
        let bindings = match configured {
            Some(bindings) => Ok(bindings),
            None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library()),
        }
        .map_err(|e| anyhow::anyhow!("failed to load the pdfium library: {e:?}"))?;
        Ok(Pdfium::new(bindings))
    }
}

impl DocumentToImages for PdfiumRasterizer {
    fn name(&self) -> &str {
        "pdfium"
    }

    fn convert(&self, pdf: &Path) -> anyhow::Result<Vec<PathBuf>> {
        let pdfium = self.bind()?;
        let document = pdfium
            .load_pdf_from_file(pdf, None)
            .map_err(|e| anyhow::anyhow!("pdfium could not open {}: {e:?}", pdf.display()))?;

        let render_config = PdfRenderConfig::new()
            .scale_page_by_factor(self.options.dpi / 72.0)
            .set_clear_color(self.options.background)
            .render_form_data(true);

        let mut written = Vec::new();
        for (index, page) in document.pages().iter().enumerate() {
            let bitmap = page
                .render_with_config(&render_config)
                .map_err(|e| anyhow::anyhow!("rendering page {} failed: {e:?}", index + 1))?;
            // JPEG has no alpha channel; the clear colour already filled the
            // transparent areas.
            let rgb = bitmap.as_image().to_rgb8();

            let path = image_path(pdf, index + 1);
            let file = File::create(&path)
                .with_context(|| format!("creating {}", path.display()))?;
            let mut encoder =
                JpegEncoder::new_with_quality(BufWriter::new(file), self.options.jpeg_quality);
            encoder
                .encode(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
                .with_context(|| format!("encoding {}", path.display()))?;
            debug!(path = %path.display(), "wrote page image");
            written.push(path);
        }
        Ok(written)
    }
}

/// `<dir>/<stem>-<n>.jpg` for the n-th (1-based) page of `pdf`.
pub fn image_path(pdf: &Path, page_number: usize) -> PathBuf {
    let stem = pdf
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "menu".to_string());
    pdf.with_file_name(format!("{stem}-{page_number}.jpg"))
}

pub fn converter_for(config: &Config) -> Arc<dyn DocumentToImages> {
    if config.convert_to_images {
        Arc::new(PdfiumRasterizer::new(
            config.pdfium_library.clone(),
            ImageOptions::default(),
        ))
    } else {
        Arc::new(NoImages)
    }
}
