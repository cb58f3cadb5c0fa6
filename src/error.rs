use thiserror::Error;

/// Failures the menu pipeline reports on its own terms.
///
/// Transport and filesystem errors are not wrapped here; they travel as
/// `anyhow::Error` with context attached at the call site.
#[derive(Error, Debug)]
pub enum MenuError {
    #[error(
        "no menu link contains both {week_marker:?} and {weekday_marker:?}; candidates were:\n{}",
        candidates.join("\n")
    )]
    LinkNotFound {
        week_marker: String,
        weekday_marker: String,
        candidates: Vec<String>,
    },

    #[error("page index {index} is out of range for a document with {page_count} pages")]
    PageOutOfRange { index: usize, page_count: usize },

    #[error("menu document is malformed: {0}")]
    MalformedDocument(String),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("slack {method} failed: {error}")]
    Slack { method: String, error: String },
}
