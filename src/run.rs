use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::{Datelike, NaiveDate};
use reqwest::{Client, Url};
use tracing::{debug, info, warn};

use crate::calendar::page_indices;
use crate::config::Config;
use crate::images::{DocumentToImages, converter_for, image_path};
use crate::links::locate_menu_link;
use crate::pdf::{download_document, extract_pages, extract_text};
use crate::slack::{SlackClient, summary_message};

/// What a run did, for logging and for tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub date: NaiveDate,
    pub page_indices: Vec<usize>,
    pub link: Option<Url>,
    pub artifacts: Vec<PathBuf>,
    pub permalinks: Vec<String>,
    pub message_posted: bool,
    pub removed: Vec<PathBuf>,
}

impl RunReport {
    fn new(date: NaiveDate, page_indices: Vec<usize>) -> Self {
        RunReport {
            date,
            page_indices,
            link: None,
            artifacts: Vec::new(),
            permalinks: Vec::new(),
            message_posted: false,
            removed: Vec::new(),
        }
    }
}

pub fn build_client() -> anyhow::Result<Client> {
    let client = Client::builder()
        // Avoid macOS system proxy lookup that can panic in sandboxed contexts.
        .no_proxy()
        .user_agent("noon-menu-bot/0.1")
        .build()?;
    Ok(client)
}

pub fn format_date(date: NaiveDate) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}

pub fn document_path(work_dir: &Path, date: NaiveDate) -> PathBuf {
    work_dir.join(format!("{}-menu.pdf", format_date(date)))
}

pub async fn run(config: &Config) -> anyhow::Result<RunReport> {
    let client = build_client()?;
    run_with(config, &client, converter_for(config)).await
}

/// One complete run: locate, download, extract, convert, post, clean up.
pub async fn run_with(
    config: &Config,
    client: &Client,
    converter: Arc<dyn DocumentToImages>,
) -> anyhow::Result<RunReport> {
    let date = config.run_date();
    let indices = page_indices(
        date.weekday(),
        config.full_noon_days.as_slice(),
        config.green_noon_days(),
        config.language,
    );
    let mut report = RunReport::new(date, indices.clone());

    if indices.is_empty() {
        info!(%date, weekday = %date.weekday(), "no menu configured for this weekday");
        return Ok(report);
    }
    info!(%date, ?indices, "selected menu pages");

    let link = locate_menu_link(client, config, date).await?;
    info!(url = %link.url, "found menu link");
    report.link = Some(link.url.clone());

    info!("downloading menu");
    let menu = download_document(client, &link.url)
        .await
        .with_context(|| format!("downloading {}", link.url))?;

    info!("extracting pages");
    let extracted = extract_pages(&menu, &indices)?;

    let pdf_path = document_path(&config.work_dir, date);
    tokio::fs::write(&pdf_path, &extracted)
        .await
        .with_context(|| format!("writing {}", pdf_path.display()))?;
    debug!(path = %pdf_path.display(), "saved extracted menu");

    let mut written = vec![pdf_path.clone()];
    let outcome = publish(
        config,
        client,
        converter,
        &pdf_path,
        &extracted,
        &mut written,
        &mut report,
    )
    .await;

    info!("removing local files");
    report.removed = cleanup(&written).await;

    outcome.map(|()| report)
}

async fn publish(
    config: &Config,
    client: &Client,
    converter: Arc<dyn DocumentToImages>,
    pdf_path: &Path,
    extracted: &[u8],
    written: &mut Vec<PathBuf>,
    report: &mut RunReport,
) -> anyhow::Result<()> {
    debug!(converter = converter.name(), "converting menu");
    let images = {
        let pdf = pdf_path.to_path_buf();
        tokio::task::spawn_blocking(move || converter.convert(&pdf)).await?
    };
    let artifacts = match images {
        Ok(images) if images.is_empty() => vec![pdf_path.to_path_buf()],
        Ok(images) => {
            info!(count = images.len(), "converted menu to images");
            images
        }
        Err(e) => {
            // a failed render may have left some pages behind
            written.extend((1..=report.page_indices.len()).map(|n| image_path(pdf_path, n)));
            return Err(e.context("converting menu to images"));
        }
    };
    written.extend(artifacts.iter().cloned());
    report.artifacts = artifacts.clone();

    if config.dry_run {
        match extract_text(extracted) {
            Ok(text) => info!("dry run, not posting. Extracted menu text:\n{text}"),
            Err(e) => warn!("dry run, not posting. Could not read menu text: {e}"),
        }
        return Ok(());
    }

    info!(count = artifacts.len(), "uploading to slack");
    let slack = SlackClient::new(client.clone(), config);
    let permalinks = slack.upload_files(&artifacts).await?;
    slack.post_message(&summary_message(&permalinks)).await?;

    report.permalinks = permalinks;
    report.message_posted = true;
    Ok(())
}

/// Removes every path once, concurrently. Returns the paths actually removed.
pub async fn cleanup(paths: &[PathBuf]) -> Vec<PathBuf> {
    let unique: BTreeSet<&PathBuf> = paths.iter().collect();
    let results = futures::future::join_all(
        unique
            .into_iter()
            .map(|path| async move { (path, tokio::fs::remove_file(path).await) }),
    )
    .await;

    let mut removed = Vec::new();
    for (path, result) in results {
        match result {
            Ok(()) => removed.push(path.clone()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "already gone")
            }
            Err(e) => warn!(path = %path.display(), "could not remove file: {e}"),
        }
    }
    removed
}
