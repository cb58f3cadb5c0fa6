use std::path::{Path, PathBuf};

use anyhow::Context;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::MenuError;

#[derive(Deserialize)]
struct UploadTicket {
    upload_url: String,
    file_id: String,
}

#[derive(Serialize)]
struct FileRef<'a> {
    id: &'a str,
    title: &'a str,
}

#[derive(Deserialize)]
struct CompletedUpload {
    files: Vec<UploadedFile>,
}

#[derive(Deserialize)]
struct UploadedFile {
    id: String,
    permalink: String,
}

/// Minimal Slack Web API client: file uploads and one message.
#[derive(Debug, Clone)]
pub struct SlackClient {
    http: Client,
    api_base: Url,
    token: String,
    channel: String,
}

impl SlackClient {
    pub fn new(http: Client, config: &Config) -> Self {
        SlackClient {
            http,
            api_base: config.slack_api_url.clone(),
            token: config.slack_token.clone(),
            channel: config.slack_channel_id.clone(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{method}", self.api_base.as_str().trim_end_matches('/'))
    }

    /// Sends an authenticated Web API call and unwraps Slack's `ok` envelope.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        request: RequestBuilder,
    ) -> anyhow::Result<T> {
        let body: Value = request
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .with_context(|| format!("decoding slack {method} response"))?;

        if !body.get("ok").and_then(Value::as_bool).unwrap_or(false) {
            let error = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown_error")
                .to_string();
            return Err(MenuError::Slack {
                method: method.to_string(),
                error,
            }
            .into());
        }

        let parsed = serde_json::from_value(body)
            .with_context(|| format!("unexpected slack {method} response"))?;
        Ok(parsed)
    }

    /// Uploads one file without sharing it anywhere and returns its permalink.
    pub async fn upload_file(&self, path: &Path) -> anyhow::Result<String> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "menu".to_string());

        let form = Form::new()
            .text("filename", filename.clone())
            .text("length", bytes.len().to_string());
        let ticket: UploadTicket = self
            .call(
                "files.getUploadURLExternal",
                self.http
                    .post(self.method_url("files.getUploadURLExternal"))
                    .multipart(form),
            )
            .await?;
        debug!(file_id = %ticket.file_id, %filename, "got upload url");

        let part = Part::bytes(bytes).file_name(filename.clone());
        self.http
            .post(&ticket.upload_url)
            .multipart(Form::new().part("file", part))
            .send()
            .await?
            .error_for_status()
            .with_context(|| format!("uploading {filename}"))?;

        let files = serde_json::to_string(&[FileRef {
            id: &ticket.file_id,
            title: &filename,
        }])?;
        let completed: CompletedUpload = self
            .call(
                "files.completeUploadExternal",
                self.http
                    .post(self.method_url("files.completeUploadExternal"))
                    .multipart(Form::new().text("files", files)),
            )
            .await?;

        let permalink = completed
            .files
            .into_iter()
            .find(|file| file.id == ticket.file_id)
            .map(|file| file.permalink)
            .ok_or_else(|| MenuError::Slack {
                method: "files.completeUploadExternal".to_string(),
                error: format!("no permalink returned for {}", ticket.file_id),
            })?;
        info!(%filename, %permalink, "uploaded file");
        Ok(permalink)
    }

    /// Uploads all files concurrently. Permalinks come back in input order.
    pub async fn upload_files(&self, paths: &[PathBuf]) -> anyhow::Result<Vec<String>> {
        futures::future::try_join_all(paths.iter().map(|path| self.upload_file(path))).await
    }

    pub async fn post_message(&self, text: &str) -> anyhow::Result<()> {
        let _: Value = self
            .call(
                "chat.postMessage",
                self.http
                    .post(self.method_url("chat.postMessage"))
                    .json(&json!({ "channel": self.channel, "text": text })),
            )
            .await?;
        info!(channel = %self.channel, "posted menu message");
        Ok(())
    }
}

/// One message embedding every uploaded file without printing its URL.
pub fn summary_message(permalinks: &[String]) -> String {
    permalinks
        .iter()
        .map(|permalink| format!("<{permalink}| >"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_concatenates_hidden_links() {
        let permalinks = vec![
            "https://acme.slack.com/files/U1/F1/menu-1.jpg".to_string(),
            "https://acme.slack.com/files/U1/F2/menu-2.jpg".to_string(),
        ];
        assert_eq!(
            summary_message(&permalinks),
            "<https://acme.slack.com/files/U1/F1/menu-1.jpg| >\
             <https://acme.slack.com/files/U1/F2/menu-2.jpg| >"
        );
        assert_eq!(summary_message(&[]), "");
    }

    #[test]
    fn file_refs_serialize_as_slack_expects() {
        let files = serde_json::to_string(&[FileRef {
            id: "F123",
            title: "2024-10-16-menu.pdf",
        }])
        .unwrap();
        assert_eq!(files, r#"[{"id":"F123","title":"2024-10-16-menu.pdf"}]"#);
    }
}
