//! HTTP client for the deepcheck server.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, bail};
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use tracing::debug;
use url::Url;

use deepcheck_types::{AnalysisResult, ErrorBody, HealthStatus};

/// Multipart field the server reads the file from.
const MEDIA_FIELD: &str = "media";

/// Model calls on large uploads can take a while.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

/// Client for `POST /api/analyze` and `GET /health`.
#[derive(Debug, Clone)]
pub struct AnalyzeClient {
    client: Client,
    base_url: Url,
}

impl AnalyzeClient {
    /// Create a client for the server at `base_url` (e.g. `http://127.0.0.1:3000`).
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let mut base_url =
            Url::parse(base_url).with_context(|| format!("invalid server URL: {base_url}"))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> anyhow::Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("invalid endpoint path: {path}"))
    }

    /// Upload in-memory bytes as the `media` file.
    pub async fn analyze_bytes(
        &self,
        file_name: &str,
        mime_type: &str,
        data: Vec<u8>,
    ) -> anyhow::Result<AnalysisResult> {
        let part = Part::bytes(data)
            .file_name(file_name.to_string())
            .mime_str(mime_type)
            .with_context(|| format!("invalid MIME type: {mime_type}"))?;
        let form = Form::new().part(MEDIA_FIELD, part);

        let url = self.endpoint("api/analyze")?;
        debug!(%url, file_name, mime_type, "Submitting media");

        let resp = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .context("analyze request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("analyze failed ({status}): {}", server_error_text(&body));
        }

        resp.json()
            .await
            .context("analyze response parse failed")
    }

    /// Upload a file from disk, inferring its MIME type from the extension.
    pub async fn analyze_file(&self, path: &Path) -> anyhow::Result<AnalysisResult> {
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        self.analyze_bytes(&file_name, mime_for_path(path), data)
            .await
    }

    /// Call `GET /health`.
    pub async fn health(&self) -> anyhow::Result<HealthStatus> {
        let resp = self
            .client
            .get(self.endpoint("health")?)
            .send()
            .await
            .context("health request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("health check failed ({status}): {}", server_error_text(&body));
        }

        resp.json()
            .await
            .context("health response parse failed")
    }
}

/// The server's `{"error": ...}` message, or the raw body when it is not one.
fn server_error_text(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) if body.trim().is_empty() => "empty response body".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

/// MIME type for a media file, by extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "heic" => "image/heic",
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" | "oga" => "audio/ogg",
        "m4a" => "audio/mp4",
        "flac" => "audio/flac",
        _ => "application/octet-stream",
    }
}
