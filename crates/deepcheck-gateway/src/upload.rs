//! Multipart upload intake and transient file cleanup.

use std::path::{Path, PathBuf};

use axum::extract::Multipart;
use axum::extract::multipart::Field;
use chrono::Utc;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, warn};

use deepcheck_types::UploadedMedia;

use crate::error::ApiError;

/// Multipart field carrying the media file.
pub const MEDIA_FIELD: &str = "media";

const FALLBACK_MIME: &str = "application/octet-stream";
const MAX_NAME_LEN: usize = 100;

/// Store the first `media` file field under `upload_dir`.
///
/// Other fields, and `media` fields without a file name, are skipped. Nothing
/// is written unless a `media` file is present.
pub async fn receive_upload(
    mut multipart: Multipart,
    upload_dir: &Path,
) -> Result<UploadedMedia, ApiError> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Err(ApiError::NoFile),
            Err(e) => {
                warn!("Malformed multipart body: {e}");
                return Err(ApiError::NoFile);
            }
        };

        if field.name() != Some(MEDIA_FIELD) {
            continue;
        }
        let Some(original_filename) = field.file_name().map(String::from) else {
            continue;
        };

        let mime_type = field.content_type().unwrap_or(FALLBACK_MIME).to_string();
        let path = upload_dir.join(stored_file_name(&original_filename));

        let bytes = store_field(field, &path).await?;
        debug!(path = %path.display(), bytes, "Upload stored");

        return Ok(UploadedMedia {
            path,
            mime_type,
            original_filename,
        });
    }
}

/// Stream one field to disk, removing the partial file if the body breaks off
/// or the request is dropped mid-stream.
async fn store_field(mut field: Field<'_>, path: &Path) -> Result<u64, ApiError> {
    let mut partial = PartialUpload::new(path);
    let mut file = tokio::fs::File::create(path).await.map_err(|e| {
        error!(path = %path.display(), "Failed to create upload file: {e}");
        ApiError::AnalysisFailed
    })?;

    let mut written = 0u64;
    let outcome = async {
        while let Some(chunk) = field.chunk().await.map_err(|e| e.to_string())? {
            file.write_all(&chunk).await.map_err(|e| e.to_string())?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(|e| e.to_string())
    }
    .await;

    if let Err(e) = outcome {
        error!(path = %path.display(), "Upload interrupted: {e}");
        return Err(ApiError::AnalysisFailed);
    }
    partial.complete();
    Ok(written)
}

/// Deletes the file at `path` on drop unless marked complete.
struct PartialUpload<'a> {
    path: &'a Path,
    complete: bool,
}

impl<'a> PartialUpload<'a> {
    fn new(path: &'a Path) -> Self {
        Self {
            path,
            complete: false,
        }
    }

    fn complete(&mut self) {
        self.complete = true;
    }
}

impl Drop for PartialUpload<'_> {
    fn drop(&mut self) {
        if self.complete {
            return;
        }
        match std::fs::remove_file(self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed partial upload"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), "Failed to remove partial upload: {e}"),
        }
    }
}

/// `<unix millis>-<8 hex>-<sanitized name>`.
pub fn stored_file_name(original: &str) -> String {
    let unique = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}-{}",
        Utc::now().timestamp_millis(),
        &unique[..8],
        sanitize_file_name(original)
    )
}

/// Keep only the last path component, restricted to `[A-Za-z0-9._-]`.
fn sanitize_file_name(original: &str) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_NAME_LEN)
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Remove the request's upload. Missing files are not an error.
pub async fn discard(media: &UploadedMedia) {
    remove_transient(&media.path).await;
}

async fn remove_transient(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "Removed upload"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), "Failed to remove upload: {e}"),
    }
}

/// Create the upload directory if it does not exist yet.
pub async fn ensure_upload_dir(dir: &Path) -> std::io::Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    Ok(dir.to_path_buf())
}
