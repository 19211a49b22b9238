//! Media types and external capability traits.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::FrameError;

/// Multimodal generation request.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    /// Instruction text sent ahead of the media.
    pub prompt: String,
    /// MIME type of `data`.
    pub mime_type: String,
    /// Raw media bytes (encoded for transport by the gateway).
    pub data: Vec<u8>,
}

/// Bytes ready for analysis, after any frame extraction.
#[derive(Debug, Clone)]
pub struct PreparedMedia {
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Trait for external multimodal models: given bytes, a MIME type and
/// instructions, return free text.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Gateway identifier.
    fn id(&self) -> &str;
    /// Run one completion. No retry is attempted.
    async fn generate(&self, req: ModelRequest) -> anyhow::Result<String>;
}

/// Trait for turning a video into one representative still image.
#[async_trait]
pub trait FrameExtractor: Send + Sync {
    /// Write a JPEG frame of `video` to `output`.
    async fn extract_frame(&self, video: &Path, output: &Path) -> Result<(), FrameError>;
}

/// Path of the still frame derived from an uploaded video.
pub fn frame_path_for(upload: &Path) -> PathBuf {
    let mut name = upload.as_os_str().to_owned();
    name.push(".jpg");
    PathBuf::from(name)
}
