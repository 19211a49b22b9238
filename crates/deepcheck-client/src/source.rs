//! Frame sources for live scanning.

use std::path::PathBuf;
use std::process::Stdio;

use anyhow::{Context, bail};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

/// File name every live-scan frame is uploaded under.
pub const FRAME_FILE_NAME: &str = "webcam-frame.jpg";

/// One still image ready to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedFrame {
    pub file_name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl CapturedFrame {
    /// A JPEG frame named the way live scans name them.
    pub fn jpeg(data: Vec<u8>) -> Self {
        Self {
            file_name: FRAME_FILE_NAME.to_string(),
            mime_type: "image/jpeg".to_string(),
            data,
        }
    }
}

/// Produces the next still frame on demand.
#[async_trait]
pub trait FrameSource: Send + Sync {
    async fn capture(&self) -> anyhow::Result<CapturedFrame>;
}

/// Re-reads a JPEG that another process keeps overwriting.
#[derive(Debug, Clone)]
pub struct FileFrameSource {
    path: PathBuf,
}

impl FileFrameSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl FrameSource for FileFrameSource {
    async fn capture(&self) -> anyhow::Result<CapturedFrame> {
        let data = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("failed to read frame {}", self.path.display()))?;
        if data.is_empty() {
            bail!("frame file {} is empty", self.path.display());
        }
        Ok(CapturedFrame::jpeg(data))
    }
}

/// Grabs one frame from a capture device through ffmpeg.
///
/// `format` is the ffmpeg input format (`v4l2`, `avfoundation`, `dshow`);
/// when unset ffmpeg probes the device itself.
#[derive(Debug, Clone)]
pub struct FfmpegCameraSource {
    ffmpeg_path: String,
    device: String,
    format: Option<String>,
}

impl FfmpegCameraSource {
    pub fn new(ffmpeg_path: impl Into<String>, device: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            device: device.into(),
            format: None,
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.ffmpeg_path);
        cmd.args(["-hide_banner", "-loglevel", "error", "-nostdin"]);
        if let Some(format) = &self.format {
            cmd.args(["-f", format.as_str()]);
        }
        cmd.args(["-i", self.device.as_str()])
            .args(["-frames:v", "1", "-f", "image2pipe", "-vcodec", "mjpeg", "pipe:1"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl FrameSource for FfmpegCameraSource {
    async fn capture(&self) -> anyhow::Result<CapturedFrame> {
        debug!(device = %self.device, "Capturing camera frame");

        let output = self
            .command()
            .output()
            .await
            .with_context(|| format!("failed to run {}", self.ffmpeg_path))?;

        if !output.status.success() {
            bail!(
                "ffmpeg capture failed ({}): {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        if output.stdout.is_empty() {
            bail!("ffmpeg produced no frame for {}", self.device);
        }

        Ok(CapturedFrame::jpeg(output.stdout))
    }
}
