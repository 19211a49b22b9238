//! Still-frame extraction from video uploads via ffmpeg.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::FrameError;
use crate::types::FrameExtractor;

/// Runs the `ffmpeg` binary to grab one representative frame.
///
/// Frame selection is left to ffmpeg's `thumbnail` filter.
#[derive(Debug, Clone)]
pub struct FfmpegFrameExtractor {
    ffmpeg_path: String,
}

impl FfmpegFrameExtractor {
    pub fn new(ffmpeg_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }

    fn command(&self, video: &Path, output: &Path) -> Command {
        let mut cmd = Command::new(&self.ffmpeg_path);
        cmd.args(["-hide_banner", "-loglevel", "error", "-nostdin", "-y"])
            .arg("-i")
            .arg(video)
            .args(["-vf", "thumbnail", "-frames:v", "1", "-q:v", "2"])
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl FrameExtractor for FfmpegFrameExtractor {
    async fn extract_frame(&self, video: &Path, output: &Path) -> Result<(), FrameError> {
        debug!(video = %video.display(), output = %output.display(), "Extracting frame");

        let result = self
            .command(video, output)
            .output()
            .await
            .map_err(|source| FrameError::Spawn {
                program: self.ffmpeg_path.clone(),
                source,
            })?;

        if !result.status.success() {
            return Err(FrameError::Failed {
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        if !tokio::fs::try_exists(output).await.unwrap_or(false) {
            return Err(FrameError::MissingOutput(output.to_path_buf()));
        }

        Ok(())
    }
}
