//! Analysis pipeline: optional frame extraction, then mock or model analysis.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use deepcheck_config::DeepCheckConfig;
use deepcheck_types::{AnalysisResult, UploadedMedia};

use crate::error::AnalysisError;
use crate::frames::FfmpegFrameExtractor;
use crate::gemini::GeminiGateway;
use crate::mock::MockAnalyzer;
use crate::parser::parse_analysis;
use crate::prompt::analysis_prompt;
use crate::types::{FrameExtractor, ModelGateway, ModelRequest, PreparedMedia, frame_path_for};

/// Which backend produces the verdict.
pub enum Analyzer {
    /// Randomized results, no external call.
    Mock(MockAnalyzer),
    /// Prompt → external model → strict parse.
    Model(Arc<dyn ModelGateway>),
}

impl Analyzer {
    pub fn name(&self) -> &str {
        match self {
            Analyzer::Mock(_) => "mock",
            Analyzer::Model(gateway) => gateway.id(),
        }
    }

    /// Produce a verdict for prepared media.
    pub async fn analyze(&self, media: PreparedMedia) -> Result<AnalysisResult, AnalysisError> {
        match self {
            Analyzer::Mock(mock) => Ok(mock.analyze().await),
            Analyzer::Model(gateway) => {
                let text = gateway
                    .generate(ModelRequest {
                        prompt: analysis_prompt().to_string(),
                        mime_type: media.mime_type,
                        data: media.data,
                    })
                    .await
                    .map_err(AnalysisError::Gateway)?;
                debug!(gateway = gateway.id(), chars = text.len(), "Model response received");
                Ok(parse_analysis(&text)?)
            }
        }
    }
}

/// Runs one upload through frame extraction (videos only) and analysis.
///
/// The pipeline never deletes the upload itself; that belongs to the caller
/// owning the request. Derived frame files are removed here, right after
/// they have been read.
pub struct AnalysisPipeline {
    frames: Arc<dyn FrameExtractor>,
    analyzer: Analyzer,
}

impl AnalysisPipeline {
    pub fn new(frames: Arc<dyn FrameExtractor>, analyzer: Analyzer) -> Self {
        Self { frames, analyzer }
    }

    /// Build the production pipeline from config: ffmpeg frames plus either
    /// the mock analyzer or the Gemini gateway.
    pub fn from_config(config: &DeepCheckConfig) -> anyhow::Result<Self> {
        let frames = Arc::new(FfmpegFrameExtractor::new(config.media.ffmpeg_path.clone()));
        let analyzer = if config.analysis.use_mock {
            Analyzer::Mock(MockAnalyzer::new(config.analysis.mock_latency()))
        } else {
            Analyzer::Model(Arc::new(GeminiGateway::from_config(&config.analysis)?))
        };
        Ok(Self::new(frames, analyzer))
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    pub async fn run(&self, media: &UploadedMedia) -> Result<AnalysisResult, AnalysisError> {
        let started = Instant::now();
        let prepared = self.prepare(media).await?;

        info!(
            analyzer = self.analyzer.name(),
            mime_type = %prepared.mime_type,
            bytes = prepared.data.len(),
            "Analyzing media"
        );
        let result = self.analyzer.analyze(prepared).await?;

        info!(
            score = result.authenticity_score,
            risk_level = %result.risk_level,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Analysis complete"
        );
        Ok(result)
    }

    /// Load the bytes to analyze; videos are replaced by one JPEG frame.
    async fn prepare(&self, media: &UploadedMedia) -> Result<PreparedMedia, AnalysisError> {
        if !media.is_video() {
            let data = tokio::fs::read(&media.path).await?;
            return Ok(PreparedMedia {
                mime_type: media.mime_type.clone(),
                data,
            });
        }

        let frame_path = frame_path_for(&media.path);
        info!(filename = %media.original_filename, "Extracting frame from video");

        if let Err(e) = self.frames.extract_frame(&media.path, &frame_path).await {
            remove_frame(&frame_path).await;
            return Err(e.into());
        }

        let read = tokio::fs::read(&frame_path).await;
        remove_frame(&frame_path).await;

        Ok(PreparedMedia {
            mime_type: "image/jpeg".to_string(),
            data: read?,
        })
    }
}

async fn remove_frame(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "Removed frame"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), "Failed to remove frame: {e}"),
    }
}
