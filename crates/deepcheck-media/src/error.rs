use std::path::PathBuf;

use thiserror::Error;

/// Frame extraction failure.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("ffmpeg exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("ffmpeg produced no frame at {0}")]
    MissingOutput(PathBuf),
}

/// The model's text did not contain a usable analysis object.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no JSON object found in model response")]
    NoObject,
    #[error("malformed JSON object: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("authenticity_score is not an integer: {0}")]
    ScoreNotInteger(serde_json::Value),
    #[error("authenticity_score {0} is outside 0..=100")]
    ScoreOutOfRange(i64),
    #[error("unknown risk_level {0:?}")]
    UnknownRiskLevel(String),
    #[error("explanation is empty")]
    EmptyExplanation,
}

/// Failure of one analysis run, tagged with the stage that failed.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("frame extraction failed: {0}")]
    Transcode(#[from] FrameError),
    #[error("model call failed: {0:#}")]
    Gateway(anyhow::Error),
    #[error("model response rejected: {0}")]
    Parse(#[from] ParseError),
    #[error("media read failed: {0}")]
    Io(#[from] std::io::Error),
}

impl AnalysisError {
    /// Pipeline stage name, used as a log field.
    pub fn stage(&self) -> &'static str {
        match self {
            AnalysisError::Transcode(_) => "extracting",
            AnalysisError::Gateway(_) => "analyzing",
            AnalysisError::Parse(_) => "parsing",
            AnalysisError::Io(_) => "reading",
        }
    }
}
