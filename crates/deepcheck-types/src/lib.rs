use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ──────────────────── Analysis Types ────────────────────

/// Coarse three-bucket classification derived from the trust score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Wire literal for this level.
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }

    /// Parse one of the three exact wire literals.
    pub fn from_literal(s: &str) -> Option<Self> {
        match s {
            "Low" => Some(RiskLevel::Low),
            "Medium" => Some(RiskLevel::Medium),
            "High" => Some(RiskLevel::High),
            _ => None,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deepfake-likelihood verdict for one uploaded media file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Trust score, 0 (certainly manipulated) to 100 (certainly genuine).
    pub authenticity_score: u8,
    pub risk_level: RiskLevel,
    /// Free-text justification, expected to start with "Based on".
    pub explanation: String,
}

// ──────────────────── Upload Types ────────────────────

/// A media file received over HTTP and parked in transient storage.
///
/// Owned by exactly one request; the file at `path` is removed when that
/// request finishes, whatever the outcome.
#[derive(Debug, Clone)]
pub struct UploadedMedia {
    /// Location of the stored bytes inside the upload directory.
    pub path: PathBuf,
    /// MIME type declared by the client.
    pub mime_type: String,
    /// File name as sent by the client.
    pub original_filename: String,
}

impl UploadedMedia {
    pub fn is_video(&self) -> bool {
        self.mime_type.starts_with("video/")
    }
}

// ──────────────────── HTTP Bodies ────────────────────

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    /// RFC 3339 timestamp of when the check was answered.
    pub timestamp: String,
}

/// Error body returned by the HTTP endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
