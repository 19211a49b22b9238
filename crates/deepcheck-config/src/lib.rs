use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON5 parse error: {0}")]
    Json5(#[from] json5::Error),
    #[error("Config directory not found")]
    NoDirFound,
    #[error("Invalid value for {key}: {value:?}")]
    InvalidEnv { key: &'static str, value: String },
    #[error("GEMINI_API_KEY is required unless USE_MOCK_DATA=true")]
    MissingApiKey,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Directory holding transient uploads.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    /// Request body limit enforced by the transport layer.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_port() -> u16 {
    3000
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_max_upload_bytes() -> usize {
    200 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            upload_dir: default_upload_dir(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// Analysis backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Skip the external model and emit randomized results.
    #[serde(default)]
    pub use_mock: bool,
    /// Gemini API key. Required unless `use_mock` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Gemini model ID.
    #[serde(default = "default_model")]
    pub model: String,
    /// Base URL of the Generative Language API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Simulated latency of the mock analyzer.
    #[serde(default = "default_mock_latency_ms")]
    pub mock_latency_ms: u64,
}

fn default_model() -> String {
    "gemini-1.5-pro".to_string()
}

fn default_api_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_mock_latency_ms() -> u64 {
    2000
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            use_mock: false,
            api_key: None,
            model: default_model(),
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            mock_latency_ms: default_mock_latency_ms(),
        }
    }
}

impl AnalysisConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn mock_latency(&self) -> Duration {
        Duration::from_millis(self.mock_latency_ms)
    }
}

/// External media tooling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
        }
    }
}

/// Top-level deepcheck configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeepCheckConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub media: MediaConfig,
}

impl DeepCheckConfig {
    /// Reject combinations that cannot serve a single request.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let has_key = self
            .analysis
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty());
        if !self.analysis.use_mock && !has_key {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(())
    }
}

/// Resolve the deepcheck config directory (~/.deepcheck/).
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|h| h.join(".deepcheck"))
        .ok_or(ConfigError::NoDirFound)
}

/// Resolve the config file path: `DEEPCHECK_CONFIG`, else ~/.deepcheck/config.json5.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    if let Ok(path) = std::env::var("DEEPCHECK_CONFIG") {
        return Ok(PathBuf::from(path));
    }
    Ok(config_dir()?.join("config.json5"))
}

/// Load configuration from file and process environment, then validate it.
///
/// This is the only place the process environment is read; everything
/// downstream receives the resulting value.
pub fn load_config() -> Result<DeepCheckConfig, ConfigError> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let path = config_file_path()?;
    let mut config = load_config_from(&path)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from a specific path, falling back to defaults if not found.
pub fn load_config_from(path: &Path) -> Result<DeepCheckConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!("Config file not found at {}, using defaults", path.display());
        return Ok(DeepCheckConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: DeepCheckConfig = json5::from_str(&content)?;
    Ok(config)
}

/// Overlay environment variables onto `config`.
///
/// `lookup` abstracts the environment so callers and tests can supply their own source.
pub fn apply_env_overrides<F>(config: &mut DeepCheckConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("PORT") {
        config.server.port = parse_env("PORT", v)?;
    }
    if let Some(v) = lookup("HOST") {
        config.server.host = v;
    }
    if let Some(v) = lookup("DEEPCHECK_UPLOAD_DIR") {
        config.server.upload_dir = PathBuf::from(v);
    }
    if let Some(v) = lookup("MAX_UPLOAD_BYTES") {
        config.server.max_upload_bytes = parse_env("MAX_UPLOAD_BYTES", v)?;
    }
    if let Some(v) = lookup("GEMINI_API_KEY") {
        config.analysis.api_key = Some(v).filter(|k| !k.is_empty());
    }
    if let Some(v) = lookup("GEMINI_MODEL") {
        config.analysis.model = v;
    }
    if let Some(v) = lookup("USE_MOCK_DATA") {
        config.analysis.use_mock = parse_bool("USE_MOCK_DATA", v)?;
    }
    if let Some(v) = lookup("MOCK_LATENCY_MS") {
        config.analysis.mock_latency_ms = parse_env("MOCK_LATENCY_MS", v)?;
    }
    if let Some(v) = lookup("FFMPEG_PATH") {
        config.media.ffmpeg_path = v;
    }
    Ok(())
}

fn parse_env<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { key, value })
}

fn parse_bool(key: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        _ => Err(ConfigError::InvalidEnv { key, value }),
    }
}
