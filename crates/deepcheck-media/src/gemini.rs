//! Google Gemini multimodal gateway.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;

use deepcheck_config::AnalysisConfig;

use crate::types::{ModelGateway, ModelRequest};

/// Gemini `generateContent` client.
pub struct GeminiGateway {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiGateway {
    pub fn new(
        api_key: String,
        model: String,
        base_url: String,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client for Gemini")?;
        Ok(Self {
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Build a gateway from the analysis section of the config.
    pub fn from_config(config: &AnalysisConfig) -> anyhow::Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .context("Gemini API key not configured")?;
        Self::new(
            api_key,
            config.model.clone(),
            config.api_base_url.clone(),
            config.request_timeout(),
        )
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

/// Request body: the prompt followed by the media as inline base64 data.
fn build_body(req: &ModelRequest) -> Value {
    let data = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, &req.data);
    serde_json::json!({
        "contents": [{
            "parts": [
                { "text": req.prompt },
                {
                    "inline_data": {
                        "mime_type": req.mime_type,
                        "data": data
                    }
                }
            ]
        }]
    })
}

/// Concatenate the text parts of the first candidate.
fn extract_text(json: &Value) -> Option<String> {
    let parts = json.pointer("/candidates/0/content/parts")?.as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect();
    if text.is_empty() { None } else { Some(text) }
}

/// Upstream error text: `error.message` from a JSON error body, otherwise
/// the start of the raw body (proxies answer 502/503 with HTML).
fn error_message(body: &str) -> String {
    const MAX_RAW_CHARS: usize = 200;

    if let Some(msg) = serde_json::from_str::<Value>(body)
        .ok()
        .as_ref()
        .and_then(|json| json.pointer("/error/message"))
        .and_then(|m| m.as_str())
    {
        return msg.to_string();
    }
    let raw = body.trim();
    if raw.is_empty() {
        "Unknown error".to_string()
    } else {
        raw.chars().take(MAX_RAW_CHARS).collect()
    }
}

#[async_trait]
impl ModelGateway for GeminiGateway {
    fn id(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, req: ModelRequest) -> anyhow::Result<String> {
        let body = build_body(&req);

        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("Gemini request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Gemini API error ({status}): {}", error_message(&body));
        }

        let json: Value = resp
            .json()
            .await
            .context("Gemini response parse failed")?;

        extract_text(&json).with_context(|| {
            let reason = json
                .pointer("/candidates/0/finishReason")
                .or_else(|| json.pointer("/promptFeedback/blockReason"))
                .and_then(|r| r.as_str())
                .unwrap_or("no candidates");
            format!("Gemini returned no text ({reason})")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        let gw = GeminiGateway::new(
            "key".into(),
            "gemini-1.5-pro".into(),
            "https://generativelanguage.googleapis.com/v1beta/".into(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            gw.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-pro:generateContent"
        );
    }

    #[test]
    fn test_from_config_requires_key() {
        let config = AnalysisConfig::default();
        assert!(GeminiGateway::from_config(&config).is_err());
    }

    #[test]
    fn test_build_body_inlines_base64() {
        let body = build_body(&ModelRequest {
            prompt: "Analyze".into(),
            mime_type: "image/jpeg".into(),
            data: b"hello".to_vec(),
        });
        assert_eq!(body.pointer("/contents/0/parts/0/text").unwrap(), "Analyze");
        assert_eq!(
            body.pointer("/contents/0/parts/1/inline_data/mime_type").unwrap(),
            "image/jpeg"
        );
        assert_eq!(
            body.pointer("/contents/0/parts/1/inline_data/data").unwrap(),
            "aGVsbG8="
        );
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let json = serde_json::json!({
            "candidates": [{
                "content": { "parts": [ { "text": "Based on " }, { "text": "{}" } ] }
            }]
        });
        assert_eq!(extract_text(&json).as_deref(), Some("Based on {}"));
    }

    #[test]
    fn test_error_message_from_json_body() {
        let body = r#"{"error":{"code":429,"message":"Resource has been exhausted","status":"RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(error_message(body), "Resource has been exhausted");
    }

    #[test]
    fn test_error_message_from_html_body() {
        let body = "<html><body><h1>502 Bad Gateway</h1></body></html>\n";
        assert_eq!(
            error_message(body),
            "<html><body><h1>502 Bad Gateway</h1></body></html>"
        );

        let long = "x".repeat(5000);
        assert_eq!(error_message(&long).len(), 200);
    }

    #[test]
    fn test_error_message_empty_body() {
        assert_eq!(error_message(""), "Unknown error");
        assert_eq!(error_message(r#"{"error":{}}"#), r#"{"error":{}}"#);
    }

    #[tokio::test]
    async fn test_generate_reports_status_for_html_error() {
        let app = axum::Router::new().fallback(|| async {
            (
                axum::http::StatusCode::BAD_GATEWAY,
                "<html><h1>502 Bad Gateway</h1></html>",
            )
        });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let gw = GeminiGateway::new(
            "key".into(),
            "gemini-1.5-pro".into(),
            format!("http://{addr}"),
            Duration::from_secs(5),
        )
        .unwrap();
        let err = gw
            .generate(ModelRequest {
                prompt: "Analyze".into(),
                mime_type: "image/jpeg".into(),
                data: vec![1, 2, 3],
            })
            .await
            .unwrap_err();

        let message = format!("{err:#}");
        assert!(message.contains("502"), "{message}");
        assert!(message.contains("502 Bad Gateway"), "{message}");
        assert!(!message.contains("parse failed"), "{message}");
    }

    #[test]
    fn test_extract_text_missing() {
        let json = serde_json::json!({ "candidates": [] });
        assert_eq!(extract_text(&json), None);
    }
}
