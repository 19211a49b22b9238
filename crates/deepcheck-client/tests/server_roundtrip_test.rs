//! Client against a real server bound to an ephemeral port.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use deepcheck_client::{AnalyzeClient, CapturedFrame, FrameSubmitter};
use deepcheck_gateway::{GatewayState, build_router};
use deepcheck_media::frames::FfmpegFrameExtractor;
use deepcheck_media::mock::MockAnalyzer;
use deepcheck_media::{AnalysisPipeline, Analyzer};

async fn spawn_server() -> (String, TempDir) {
    let uploads = tempfile::tempdir().unwrap();
    let pipeline = AnalysisPipeline::new(
        Arc::new(FfmpegFrameExtractor::new("/nonexistent/ffmpeg-binary")),
        Analyzer::Mock(MockAnalyzer::new(Duration::ZERO)),
    );
    let state = Arc::new(GatewayState::new(pipeline, uploads.path()));
    let app = build_router(state, 1024 * 1024);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), uploads)
}

#[tokio::test]
async fn test_analyze_bytes_roundtrip() {
    let (url, uploads) = spawn_server().await;
    let client = AnalyzeClient::new(&url).unwrap();

    let result = client
        .analyze_bytes("face.jpg", "image/jpeg", b"JPEGDATA".to_vec())
        .await
        .unwrap();

    assert!(result.authenticity_score <= 100);
    assert!(result.explanation.starts_with("[MOCK ANALYSIS]"));
    assert_eq!(std::fs::read_dir(uploads.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_submit_frame_roundtrip() {
    let (url, _uploads) = spawn_server().await;
    let client = AnalyzeClient::new(&url).unwrap();

    let result = client
        .submit(CapturedFrame::jpeg(vec![0xFF, 0xD8, 0xFF]))
        .await
        .unwrap();
    assert!(!result.explanation.is_empty());
}

#[tokio::test]
async fn test_analyze_file_roundtrip() {
    let (url, _uploads) = spawn_server().await;
    let client = AnalyzeClient::new(&url).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("portrait.png");
    std::fs::write(&path, b"PNGDATA").unwrap();

    let result = client.analyze_file(&path).await.unwrap();
    assert!(result.authenticity_score <= 100);
}

#[tokio::test]
async fn test_server_error_text_is_surfaced() {
    let (url, _uploads) = spawn_server().await;
    let client = AnalyzeClient::new(&url).unwrap();

    // Video needs ffmpeg, which this server cannot run.
    let err = client
        .analyze_bytes("clip.mp4", "video/mp4", b"VIDEO".to_vec())
        .await
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("500"), "{message}");
    assert!(message.contains("Analysis failed"), "{message}");
}

#[tokio::test]
async fn test_missing_file_on_disk() {
    let (url, _uploads) = spawn_server().await;
    let client = AnalyzeClient::new(&url).unwrap();

    let err = client
        .analyze_file(Path::new("/nonexistent/photo.jpg"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("failed to read"));
}

#[tokio::test]
async fn test_health_roundtrip() {
    let (url, _uploads) = spawn_server().await;
    let client = AnalyzeClient::new(&url).unwrap();

    let health = client.health().await.unwrap();
    assert_eq!(health.status, "ok");
    assert!(!health.timestamp.is_empty());
}

#[tokio::test]
async fn test_unreachable_server() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = AnalyzeClient::new(&format!("http://{addr}")).unwrap();
    let err = client.health().await.unwrap_err();
    assert!(err.to_string().contains("health request failed"));
}
