//! deepcheck-client: talks to a running deepcheck server.
//!
//! - [`AnalyzeClient`]: one-shot uploads and health checks over HTTP
//! - [`FrameSource`]: where live-scan frames come from (a refreshed file or a camera via ffmpeg)
//! - [`LiveScan`]: timer-driven capture-and-submit loop with stale-result discard

pub mod client;
pub mod poller;
pub mod source;

pub use client::AnalyzeClient;
pub use poller::{FrameSubmitter, LiveScan, LiveScanConfig, ScanStats, ScanUpdate};
pub use source::{CapturedFrame, FfmpegCameraSource, FileFrameSource, FrameSource};
