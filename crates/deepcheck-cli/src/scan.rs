use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use deepcheck_client::{
    AnalyzeClient, FfmpegCameraSource, FileFrameSource, FrameSource, LiveScan, LiveScanConfig,
};

use crate::render;

pub enum Source {
    File(PathBuf),
    Device {
        device: String,
        format: Option<String>,
        ffmpeg: String,
    },
}

impl Source {
    fn into_frame_source(self) -> Arc<dyn FrameSource> {
        match self {
            Source::File(path) => Arc::new(FileFrameSource::new(path)),
            Source::Device {
                device,
                format,
                ffmpeg,
            } => {
                let camera = FfmpegCameraSource::new(ffmpeg, device);
                match format {
                    Some(format) => Arc::new(camera.with_format(format)),
                    None => Arc::new(camera),
                }
            }
        }
    }
}

pub struct ScanArgs {
    pub source: Source,
    pub url: String,
    pub interval: Duration,
    pub cancel_in_flight: bool,
}

/// Run a live scan until `shutdown` resolves, printing every result as it is shown.
pub async fn run_scan(args: ScanArgs, shutdown: impl Future<Output = ()>) -> Result<()> {
    let client = Arc::new(AnalyzeClient::new(&args.url)?);
    let config = LiveScanConfig {
        interval: args.interval,
        cancel_in_flight: args.cancel_in_flight,
    };

    info!(url = %client.base_url(), "Live scan running, press Ctrl-C to stop");
    let scan = LiveScan::start(args.source.into_frame_source(), client, config);
    let mut latest = scan.latest();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            changed = latest.changed() => {
                if changed.is_err() {
                    break;
                }
                if let Some(update) = latest.borrow_and_update().as_ref() {
                    println!("{}\n", render::render_update(update));
                }
            }
        }
    }

    let stats = scan.stop().await?;
    println!("{}", render::render_stats(&stats));
    Ok(())
}

/// Resolves on the first Ctrl-C.
pub async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}
