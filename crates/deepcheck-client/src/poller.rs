//! Live scan: capture and submit a frame on every tick.
//!
//! Ticks never wait for one another. Each tick's capture-and-submit runs as
//! its own task in an in-flight set and carries a sequence number; a result
//! is only shown if no newer tick's result has been shown already.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use deepcheck_types::AnalysisResult;

use crate::client::AnalyzeClient;
use crate::source::{CapturedFrame, FrameSource};

pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(3);

/// Sends one captured frame for analysis.
#[async_trait]
pub trait FrameSubmitter: Send + Sync {
    async fn submit(&self, frame: CapturedFrame) -> anyhow::Result<AnalysisResult>;
}

#[async_trait]
impl FrameSubmitter for AnalyzeClient {
    async fn submit(&self, frame: CapturedFrame) -> anyhow::Result<AnalysisResult> {
        self.analyze_bytes(&frame.file_name, &frame.mime_type, frame.data)
            .await
    }
}

#[derive(Debug, Clone)]
pub struct LiveScanConfig {
    /// Time between ticks. The first tick fires one interval after start.
    pub interval: Duration,
    /// Abort outstanding requests on stop instead of letting them finish.
    pub cancel_in_flight: bool,
}

impl Default for LiveScanConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_SCAN_INTERVAL,
            cancel_in_flight: false,
        }
    }
}

/// The result currently on display and the tick that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanUpdate {
    pub seq: u64,
    pub result: AnalysisResult,
}

/// Counters reported when a scan stops.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanStats {
    pub ticks: u64,
    pub applied: u64,
    /// Completed after a newer tick's result was already shown.
    pub stale: u64,
    pub failed: u64,
    /// Aborted by `stop()` with `cancel_in_flight` set.
    pub cancelled: u64,
}

/// Handle to a running live scan.
pub struct LiveScan {
    cancel: CancellationToken,
    latest: watch::Receiver<Option<ScanUpdate>>,
    task: JoinHandle<ScanStats>,
}

impl LiveScan {
    /// Spawn the scan loop on the current runtime.
    pub fn start(
        source: Arc<dyn FrameSource>,
        submitter: Arc<dyn FrameSubmitter>,
        config: LiveScanConfig,
    ) -> Self {
        let cancel = CancellationToken::new();
        let (tx, rx) = watch::channel(None);
        let task = tokio::spawn(run_scan(source, submitter, config, tx, cancel.clone()));
        Self {
            cancel,
            latest: rx,
            task,
        }
    }

    /// Receiver for the most recently applied result.
    pub fn latest(&self) -> watch::Receiver<Option<ScanUpdate>> {
        self.latest.clone()
    }

    /// Stop ticking, settle outstanding requests, and report counters.
    pub async fn stop(self) -> anyhow::Result<ScanStats> {
        self.cancel.cancel();
        self.task.await.context("live scan task failed")
    }
}

type TickOutcome = (u64, anyhow::Result<AnalysisResult>);

/// Applies completions in arrival order, dropping ones older than what is shown.
struct Settler {
    newest_applied: Option<u64>,
    updates: watch::Sender<Option<ScanUpdate>>,
    stats: ScanStats,
}

impl Settler {
    fn settle(&mut self, joined: Result<TickOutcome, JoinError>) {
        match joined {
            Ok((seq, Ok(result))) => {
                if self.newest_applied.is_some_and(|newest| seq <= newest) {
                    debug!(seq, "Discarding stale result");
                    self.stats.stale += 1;
                    return;
                }
                info!(
                    seq,
                    score = result.authenticity_score,
                    risk_level = %result.risk_level,
                    "Scan result"
                );
                self.newest_applied = Some(seq);
                self.stats.applied += 1;
                self.updates.send_replace(Some(ScanUpdate { seq, result }));
            }
            Ok((seq, Err(e))) => {
                warn!(seq, "Scan tick failed: {e:#}");
                self.stats.failed += 1;
            }
            Err(e) if e.is_cancelled() => self.stats.cancelled += 1,
            Err(e) => {
                warn!("Scan tick panicked: {e}");
                self.stats.failed += 1;
            }
        }
    }
}

async fn capture_and_submit(
    source: &dyn FrameSource,
    submitter: &dyn FrameSubmitter,
) -> anyhow::Result<AnalysisResult> {
    let frame = source.capture().await.context("frame capture failed")?;
    submitter.submit(frame).await
}

async fn run_scan(
    source: Arc<dyn FrameSource>,
    submitter: Arc<dyn FrameSubmitter>,
    config: LiveScanConfig,
    updates: watch::Sender<Option<ScanUpdate>>,
    cancel: CancellationToken,
) -> ScanStats {
    let mut ticker = tokio::time::interval_at(Instant::now() + config.interval, config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut in_flight: JoinSet<TickOutcome> = JoinSet::new();
    let mut next_seq = 0u64;
    let mut settler = Settler {
        newest_applied: None,
        updates,
        stats: ScanStats::default(),
    };

    info!(interval_ms = config.interval.as_millis() as u64, "Live scan started");

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            Some(joined) = in_flight.join_next() => settler.settle(joined),
            _ = ticker.tick() => {
                let seq = next_seq;
                next_seq += 1;
                settler.stats.ticks += 1;

                let source = source.clone();
                let submitter = submitter.clone();
                in_flight.spawn(async move {
                    (seq, capture_and_submit(source.as_ref(), submitter.as_ref()).await)
                });
                debug!(seq, in_flight = in_flight.len(), "Tick dispatched");
            }
        }
    }

    if config.cancel_in_flight {
        debug!(in_flight = in_flight.len(), "Aborting outstanding requests");
        in_flight.abort_all();
    } else if !in_flight.is_empty() {
        debug!(in_flight = in_flight.len(), "Waiting for outstanding requests");
    }
    while let Some(joined) = in_flight.join_next().await {
        settler.settle(joined);
    }

    let stats = settler.stats;
    info!(
        ticks = stats.ticks,
        applied = stats.applied,
        stale = stats.stale,
        failed = stats.failed,
        cancelled = stats.cancelled,
        "Live scan stopped"
    );
    stats
}
