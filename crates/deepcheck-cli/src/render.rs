//! Terminal rendering of server responses.

use deepcheck_client::{ScanStats, ScanUpdate};
use deepcheck_types::{AnalysisResult, HealthStatus};

pub fn render_result(result: &AnalysisResult) -> String {
    format!(
        "Trust score: {}% [{}]\n{}",
        result.authenticity_score, result.risk_level, result.explanation
    )
}

/// One live-scan line block, tagged with the tick it came from.
pub fn render_update(update: &ScanUpdate) -> String {
    format!("#{} {}", update.seq, render_result(&update.result))
}

pub fn render_health(url: &str, health: &HealthStatus) -> String {
    format!("{url} is {} (server time {})", health.status, health.timestamp)
}

pub fn render_stats(stats: &ScanStats) -> String {
    format!(
        "Scan stopped: {} ticks, {} shown, {} stale, {} failed, {} cancelled",
        stats.ticks, stats.applied, stats.stale, stats.failed, stats.cancelled
    )
}
