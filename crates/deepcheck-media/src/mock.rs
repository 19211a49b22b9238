//! Randomized stand-in for the model gateway.

use std::time::Duration;

use rand::Rng;
use tracing::debug;

use deepcheck_types::{AnalysisResult, RiskLevel};

const GENUINE_NARRATIVE: &str = "no significant anomalies were detected. The lighting shadows align with the light sources in the scene.";
const MANIPULATED_NARRATIVE: &str = "several inconsistencies were found. The blinking patterns are irregular and there are digital artifacts around the mouth region.";

/// Emits plausible-looking results after a simulated delay, without any
/// external call.
#[derive(Debug, Clone)]
pub struct MockAnalyzer {
    latency: Duration,
}

impl MockAnalyzer {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    /// Wait for the simulated latency, then draw a result.
    pub async fn analyze(&self) -> AnalysisResult {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let result = sample(&mut rand::rng());
        debug!(score = result.authenticity_score, "Mock analysis produced");
        result
    }
}

/// Draw one result: a fair coin picks a score from `[0, 39]` or `[60, 99]`.
pub fn sample<R: Rng>(rng: &mut R) -> AnalysisResult {
    let manipulated = rng.random_bool(0.5);
    let score: u8 = if manipulated {
        rng.random_range(0..40)
    } else {
        rng.random_range(60..100)
    };

    AnalysisResult {
        authenticity_score: score,
        risk_level: risk_level_for(score),
        explanation: explanation_for(score),
    }
}

/// Risk bucket: above 80 is Low, above 50 is Medium, the rest High.
pub fn risk_level_for(score: u8) -> RiskLevel {
    if score > 80 {
        RiskLevel::Low
    } else if score > 50 {
        RiskLevel::Medium
    } else {
        RiskLevel::High
    }
}

// Narrative splits at 50, not at the 80/50 risk thresholds.
fn explanation_for(score: u8) -> String {
    let narrative = if score > 50 {
        GENUINE_NARRATIVE
    } else {
        MANIPULATED_NARRATIVE
    };
    format!(
        "[MOCK ANALYSIS] Based on the analysis of facial landmarks and lighting consistency, {narrative}"
    )
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn test_scores_cover_both_bands_and_skip_middle() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut low = 0;
        let mut high = 0;
        for _ in 0..1000 {
            let result = sample(&mut rng);
            let score = result.authenticity_score;
            assert!(
                !(40..60).contains(&score),
                "score {score} fell in the excluded band"
            );
            assert!(score < 100);
            if score < 40 {
                low += 1;
            } else {
                high += 1;
            }
        }
        assert!(low > 0, "no manipulated-band scores drawn");
        assert!(high > 0, "no genuine-band scores drawn");
    }

    #[test]
    fn test_risk_thresholds() {
        assert_eq!(risk_level_for(99), RiskLevel::Low);
        assert_eq!(risk_level_for(81), RiskLevel::Low);
        assert_eq!(risk_level_for(80), RiskLevel::Medium);
        assert_eq!(risk_level_for(60), RiskLevel::Medium);
        assert_eq!(risk_level_for(51), RiskLevel::Medium);
        assert_eq!(risk_level_for(50), RiskLevel::High);
        assert_eq!(risk_level_for(0), RiskLevel::High);
    }

    #[test]
    fn test_narrative_follows_fifty_split() {
        let genuine = explanation_for(65);
        assert!(genuine.starts_with("[MOCK ANALYSIS] Based on"));
        assert!(genuine.contains("no significant anomalies"));

        let manipulated = explanation_for(12);
        assert!(manipulated.contains("several inconsistencies"));
    }

    #[test]
    fn test_sample_is_consistent() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let result = sample(&mut rng);
            assert_eq!(result.risk_level, risk_level_for(result.authenticity_score));
            assert!(!result.explanation.is_empty());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_analyze_waits_for_latency() {
        let mock = MockAnalyzer::new(Duration::from_secs(2));
        let start = tokio::time::Instant::now();
        let result = mock.analyze().await;
        assert!(start.elapsed() >= Duration::from_secs(2));
        assert!(result.authenticity_score < 100);
    }
}
