//! Activity scoring
//!
//! Blends message volume, reciprocity and responsiveness into a single 0-1
//! activity score.

use crate::config::InsightsConfig;
use crate::error::InsightsError;

/// Milliseconds per minute
const MS_PER_MINUTE: f64 = 60_000.0;

/// Scorer for conversation activity
pub struct ActivityScorer {
    config: InsightsConfig,
}

impl Default for ActivityScorer {
    fn default() -> Self {
        Self::from_validated(InsightsConfig::default())
    }
}

impl ActivityScorer {
    /// Create a scorer; rejects configs whose scores could leave [0, 1]
    pub fn new(config: InsightsConfig) -> Result<Self, InsightsError> {
        config.validate()?;
        Ok(Self::from_validated(config))
    }

    /// Caller guarantees `config.validate()` passed
    pub(crate) fn from_validated(config: InsightsConfig) -> Self {
        Self { config }
    }

    /// Compute the composite activity score
    ///
    /// Formula:
    /// ```text
    /// Activity Score = 0.45 * volume
    ///                + 0.35 * reciprocity
    ///                + 0.20 * responsiveness
    /// ```
    pub fn score(
        &self,
        total_messages: u64,
        reciprocity: f64,
        median_reply_time_ms: Option<i64>,
    ) -> f64 {
        let volume = compute_volume(total_messages, self.config.volume_saturation_messages);
        let responsiveness = compute_responsiveness(
            median_reply_time_ms,
            self.config.responsiveness_cutoff_minutes,
        );

        let score = self.config.volume_weight * volume
            + self.config.reciprocity_weight * reciprocity.clamp(0.0, 1.0)
            + self.config.responsiveness_weight * responsiveness;
        score.clamp(0.0, 1.0)
    }
}

/// Compute message volume using a logarithmic saturation curve
///
/// Formula: `ln(total + 1) / ln(saturation)`
/// With the default saturation of 50 this reaches 1.0 at 49 messages
fn compute_volume(total_messages: u64, saturation_messages: f64) -> f64 {
    ((total_messages as f64 + 1.0).ln() / saturation_messages.ln()).clamp(0.0, 1.0)
}

/// Compute responsiveness from the median reply time
///
/// Formula: `clamp(cutoff - minutes, 0, cutoff) / cutoff`
/// Linear decay from 1.0 for instant replies to 0.0 at the cutoff (60 minutes
/// by default). No replies means no responsiveness.
fn compute_responsiveness(median_reply_time_ms: Option<i64>, cutoff_minutes: f64) -> f64 {
    match median_reply_time_ms {
        None => 0.0,
        Some(median_ms) => {
            let minutes = median_ms as f64 / MS_PER_MINUTE;
            (cutoff_minutes - minutes).clamp(0.0, cutoff_minutes) / cutoff_minutes
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume() {
        // Empty conversation has no volume
        assert_eq!(compute_volume(0, 50.0), 0.0);

        // 3 messages = ln(4) / ln(50)
        assert!((compute_volume(3, 50.0) - 0.354).abs() < 0.001);

        // Saturates at 49 messages and stays there
        assert!((compute_volume(49, 50.0) - 1.0).abs() < 1e-12);
        assert_eq!(compute_volume(10_000, 50.0), 1.0);
    }

    #[test]
    fn test_responsiveness() {
        assert_eq!(compute_responsiveness(None, 60.0), 0.0);
        assert_eq!(compute_responsiveness(Some(0), 60.0), 1.0);

        // 30 minutes is halfway to the cutoff
        assert!((compute_responsiveness(Some(30 * 60_000), 60.0) - 0.5).abs() < 1e-12);

        // 62.5 seconds
        assert!((compute_responsiveness(Some(62_500), 60.0) - 0.983).abs() < 0.001);

        // Slower than the cutoff bottoms out at zero
        assert_eq!(compute_responsiveness(Some(60 * 60_000), 60.0), 0.0);
        assert_eq!(compute_responsiveness(Some(5 * 60 * 60_000), 60.0), 0.0);
    }

    #[test]
    fn test_score_weights() {
        let scorer = ActivityScorer::default();

        // Empty conversation scores zero
        assert_eq!(scorer.score(0, 0.0, None), 0.0);

        // Reciprocity only
        assert!((scorer.score(0, 1.0, None) - 0.35).abs() < 0.001);

        // Everything maxed out
        let max = scorer.score(1_000, 1.0, Some(0));
        assert!((max - 1.0).abs() < 0.001);
        assert!(max <= 1.0);
    }

    #[test]
    fn test_reference_conversation_score() {
        let scorer = ActivityScorer::default();
        let score = scorer.score(3, 0.5, Some(62_500));
        assert!((score - 0.531).abs() < 0.001);
    }

    #[test]
    fn test_custom_weights() {
        let scorer = ActivityScorer::new(InsightsConfig {
            volume_weight: 0.0,
            reciprocity_weight: 1.0,
            responsiveness_weight: 0.0,
            ..InsightsConfig::default()
        })
        .unwrap();
        assert!((scorer.score(40, 0.25, Some(1_000)) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_degenerate_saturation() {
        // ln(1) = 0 would make the volume term 0/0
        let result = ActivityScorer::new(InsightsConfig {
            volume_saturation_messages: 1.0,
            ..InsightsConfig::default()
        });
        assert!(matches!(result, Err(InsightsError::InvalidConfig(_))));
    }
}
