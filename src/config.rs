//! Engine tuning parameters
//!
//! The defaults reproduce the reference scoring exactly. Hosts may override
//! them from JSON, but every config is validated before use.

use crate::error::InsightsError;
use serde::{Deserialize, Serialize};

/// Maximum gap between consecutive messages of one burst (20 minutes)
pub const BURST_GAP_MS: i64 = 20 * 60 * 1000;

/// Message count at which the volume term saturates
pub const VOLUME_SATURATION_MESSAGES: f64 = 50.0;

/// Median reply time (minutes) at which responsiveness reaches zero
pub const RESPONSIVENESS_CUTOFF_MINUTES: f64 = 60.0;

pub const VOLUME_WEIGHT: f64 = 0.45;
pub const RECIPROCITY_WEIGHT: f64 = 0.35;
pub const RESPONSIVENESS_WEIGHT: f64 = 0.20;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Tuning constants for burst segmentation and activity scoring
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightsConfig {
    /// Gaps strictly greater than this start a new burst
    pub burst_gap_ms: i64,
    pub volume_saturation_messages: f64,
    pub responsiveness_cutoff_minutes: f64,
    pub volume_weight: f64,
    pub reciprocity_weight: f64,
    pub responsiveness_weight: f64,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            burst_gap_ms: BURST_GAP_MS,
            volume_saturation_messages: VOLUME_SATURATION_MESSAGES,
            responsiveness_cutoff_minutes: RESPONSIVENESS_CUTOFF_MINUTES,
            volume_weight: VOLUME_WEIGHT,
            reciprocity_weight: RECIPROCITY_WEIGHT,
            responsiveness_weight: RESPONSIVENESS_WEIGHT,
        }
    }
}

impl InsightsConfig {
    /// Check that the parameters keep every score inside [0, 1]
    pub fn validate(&self) -> Result<(), InsightsError> {
        if self.burst_gap_ms < 0 {
            return Err(InsightsError::InvalidConfig(format!(
                "burst_gap_ms must be non-negative, got {}",
                self.burst_gap_ms
            )));
        }

        // ln(saturation) is the volume divisor
        if !self.volume_saturation_messages.is_finite() || self.volume_saturation_messages <= 1.0 {
            return Err(InsightsError::InvalidConfig(format!(
                "volume_saturation_messages must be a finite number above 1, got {}",
                self.volume_saturation_messages
            )));
        }

        if !self.responsiveness_cutoff_minutes.is_finite()
            || self.responsiveness_cutoff_minutes <= 0.0
        {
            return Err(InsightsError::InvalidConfig(format!(
                "responsiveness_cutoff_minutes must be positive, got {}",
                self.responsiveness_cutoff_minutes
            )));
        }

        let weights = [
            ("volume_weight", self.volume_weight),
            ("reciprocity_weight", self.reciprocity_weight),
            ("responsiveness_weight", self.responsiveness_weight),
        ];
        for (name, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(InsightsError::InvalidConfig(format!(
                    "{} must be a non-negative number, got {}",
                    name, weight
                )));
            }
        }

        let sum: f64 = weights.iter().map(|(_, w)| w).sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(InsightsError::InvalidConfig(format!(
                "score weights must sum to 1.0, got {}",
                sum
            )));
        }

        Ok(())
    }

    /// Parse and validate a config from JSON. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, InsightsError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the config to pretty JSON
    pub fn to_json(&self) -> Result<String, InsightsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
