//! Maps raw, heterogeneous candidate signals onto bounded [0, 1] scores.
//!
//! Every mapping here depends only on its own input and the configuration,
//! never on the rest of the batch, so scores stay comparable across runs.

use serde::{Deserialize, Serialize};

use crate::error::MatchError;
use crate::{clamp01, log10_safe, Caution};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowerScaleConfig {
    /// Follower count at which the compressed score reaches 1.0.
    pub saturation: f64,
}

impl Default for FollowerScaleConfig {
    fn default() -> Self {
        Self {
            saturation: 10_000_000.0,
        }
    }
}

impl FollowerScaleConfig {
    pub fn validate(&self) -> Result<(), MatchError> {
        if !self.saturation.is_finite() || self.saturation < 1.0 {
            return Err(MatchError::InvalidConfig(format!(
                "follower saturation must be >= 1, got {}",
                self.saturation
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Normalizer {
    config: FollowerScaleConfig,
}

impl Normalizer {
    pub fn new(config: FollowerScaleConfig) -> Self {
        Self { config }
    }

    /// `log10(1 + followers) / log10(1 + saturation)`, clamped.
    ///
    /// Going from 1k to 10k followers moves the score as much as going from
    /// 1M to 10M does.
    pub fn follower_score(&self, followers: u64) -> f64 {
        if followers == 0 {
            return 0.0;
        }
        let denominator = log10_safe(self.config.saturation + 1.0);
        if denominator <= 0.0 {
            return 0.0;
        }
        clamp01(log10_safe(followers as f64 + 1.0) / denominator)
    }

    /// Absent or non-finite verdicts degrade to zero with a caution;
    /// out-of-range ones are clamped with a caution.
    pub fn ai_relevance(&self, raw: Option<f64>) -> (f64, Option<Caution>) {
        match raw {
            None => (0.0, Some(Caution::MissingAiRelevance)),
            Some(value) if !value.is_finite() => (0.0, Some(Caution::MissingAiRelevance)),
            Some(value) if !(0.0..=1.0).contains(&value) => {
                (clamp01(value), Some(Caution::AiRelevanceOutOfRange))
            }
            Some(value) => (value, None),
        }
    }
}
