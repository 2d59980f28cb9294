use serde::{Deserialize, Serialize};

use crate::clamp01;
use crate::error::MatchError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementConfig {
    /// Share of the blend given to engagement rate; reach gets the rest.
    pub rate_weight: f64,
    /// Engagement rate treated as the best achievable (score 1.0).
    pub rate_ceiling: f64,
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            rate_weight: 0.7,
            rate_ceiling: 0.10,
        }
    }
}

impl EngagementConfig {
    pub fn validate(&self) -> Result<(), MatchError> {
        if !(0.0..=1.0).contains(&self.rate_weight) {
            return Err(MatchError::InvalidConfig(format!(
                "engagement rate_weight must be within [0, 1], got {}",
                self.rate_weight
            )));
        }
        if !self.rate_ceiling.is_finite() || self.rate_ceiling <= 0.0 {
            return Err(MatchError::InvalidConfig(format!(
                "engagement rate_ceiling must be positive, got {}",
                self.rate_ceiling
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct EngagementScorer {
    config: EngagementConfig,
}

impl EngagementScorer {
    pub fn new(config: EngagementConfig) -> Self {
        Self { config }
    }

    /// Weighted geometric mean of the rate score and the follower score.
    ///
    /// A zero on either side yields zero, so an account with no audience
    /// cannot score on rate alone.
    pub fn score(&self, follower_score: f64, engagement_rate: f64) -> f64 {
        let reach = clamp01(follower_score);
        let rate = self.rate_score(engagement_rate);
        if reach <= 0.0 || rate <= 0.0 {
            return 0.0;
        }

        let rate_weight = self.config.rate_weight;
        let blended = rate_weight * rate.ln() + (1.0 - rate_weight) * reach.ln();
        clamp01(blended.exp())
    }

    pub fn rate_score(&self, engagement_rate: f64) -> f64 {
        if !engagement_rate.is_finite() || engagement_rate <= 0.0 {
            return 0.0;
        }
        clamp01(engagement_rate / self.config.rate_ceiling)
    }
}
