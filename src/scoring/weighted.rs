use serde::{Deserialize, Serialize};

use crate::clamp01;
use crate::error::MatchError;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Blend of the three per-candidate signals into the composite score.
///
/// The AI brand-fit judgment is trusted most; text overlap and audience
/// quality refine it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchWeights {
    pub ai_relevance: f64,
    pub similarity: f64,
    pub engagement: f64,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            ai_relevance: 0.65,
            similarity: 0.25,
            engagement: 0.10,
        }
    }
}

impl MatchWeights {
    pub fn sum(&self) -> f64 {
        self.ai_relevance + self.similarity + self.engagement
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        let values = [self.ai_relevance, self.similarity, self.engagement];
        if values.iter().any(|value| !value.is_finite()) {
            return Err(self.invalid("weights must be finite"));
        }
        if values.iter().any(|value| *value < 0.0) {
            return Err(self.invalid("weights must be non-negative"));
        }
        if (self.sum() - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(self.invalid(&format!("weights must sum to 1.0, got {}", self.sum())));
        }
        Ok(())
    }

    fn invalid(&self, reason: &str) -> MatchError {
        MatchError::InvalidWeights {
            ai_relevance: self.ai_relevance,
            similarity: self.similarity,
            engagement: self.engagement,
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WeightedScorer {
    weights: MatchWeights,
}

impl WeightedScorer {
    pub fn new(weights: MatchWeights) -> Result<Self, MatchError> {
        weights.validate()?;
        Ok(Self { weights })
    }

    pub fn weights(&self) -> MatchWeights {
        self.weights
    }

    /// Inputs are clamped before weighting, so the result stays in [0, 1]
    /// and is non-decreasing in each argument.
    pub fn composite(&self, ai_relevance: f64, similarity: f64, engagement: f64) -> f64 {
        let mut score = 0.0;

        score += clamp01(ai_relevance) * self.weights.ai_relevance;
        score += clamp01(similarity) * self.weights.similarity;
        score += clamp01(engagement) * self.weights.engagement;

        clamp01(score)
    }
}
