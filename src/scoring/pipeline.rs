use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

use crate::config::MatchConfig;
use crate::error::MatchError;
use crate::scoring::similarity::{brand_tokens, tokenize, SimilarityConfig, SimilarityScorer};
use crate::scoring::{EngagementScorer, MatchWeights, Normalizer, WeightedScorer};
use crate::{BrandProfile, CandidateProfile, Caution, SkipReason, SkippedCandidate};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Composite scores closer than this are considered tied.
    pub tie_precision: f64,
    pub default_count: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            tie_precision: 1e-6,
            default_count: crate::DEFAULT_KOL_COUNT,
        }
    }
}

impl RankingConfig {
    pub fn validate(&self) -> Result<(), MatchError> {
        if !self.tie_precision.is_finite() || self.tie_precision <= 0.0 {
            return Err(MatchError::InvalidConfig(format!(
                "tie_precision must be positive, got {}",
                self.tie_precision
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ScoredCandidate<'a> {
    pub profile: &'a CandidateProfile,
    pub follower_count: u64,
    pub engagement_rate: f64,
    pub ai_relevance: f64,
    pub similarity: f64,
    pub engagement: f64,
    pub composite: f64,
    pub cautions: Vec<Caution>,
}

#[derive(Debug)]
pub struct PipelineOutput<'a> {
    pub ranked: Vec<ScoredCandidate<'a>>,
    pub skipped: Vec<SkippedCandidate>,
    pub considered: usize,
    pub vocabulary_size: usize,
}

/// A candidate that passed validation, with metrics resolved and its text
/// tokenized, waiting for the batch vocabulary.
struct Admitted<'a> {
    profile: &'a CandidateProfile,
    follower_count: u64,
    engagement_rate: f64,
    tokens: Vec<String>,
    cautions: Vec<Caution>,
}

#[derive(Debug, Clone)]
pub struct ScoringPipeline {
    normalizer: Normalizer,
    engagement_scorer: EngagementScorer,
    weighted_scorer: WeightedScorer,
    similarity: SimilarityConfig,
    ranking: RankingConfig,
}

impl ScoringPipeline {
    pub fn new(
        normalizer: Normalizer,
        engagement_scorer: EngagementScorer,
        weighted_scorer: WeightedScorer,
        similarity: SimilarityConfig,
        ranking: RankingConfig,
    ) -> Result<Self, MatchError> {
        ranking.validate()?;
        Ok(Self {
            normalizer,
            engagement_scorer,
            weighted_scorer,
            similarity,
            ranking,
        })
    }

    pub fn from_config(config: &MatchConfig) -> Result<Self, MatchError> {
        config.validate()?;
        ScoringPipeline::new(
            Normalizer::new(config.followers.clone()),
            EngagementScorer::new(config.engagement.clone()),
            WeightedScorer::new(config.weights)?,
            config.similarity.clone(),
            config.ranking.clone(),
        )
    }

    pub fn weights(&self) -> MatchWeights {
        self.weighted_scorer.weights()
    }

    /// Validates, scores, ranks and truncates one batch.
    ///
    /// The only fatal input is a brand profile without description text.
    pub fn run<'a>(
        &self,
        brand: &BrandProfile,
        candidates: &'a [CandidateProfile],
        count: usize,
    ) -> Result<PipelineOutput<'a>, MatchError> {
        if brand.description_text.trim().is_empty() {
            return Err(MatchError::EmptyBrandDescription);
        }

        tracing::info!(candidates = candidates.len(), count, "starting matching run");

        let mut skipped = Vec::new();
        let mut admitted = Vec::with_capacity(candidates.len());
        let mut seen_ids: HashSet<&str> = HashSet::new();

        for candidate in candidates {
            match self.admit(candidate) {
                Ok(entry) => {
                    if !seen_ids.insert(candidate.id.as_str()) {
                        tracing::debug!(id = %candidate.id, "skipping duplicate candidate id");
                        skipped.push(SkippedCandidate {
                            id: candidate.id.clone(),
                            reason: SkipReason::DuplicateId,
                        });
                        continue;
                    }
                    admitted.push(entry);
                }
                Err(reason) => {
                    tracing::debug!(id = %candidate.id, reason = %reason.label(), "skipping candidate");
                    skipped.push(SkippedCandidate {
                        id: candidate.id.clone(),
                        reason,
                    });
                }
            }
        }

        let brand_tokens = brand_tokens(brand, &self.similarity);
        let candidate_tokens: Vec<Vec<String>> =
            admitted.iter().map(|entry| entry.tokens.clone()).collect();
        let similarity = SimilarityScorer::fit(&brand_tokens, &candidate_tokens);
        if !similarity.brand_has_content() {
            tracing::warn!("brand description produced no content terms; similarity will be 0");
        }

        let considered = admitted.len();
        let mut ranked: Vec<ScoredCandidate<'a>> = admitted
            .into_iter()
            .map(|entry| self.score(entry, &similarity))
            .collect();

        self.rank(&mut ranked);
        ranked.truncate(count);

        Ok(PipelineOutput {
            ranked,
            skipped,
            considered,
            vocabulary_size: similarity.vocabulary_size(),
        })
    }

    fn admit<'a>(&self, candidate: &'a CandidateProfile) -> Result<Admitted<'a>, SkipReason> {
        if candidate.id.trim().is_empty() {
            return Err(SkipReason::MissingId);
        }

        let follower_count = match candidate.follower_count {
            Some(value) => Some(
                u64::try_from(value)
                    .map_err(|_| SkipReason::NegativeMetric("follower_count".to_string()))?,
            ),
            None => None,
        };
        if let Some(rate) = candidate.avg_engagement_rate {
            if !rate.is_finite() {
                return Err(SkipReason::NonFiniteMetric("avg_engagement_rate".to_string()));
            }
            if rate < 0.0 {
                return Err(SkipReason::NegativeMetric("avg_engagement_rate".to_string()));
            }
        }
        if candidate.total_likes.is_some_and(|likes| likes < 0) {
            return Err(SkipReason::NegativeMetric("total_likes".to_string()));
        }
        if candidate.video_count.is_some_and(|videos| videos < 0) {
            return Err(SkipReason::NegativeMetric("video_count".to_string()));
        }

        let text = candidate.similarity_text();
        let has_metrics = follower_count.is_some()
            || candidate.avg_engagement_rate.is_some()
            || candidate.total_likes.is_some();
        if text.trim().is_empty() && !has_metrics {
            return Err(SkipReason::NoUsableData);
        }

        let mut cautions = Vec::new();
        if follower_count.is_none() {
            cautions.push(Caution::MissingFollowerCount);
        }
        let follower_count = follower_count.unwrap_or(0);

        let engagement_rate = match candidate.avg_engagement_rate {
            Some(rate) => rate,
            None => match derived_engagement_rate(candidate, follower_count) {
                Some(rate) => {
                    cautions.push(Caution::DerivedEngagementRate);
                    rate
                }
                None => {
                    cautions.push(Caution::MissingEngagementRate);
                    0.0
                }
            },
        };

        let tokens = tokenize(&text, &self.similarity);
        if tokens.is_empty() {
            cautions.push(Caution::InsufficientContent);
        }

        Ok(Admitted {
            profile: candidate,
            follower_count,
            engagement_rate,
            tokens,
            cautions,
        })
    }

    fn score<'a>(&self, entry: Admitted<'a>, similarity: &SimilarityScorer) -> ScoredCandidate<'a> {
        let mut cautions = entry.cautions;

        let (ai_relevance, relevance_caution) =
            self.normalizer.ai_relevance(entry.profile.ai_relevance_score);
        cautions.extend(relevance_caution);

        let similarity_score = if entry.tokens.is_empty() {
            0.0
        } else {
            similarity.score(&entry.tokens)
        };

        let follower_score = self.normalizer.follower_score(entry.follower_count);
        let engagement = self
            .engagement_scorer
            .score(follower_score, entry.engagement_rate);

        let composite = self
            .weighted_scorer
            .composite(ai_relevance, similarity_score, engagement);

        cautions.sort();
        cautions.dedup();

        tracing::debug!(
            id = %entry.profile.id,
            ai_relevance,
            similarity = similarity_score,
            engagement,
            composite,
            "scored candidate"
        );

        ScoredCandidate {
            profile: entry.profile,
            follower_count: entry.follower_count,
            engagement_rate: entry.engagement_rate,
            ai_relevance,
            similarity: similarity_score,
            engagement,
            composite,
            cautions,
        }
    }

    /// Descending composite (quantised to `tie_precision`), then higher AI
    /// relevance, then more followers, then ascending id.
    pub fn rank(&self, candidates: &mut [ScoredCandidate<'_>]) {
        let precision = self.ranking.tie_precision;
        candidates.sort_by(|a, b| compare_ranked(a, b, precision));
    }
}

fn compare_ranked(a: &ScoredCandidate<'_>, b: &ScoredCandidate<'_>, precision: f64) -> Ordering {
    quantize(b.composite, precision)
        .cmp(&quantize(a.composite, precision))
        .then_with(|| b.ai_relevance.total_cmp(&a.ai_relevance))
        .then_with(|| b.follower_count.cmp(&a.follower_count))
        .then_with(|| a.profile.id.cmp(&b.profile.id))
}

/// Maps a composite onto a grid of width `precision`. Composites that round
/// to the same grid point tie and fall through to the secondary keys.
/// Buckets have hard edges: two composites straddling a half-step boundary
/// (e.g. 0.4999994999 and 0.4999995001 at 1e-6) land in neighbouring buckets
/// and are ordered by composite even though they differ by far less than
/// `precision`. An epsilon comparison would avoid that but is not transitive,
/// so sorting with it is not a total order.
fn quantize(score: f64, precision: f64) -> i64 {
    (score / precision).round() as i64
}

/// Average likes per video divided by followers, when the raw totals exist.
fn derived_engagement_rate(candidate: &CandidateProfile, follower_count: u64) -> Option<f64> {
    let likes = candidate.total_likes?;
    let videos = candidate.video_count.filter(|videos| *videos > 0)?;
    if follower_count == 0 {
        return None;
    }
    Some((likes as f64 / videos as f64) / follower_count as f64)
}
