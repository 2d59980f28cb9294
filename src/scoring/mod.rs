pub mod engagement;
pub mod normalize;
pub mod pipeline;
pub mod similarity;
pub mod weighted;

pub use engagement::{EngagementConfig, EngagementScorer};
pub use normalize::{FollowerScaleConfig, Normalizer};
pub use pipeline::{PipelineOutput, RankingConfig, ScoredCandidate, ScoringPipeline};
pub use similarity::{SimilarityConfig, SimilarityScorer, TfIdfSpace};
pub use weighted::{MatchWeights, WeightedScorer};
