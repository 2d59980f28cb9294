use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MatchError {
    #[error("brand profile has an empty description; similarity cannot be computed")]
    EmptyBrandDescription,

    #[error(
        "invalid match weights (ai_relevance={ai_relevance}, similarity={similarity}, engagement={engagement}): {reason}"
    )]
    InvalidWeights {
        ai_relevance: f64,
        similarity: f64,
        engagement: f64,
        reason: String,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
