pub mod config;
pub mod error;
pub mod report;
pub mod scoring;

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

use crate::config::MatchConfig;
use crate::scoring::{MatchWeights, ScoringPipeline};

pub use crate::error::MatchError;

pub const DEFAULT_KOL_COUNT: usize = 10;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrandProfile {
    #[serde(alias = "description")]
    pub description_text: String,
    #[serde(default, alias = "keywords")]
    pub target_keywords: BTreeSet<String>,
    /// Themes from brand analysis. They join the keywords in the brand
    /// document used for similarity.
    #[serde(default)]
    pub key_themes: Vec<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub target_audience: Option<String>,
    #[serde(default)]
    pub brand_voice: Option<String>,
}

/// One influencer record as handed over by the discovery and AI-assessment
/// steps. Metrics are signed so malformed upstream data can be detected and
/// skipped rather than rejected at deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateProfile {
    #[serde(default, alias = "username")]
    pub id: String,
    #[serde(default, alias = "video_texts")]
    pub profile_text: String,
    #[serde(default, alias = "followers", deserialize_with = "lenient_count")]
    pub follower_count: Option<i64>,
    #[serde(default)]
    pub avg_engagement_rate: Option<f64>,
    #[serde(default)]
    pub ai_relevance_score: Option<f64>,
    #[serde(default)]
    pub ai_rationale: String,
    #[serde(default, alias = "collaboration_potential")]
    pub ai_collaboration_idea: String,
    #[serde(default, alias = "cautions")]
    pub ai_cautions: Vec<String>,
    #[serde(default)]
    pub audience_fit: Option<String>,
    #[serde(default)]
    pub content_alignment: Option<String>,
    #[serde(default)]
    pub match_reasons: Vec<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub biography: Option<String>,
    #[serde(default)]
    pub profile_url: Option<String>,
    #[serde(default, alias = "likes", deserialize_with = "lenient_count")]
    pub total_likes: Option<i64>,
    #[serde(default, alias = "videos", deserialize_with = "lenient_count")]
    pub video_count: Option<i64>,
}

/// Scrapers write `""` for counts they could not read and sometimes emit
/// counts as strings or floats. Anything that is not a number reads as
/// missing so one bad field cannot fail the whole batch.
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawCount {
        Integer(i64),
        Float(f64),
        Text(String),
        Other(serde::de::IgnoredAny),
    }

    let count = match Option::<RawCount>::deserialize(deserializer)? {
        Some(RawCount::Integer(value)) => Some(value),
        Some(RawCount::Float(value)) if value.is_finite() => Some(value.trunc() as i64),
        Some(RawCount::Text(text)) => text.trim().replace(',', "").parse::<i64>().ok(),
        _ => None,
    };
    Ok(count)
}

impl CandidateProfile {
    /// Text used for similarity: biography, then profile text.
    pub fn similarity_text(&self) -> String {
        match self.biography.as_deref() {
            Some(bio) if !bio.trim().is_empty() => format!("{} {}", bio.trim(), self.profile_text),
            _ => self.profile_text.clone(),
        }
    }

    pub fn resolved_profile_url(&self) -> String {
        self.profile_url
            .clone()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| format!("https://www.tiktok.com/@{}", self.id))
    }
}

/// Non-fatal data-quality flag attached to a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Caution {
    MissingAiRelevance,
    AiRelevanceOutOfRange,
    InsufficientContent,
    MissingFollowerCount,
    MissingEngagementRate,
    DerivedEngagementRate,
}

impl Caution {
    pub fn message(self) -> &'static str {
        match self {
            Caution::MissingAiRelevance => "AI relevance score missing; treated as 0",
            Caution::AiRelevanceOutOfRange => "AI relevance score outside [0, 1]; clamped",
            Caution::InsufficientContent => "insufficient content for similarity",
            Caution::MissingFollowerCount => "follower count missing; reach treated as 0",
            Caution::MissingEngagementRate => "engagement rate missing; treated as 0",
            Caution::DerivedEngagementRate => {
                "engagement rate derived from total likes per video and followers"
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "field", rename_all = "snake_case")]
pub enum SkipReason {
    MissingId,
    DuplicateId,
    NegativeMetric(String),
    NonFiniteMetric(String),
    NoUsableData,
}

impl SkipReason {
    pub fn label(&self) -> String {
        match self {
            SkipReason::MissingId => "missing id".to_string(),
            SkipReason::DuplicateId => "duplicate id".to_string(),
            SkipReason::NegativeMetric(field) => format!("negative {}", field),
            SkipReason::NonFiniteMetric(field) => format!("non-finite {}", field),
            SkipReason::NoUsableData => "no profile text and no metrics".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SkippedCandidate {
    pub id: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub rank: usize,
    pub candidate_id: String,
    pub composite_score: f64,
    /// Composite on a 0-100 scale, one decimal.
    pub match_score: f64,
    pub ai_relevance_score: f64,
    pub similarity_score: f64,
    pub engagement_score: f64,
    pub follower_count: u64,
    pub engagement_rate: f64,
    pub avg_likes_per_video: Option<f64>,
    pub likes_per_100_followers: Option<f64>,
    pub nickname: Option<String>,
    pub biography: Option<String>,
    pub profile_url: String,
    pub ai_rationale: String,
    pub ai_collaboration_idea: String,
    pub ai_cautions: Vec<String>,
    pub audience_fit: Option<String>,
    pub content_alignment: Option<String>,
    pub match_reasons: Vec<String>,
    pub cautions: Vec<Caution>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    pub candidates_received: usize,
    pub candidates_considered: usize,
    pub candidates_skipped: usize,
    pub skipped: Vec<SkippedCandidate>,
    pub requested_count: usize,
    pub returned_count: usize,
    pub weights: MatchWeights,
    pub vocabulary_size: usize,
    pub input_fingerprint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchReport {
    pub results: Vec<MatchResult>,
    pub metadata: RunMetadata,
}

/// Ranks `candidates` against `brand` with the default configuration.
pub fn match_candidates(
    brand: &BrandProfile,
    candidates: &[CandidateProfile],
    count: usize,
) -> Result<MatchReport, MatchError> {
    match_candidates_with_config(brand, candidates, count, &MatchConfig::default())
}

pub fn match_candidates_with_config(
    brand: &BrandProfile,
    candidates: &[CandidateProfile],
    count: usize,
    config: &MatchConfig,
) -> Result<MatchReport, MatchError> {
    let pipeline = ScoringPipeline::from_config(config)?;
    let output = pipeline.run(brand, candidates, count)?;

    let results = report::assemble(output.ranked);
    let mut skipped = output.skipped;
    skipped.sort();

    tracing::info!(
        received = candidates.len(),
        considered = output.considered,
        skipped = skipped.len(),
        returned = results.len(),
        "matching run complete"
    );

    let metadata = RunMetadata {
        candidates_received: candidates.len(),
        candidates_considered: output.considered,
        candidates_skipped: skipped.len(),
        skipped,
        requested_count: count,
        returned_count: results.len(),
        weights: pipeline.weights(),
        vocabulary_size: output.vocabulary_size,
        input_fingerprint: input_fingerprint(brand, candidates),
    };

    Ok(MatchReport { results, metadata })
}

/// Digest of the run inputs that does not depend on candidate order.
pub fn input_fingerprint(brand: &BrandProfile, candidates: &[CandidateProfile]) -> String {
    use sha2::{Digest, Sha256};

    let mut records: Vec<String> = candidates
        .iter()
        .map(|candidate| serde_json::to_string(candidate).unwrap_or_default())
        .collect();
    records.sort();

    let mut hasher = Sha256::new();
    hasher.update(brand.description_text.as_bytes());
    for keyword in &brand.target_keywords {
        hasher.update([0u8]);
        hasher.update(keyword.as_bytes());
    }
    for theme in &brand.key_themes {
        hasher.update([1u8]);
        hasher.update(theme.as_bytes());
    }
    for record in &records {
        hasher.update([0xffu8]);
        hasher.update(record.as_bytes());
    }
    let digest = hasher.finalize();
    digest[..16].iter().map(|byte| format!("{:02x}", byte)).collect()
}

pub(crate) fn clamp01(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.max(0.0).min(1.0)
}

pub(crate) fn log10_safe(value: f64) -> f64 {
    if value <= 0.0 {
        0.0
    } else {
        value.log10()
    }
}

pub fn format_number(value: f64) -> String {
    let rounded = value.round().max(0.0) as i64;
    let mut chars: Vec<char> = rounded.to_string().chars().collect();
    let mut result = String::new();
    let mut count = 0usize;

    while let Some(ch) = chars.pop() {
        if count == 3 {
            result.push(',');
            count = 0;
        }
        result.push(ch);
        count += 1;
    }

    result.chars().rev().collect()
}

pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

pub fn format_float(value: f64, digits: usize) -> String {
    format!("{:.1$}", value, digits)
}
