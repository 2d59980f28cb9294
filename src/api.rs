use serde::Deserialize;
use kol_matcher::{BrandProfile, CandidateProfile};

/// Batch file handed over by the discovery and AI-assessment steps.
#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub brand: BrandProfile,
    #[serde(default)]
    pub candidates: Vec<CandidateProfile>,
    pub count: Option<usize>,
}

impl BatchRequest {
    pub fn parse(payload: &str) -> Result<Self, String> {
        serde_json::from_str(payload).map_err(|err| format!("failed to parse batch: {}", err))
    }

    /// The CLI flag wins over the batch file, which wins over the config.
    pub fn resolve_count(&self, cli_count: Option<usize>, default_count: usize) -> usize {
        cli_count.or(self.count).unwrap_or(default_count)
    }
}
