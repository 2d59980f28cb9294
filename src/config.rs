use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::MatchError;
use crate::scoring::{
    EngagementConfig, FollowerScaleConfig, MatchWeights, RankingConfig, SimilarityConfig,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    pub weights: MatchWeights,
    pub followers: FollowerScaleConfig,
    pub engagement: EngagementConfig,
    pub similarity: SimilarityConfig,
    pub ranking: RankingConfig,
}

impl MatchConfig {
    pub fn load(path: Option<PathBuf>) -> Result<(Self, Option<PathBuf>), String> {
        let config_path = path.or_else(default_config_path);
        let mut config = if let Some(path) = config_path.as_ref() {
            if path.exists() {
                let contents = std::fs::read_to_string(path)
                    .map_err(|err| format!("failed to read config: {}", err))?;
                toml::from_str(&contents)
                    .map_err(|err| format!("failed to parse config: {}", err))?
            } else {
                MatchConfig::default()
            }
        } else {
            MatchConfig::default()
        };

        config.apply_env_overrides();
        Ok((config, config_path))
    }

    pub fn write(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|err| format!("failed to create config dir: {}", err))?;
            }
        }
        let payload = toml::to_string_pretty(self)
            .map_err(|err| format!("failed to serialize config: {}", err))?;
        std::fs::write(path, payload).map_err(|err| format!("failed to write config: {}", err))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        self.weights.validate()?;
        self.followers.validate()?;
        self.engagement.validate()?;
        self.ranking.validate()?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Some(value) = env_f64("KOL_WEIGHT_AI_RELEVANCE") {
            self.weights.ai_relevance = value;
        }
        if let Some(value) = env_f64("KOL_WEIGHT_SIMILARITY") {
            self.weights.similarity = value;
        }
        if let Some(value) = env_f64("KOL_WEIGHT_ENGAGEMENT") {
            self.weights.engagement = value;
        }
        if let Some(value) = env_f64("KOL_FOLLOWER_SATURATION") {
            self.followers.saturation = value;
        }
        if let Ok(count) = env::var("KOL_DEFAULT_COUNT") {
            if let Ok(value) = count.trim().parse::<usize>() {
                self.ranking.default_count = value;
            }
        }
    }
}

fn env_f64(key: &str) -> Option<f64> {
    env::var(key).ok()?.trim().parse::<f64>().ok()
}

fn default_config_path() -> Option<PathBuf> {
    env::var("KOL_MATCHER_CONFIG")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| Some(PathBuf::from("config/matcher.toml")))
}
