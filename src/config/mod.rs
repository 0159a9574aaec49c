//! Configuration management for autoclassify
//!
//! This module handles loading, validation, and management of the
//! classification thresholds and text patterns. Every value has a built-in
//! default, so a missing file simply means the defaults apply.

use crate::classify::{BAD_MATCH_SCORE, GOOD_MATCH_SCORE, RESOLVED_PENALTY};
use crate::error::{ClassifyError, Result};
use crate::patterns::PatternsConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

mod validator;

pub use validator::ConfigValidator;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub patterns: PatternsConfig,
    #[serde(default)]
    pub profiles: HashMap<String, ProfileOverrides>,
}

/// Metadata about the configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
    #[serde(default = "current_timestamp")]
    pub last_modified: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Scoring of bug suggestions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Multiplier for bugs with a resolution
    pub resolved_penalty: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            resolved_penalty: RESOLVED_PENALTY,
        }
    }
}

/// Visibility heuristic for ranked options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Absolute score floor
    pub lower_cutoff: f32,
    /// Fraction of the top option's score an option must reach
    pub best_ratio: f32,
    /// Options visible at most
    pub max_options: usize,
    /// Leading options that are always visible
    pub min_options: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            lower_cutoff: 0.1,
            best_ratio: 0.5,
            max_options: 10,
            min_options: 1,
        }
    }
}

/// Thresholds used by the default selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub good_match_score: f32,
    pub bad_match_score: f32,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            good_match_score: GOOD_MATCH_SCORE,
            bad_match_score: BAD_MATCH_SCORE,
        }
    }
}

/// Profile-specific configuration overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub good_match_score: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bad_match_score: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_options: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_penalty: Option<f32>,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ClassifyError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| ClassifyError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        // Apply environment variable overrides
        config.apply_env_overrides();

        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ClassifyError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Load configuration with a specific profile applied
    pub fn load_with_profile(path: &Path, profile: &str) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_profile(profile)?;
        Ok(config)
    }

    /// Apply a profile's overrides to the configuration
    pub fn apply_profile(&mut self, profile: &str) -> Result<()> {
        let overrides = self
            .profiles
            .get(profile)
            .cloned()
            .ok_or_else(|| ClassifyError::InvalidConfigValue {
                path: format!("profiles.{}", profile),
                message: "Profile is not defined".to_string(),
            })?;

        if let Some(score) = overrides.good_match_score {
            self.selection.good_match_score = score;
        }
        if let Some(score) = overrides.bad_match_score {
            self.selection.bad_match_score = score;
        }
        if let Some(max) = overrides.max_options {
            self.ranking.max_options = max;
        }
        if let Some(penalty) = overrides.resolved_penalty {
            self.scoring.resolved_penalty = penalty;
        }

        ConfigValidator::validate(self)
    }

    /// Apply environment variable overrides
    /// Environment variables in format: AUTOCLASSIFY_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(std::env::vars());
    }

    /// Apply `AUTOCLASSIFY_`-prefixed overrides from any key/value source
    pub fn apply_overrides(&mut self, vars: impl IntoIterator<Item = (String, String)>) {
        for (key, value) in vars {
            if let Some(config_key) = key.strip_prefix("AUTOCLASSIFY_") {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "SCORING__RESOLVED_PENALTY" => {
                self.scoring.resolved_penalty = parse_value(path, value)?;
            }
            "RANKING__LOWER_CUTOFF" => {
                self.ranking.lower_cutoff = parse_value(path, value)?;
            }
            "RANKING__BEST_RATIO" => {
                self.ranking.best_ratio = parse_value(path, value)?;
            }
            "RANKING__MAX_OPTIONS" => {
                self.ranking.max_options = parse_value(path, value)?;
            }
            "RANKING__MIN_OPTIONS" => {
                self.ranking.min_options = parse_value(path, value)?;
            }
            "SELECTION__GOOD_MATCH_SCORE" => {
                self.selection.good_match_score = parse_value(path, value)?;
            }
            "SELECTION__BAD_MATCH_SCORE" => {
                self.selection.bad_match_score = parse_value(path, value)?;
            }
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ClassifyError::Config("Cannot determine config directory".to_string()))?;

        Ok(config_dir.join("autoclassify").join("config.toml"))
    }
}

fn parse_value<T: std::str::FromStr>(path: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ClassifyError::InvalidConfigValue {
            path: path.to_string(),
            message: format!("Cannot parse '{}'", value),
        })
}

impl Default for Config {
    fn default() -> Self {
        Self {
            meta: MetaConfig {
                schema_version: "1.0.0".to_string(),
                created_at: current_timestamp(),
                last_modified: current_timestamp(),
            },
            scoring: ScoringConfig::default(),
            ranking: RankingConfig::default(),
            selection: SelectionConfig::default(),
            patterns: PatternsConfig::default(),
            profiles: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_overrides(vars(&[
            ("AUTOCLASSIFY_SELECTION__GOOD_MATCH_SCORE", "0.8"),
            ("AUTOCLASSIFY_RANKING__MAX_OPTIONS", "5"),
            ("UNRELATED_VAR", "1"),
        ]));
        assert_eq!(config.selection.good_match_score, 0.8);
        assert_eq!(config.ranking.max_options, 5);
    }

    #[test]
    fn test_bad_env_override_ignored() {
        let mut config = Config::default();
        config.apply_overrides(vars(&[("AUTOCLASSIFY_RANKING__MAX_OPTIONS", "many")]));
        assert_eq!(config.ranking.max_options, 10);
    }

    #[test]
    fn test_apply_profile() {
        let mut config = Config::default();
        config.profiles.insert(
            "strict".to_string(),
            ProfileOverrides {
                good_match_score: Some(0.9),
                max_options: Some(3),
                ..Default::default()
            },
        );

        config.apply_profile("strict").unwrap();
        assert_eq!(config.selection.good_match_score, 0.9);
        assert_eq!(config.ranking.max_options, 3);
        assert_eq!(config.selection.bad_match_score, BAD_MATCH_SCORE);
    }

    #[test]
    fn test_unknown_profile() {
        let mut config = Config::default();
        assert!(config.apply_profile("missing").is_err());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let toml_str = r#"
[_meta]
schema_version = "1.0.0"

[selection]
good_match_score = 0.7
bad_match_score = 0.2
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.selection.good_match_score, 0.7);
        assert_eq!(config.ranking, RankingConfig::default());
        assert_eq!(config.patterns, PatternsConfig::default());
    }
}
