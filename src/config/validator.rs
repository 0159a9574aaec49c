use crate::config::Config;
use crate::error::{ClassifyError, Result, ValidationError};
use crate::patterns::PatternRegistry;
use std::collections::HashSet;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_scoring(config, &mut errors);
        Self::validate_ranking(config, &mut errors);
        Self::validate_selection(config, &mut errors);
        Self::validate_patterns(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ClassifyError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != "1.0.0" {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_scoring(config: &Config, errors: &mut Vec<ValidationError>) {
        let penalty = config.scoring.resolved_penalty;
        if !(0.0..=1.0).contains(&penalty) {
            errors.push(ValidationError::new(
                "scoring.resolved_penalty",
                format!("Penalty must be between 0.0 and 1.0, got {}", penalty),
            ));
        }
    }

    fn validate_ranking(config: &Config, errors: &mut Vec<ValidationError>) {
        let ranking = &config.ranking;

        if !(0.0..=1.0).contains(&ranking.lower_cutoff) {
            errors.push(ValidationError::new(
                "ranking.lower_cutoff",
                format!(
                    "Cutoff must be between 0.0 and 1.0, got {}",
                    ranking.lower_cutoff
                ),
            ));
        }

        if !(0.0..=1.0).contains(&ranking.best_ratio) {
            errors.push(ValidationError::new(
                "ranking.best_ratio",
                format!(
                    "Ratio must be between 0.0 and 1.0, got {}",
                    ranking.best_ratio
                ),
            ));
        }

        // The top option must always be visible
        if ranking.min_options == 0 {
            errors.push(ValidationError::new(
                "ranking.min_options",
                "At least one option must always be visible",
            ));
        }

        if ranking.max_options < ranking.min_options {
            errors.push(ValidationError::new(
                "ranking.max_options",
                format!(
                    "max_options ({}) must not be below min_options ({})",
                    ranking.max_options, ranking.min_options
                ),
            ));
        }
    }

    fn validate_selection(config: &Config, errors: &mut Vec<ValidationError>) {
        let selection = &config.selection;

        for (path, value) in [
            ("selection.good_match_score", selection.good_match_score),
            ("selection.bad_match_score", selection.bad_match_score),
        ] {
            if !(0.0..=1.0).contains(&value) {
                errors.push(ValidationError::new(
                    path,
                    format!("Score must be between 0.0 and 1.0, got {}", value),
                ));
            }
        }

        if selection.bad_match_score > selection.good_match_score {
            errors.push(ValidationError::new(
                "selection.bad_match_score",
                format!(
                    "bad_match_score ({}) must not exceed good_match_score ({})",
                    selection.bad_match_score, selection.good_match_score
                ),
            ));
        }
    }

    fn validate_patterns(config: &Config, errors: &mut Vec<ValidationError>) {
        let patterns = &config.patterns;

        let mut seen = HashSet::new();
        for (idx, pattern) in patterns.important_lines.iter().enumerate() {
            if pattern.name.is_empty() {
                errors.push(ValidationError::new(
                    format!("patterns.important_lines[{}].name", idx),
                    "Pattern name cannot be empty",
                ));
            } else if !seen.insert(pattern.name.as_str()) {
                errors.push(ValidationError::new(
                    format!("patterns.important_lines[{}].name", idx),
                    format!("Duplicate pattern name: {}", pattern.name),
                ));
            }
        }

        if patterns.token_separator.is_empty() {
            errors.push(ValidationError::new(
                "patterns.token_separator",
                "Token separator cannot be empty",
            ));
        }

        if let Err(e) = PatternRegistry::from_config(patterns) {
            errors.push(ValidationError::new("patterns", e.to_string()));
        }
    }
}
