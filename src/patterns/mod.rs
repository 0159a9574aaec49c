//! Pattern registry for configuration-driven text handling
//!
//! This module provides:
//! - Pre-compiled regex patterns loaded from the `[patterns]` config section
//! - Tokenizer patterns (path prefix collapsing, token separators)
//! - The "Intermittent" summary prefix stripped before scoring
//! - Important-line patterns that keep a line from being ignored

use crate::error::{ClassifyError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Named pattern marking a line that must not be ignored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportantLinePattern {
    pub name: String,
    pub pattern: String,
}

/// Pattern configuration section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternsConfig {
    /// Path-like prefix; capture group 1 is kept
    pub path_prefix: String,
    /// Runs of characters that separate tokens
    pub token_separator: String,
    /// Prefix stripped from bug summaries before scoring
    pub intermittent_prefix: String,
    pub important_lines: Vec<ImportantLinePattern>,
}

impl Default for PatternsConfig {
    fn default() -> Self {
        Self {
            path_prefix: r"\S+/(\S+\s)".to_string(),
            token_separator: r"[\s/,|]+".to_string(),
            intermittent_prefix: r"^\s*Intermittent\s+".to_string(),
            important_lines: vec![
                ImportantLinePattern {
                    name: "leak".to_string(),
                    pattern: r"\d+ bytes leaked".to_string(),
                },
                ImportantLinePattern {
                    name: "crash".to_string(),
                    pattern: "application crashed".to_string(),
                },
                ImportantLinePattern {
                    name: "unexpected".to_string(),
                    pattern: "TEST-UNEXPECTED-".to_string(),
                },
            ],
        }
    }
}

/// Compiled important-line pattern
#[derive(Debug, Clone)]
pub struct CompiledImportantPattern {
    pub name: String,
    pub regex: Regex,
}

/// Pattern registry with all pre-compiled patterns
#[derive(Debug, Clone)]
pub struct PatternRegistry {
    pub path_prefix: Regex,
    pub token_separator: Regex,
    pub intermittent_prefix: Regex,
    pub important_lines: Vec<CompiledImportantPattern>,
}

impl PatternRegistry {
    /// Build pattern registry from the parsed configuration section
    pub fn from_config(config: &PatternsConfig) -> Result<Self> {
        let path_prefix = compile("path_prefix", &config.path_prefix)?;
        if path_prefix.captures_len() < 2 {
            return Err(ClassifyError::Config(
                "Pattern 'path_prefix' must contain a capture group".to_string(),
            ));
        }

        let important_lines = config
            .important_lines
            .iter()
            .map(|p| {
                compile(&p.name, &p.pattern).map(|regex| CompiledImportantPattern {
                    name: p.name.clone(),
                    regex,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            path_prefix,
            token_separator: compile("token_separator", &config.token_separator)?,
            intermittent_prefix: compile("intermittent_prefix", &config.intermittent_prefix)?,
            important_lines,
        })
    }

    /// Registry built from the default pattern set
    pub fn with_defaults() -> Result<Self> {
        Self::from_config(&PatternsConfig::default())
    }

    /// Collapse `dir/sub/file.ext ` to `file.ext ` everywhere in the text
    pub fn collapse_paths<'a>(&self, text: &'a str) -> std::borrow::Cow<'a, str> {
        self.path_prefix.replace_all(text, "$1")
    }

    /// Strip the leading "Intermittent " marker from a bug summary
    pub fn strip_intermittent<'a>(&self, summary: &'a str) -> std::borrow::Cow<'a, str> {
        self.intermittent_prefix.replace(summary, "")
    }

    /// Name of the first important-line pattern matching the text
    pub fn important_match(&self, text: &str) -> Option<&str> {
        self.important_lines
            .iter()
            .find(|p| p.regex.is_match(text))
            .map(|p| p.name.as_str())
    }
}

fn compile(name: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| ClassifyError::Config(format!("Invalid pattern '{}': {}", name, e)))
}
