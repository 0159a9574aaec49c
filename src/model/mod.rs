//! Input records for a classification run
//!
//! These mirror what the log parser, the autoclassifier and the bug search
//! service hand over for one failure line. They are plain data: nothing here
//! is derived or mutated by the classifier.

use serde::{Deserialize, Deserializer, Serialize};

/// Kind of structured failure line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureAction {
    TestResult,
    Log,
    Crash,
}

/// Structured failure line produced by the log parser
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FailureLine {
    pub action: Option<FailureAction>,
    #[serde(default)]
    pub test: Option<String>,
    #[serde(default)]
    pub subtest: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub expected: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
    /// Log level, only set for `log` lines
    #[serde(default)]
    pub level: Option<String>,
}

impl FailureLine {
    /// Test identifier, treating an empty string as absent
    pub fn test_id(&self) -> Option<&str> {
        non_empty(self.test.as_deref())
    }

    /// Whether this line must never be ignored on structural grounds
    pub fn is_crash_or_result(&self) -> bool {
        matches!(
            self.action,
            Some(FailureAction::Crash) | Some(FailureAction::TestResult)
        )
    }
}

/// Failure the autoclassifier has already seen, possibly linked to a bug
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedFailure {
    pub id: u64,
    #[serde(default)]
    pub bug_number: Option<u64>,
    #[serde(default, alias = "summary")]
    pub bug_summary: String,
    #[serde(default, alias = "resolution")]
    pub bug_resolution: String,
}

/// One matcher's confidence that a line belongs to a classified failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    #[serde(alias = "classified_failure")]
    pub classified_failure_id: u64,
    #[serde(default)]
    pub matcher_name: String,
    #[serde(deserialize_with = "deserialize_score")]
    pub score: f32,
}

/// Bug returned by free-text search; `id` is the bug number
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BugSuggestion {
    pub id: u64,
    #[serde(default, alias = "summary")]
    pub bug_summary: String,
    #[serde(default, alias = "resolution")]
    pub bug_resolution: String,
}

/// Bug search results, split the way the search service returns them
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BugSuggestions {
    #[serde(default)]
    pub open_recent: Vec<BugSuggestion>,
    #[serde(default)]
    pub all_others: Vec<BugSuggestion>,
}

impl BugSuggestions {
    /// Open/recent bugs first, then everything else
    pub fn flattened(&self) -> impl Iterator<Item = &BugSuggestion> {
        self.open_recent.iter().chain(self.all_others.iter())
    }
}

/// The autoclassifier's own pick as reported in line metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BestClassification {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub bug_number: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineMetadata {
    #[serde(default)]
    pub best_classification: Option<BestClassification>,
}

/// Everything known about one failure line
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FailureLineContext {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub line_number: Option<u64>,
    #[serde(default)]
    pub failure_line: Option<FailureLine>,
    #[serde(default)]
    pub search_text: String,
    #[serde(default)]
    pub classified_failures: Vec<ClassifiedFailure>,
    #[serde(default)]
    pub matches: Vec<Match>,
    #[serde(default)]
    pub bug_suggestions: BugSuggestions,
    #[serde(default)]
    pub best_classification_id: Option<u64>,
    #[serde(default)]
    pub metadata: Option<LineMetadata>,
    /// Already confirmed by a sheriff; no candidates are built
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub verified_ignore: bool,
}

impl FailureLineContext {
    pub fn new(id: impl Into<String>, search_text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            search_text: search_text.into(),
            ..Default::default()
        }
    }

    /// True only when the autoclassifier explicitly recommends ignoring
    /// the line (best classification with bug number 0)
    pub fn best_is_ignore(&self) -> bool {
        self.metadata
            .as_ref()
            .and_then(|m| m.best_classification.as_ref())
            .map(|best| best.bug_number == Some(0))
            .unwrap_or(false)
    }

    /// Test identifier from the structured line, else parsed from the
    /// `status | test | message` search text
    pub fn test_id(&self) -> Option<&str> {
        match &self.failure_line {
            Some(line) => line.test_id(),
            None => parse_test(&self.search_text),
        }
    }

    /// Text inspected for important-line markers
    pub fn message_text(&self) -> &str {
        self.failure_line
            .as_ref()
            .and_then(|line| {
                non_empty(line.signature.as_deref()).or(non_empty(line.message.as_deref()))
            })
            .unwrap_or(self.search_text.as_str())
    }
}

/// Middle field of a `a | b | c` line, if it has at least three fields
pub fn parse_test(line: &str) -> Option<&str> {
    let mut parts = line.splitn(3, " | ");
    let _status = parts.next();
    let test = parts.next();
    parts.next()?;
    non_empty(test)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

// The autoclassifier API serialises decimals as strings
fn deserialize_score<'de, D>(deserializer: D) -> std::result::Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f32),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse::<f32>().map_err(serde::de::Error::custom),
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Number(n) => n.to_string(),
        Raw::Text(s) => s,
    })
}
