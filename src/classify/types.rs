// Shared types for the classification pipeline
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::{BugSuggestion, ClassifiedFailure};

/// Where a candidate classification comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OptionType {
    /// Structured match proposed by the autoclassifier
    ClassifiedFailure,
    /// Free-text bug search result
    UnstructuredBug,
    /// Bug number typed in by the user
    Manual,
    /// Leave the line unclassified
    Ignore,
}

impl OptionType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ClassifiedFailure => "classifiedFailure",
            Self::UnstructuredBug => "unstructuredBug",
            Self::Manual => "manual",
            Self::Ignore => "ignore",
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score one matcher assigned to a classified failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatcherScore {
    pub matcher: String,
    pub score: f32,
}

/// One candidate classification for a failure line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineOption {
    #[serde(rename = "type")]
    pub option_type: OptionType,
    /// Stable id, `{line}-{source}`
    pub id: String,
    pub classified_failure_id: Option<u64>,
    pub bug_number: Option<u64>,
    pub bug_summary: Option<String>,
    pub bug_resolution: Option<String>,
    /// Matcher scores, only for classified failures
    pub matches: Vec<MatcherScore>,
    /// None until scored; extras are never scored
    pub score: Option<f32>,
    pub is_best: bool,
    pub hidden: bool,
    pub selectable: bool,
    pub ignore_always: bool,
    pub manual_bug_number: Option<u64>,
}

impl LineOption {
    fn base(option_type: OptionType, id: String) -> Self {
        Self {
            option_type,
            id,
            classified_failure_id: None,
            bug_number: None,
            bug_summary: None,
            bug_resolution: None,
            matches: Vec::new(),
            score: None,
            is_best: false,
            hidden: false,
            selectable: true,
            ignore_always: false,
            manual_bug_number: None,
        }
    }

    pub fn classified_failure(
        line_id: &str,
        failure: &ClassifiedFailure,
        matches: Vec<MatcherScore>,
    ) -> Self {
        Self {
            classified_failure_id: Some(failure.id),
            bug_number: failure.bug_number,
            bug_summary: Some(failure.bug_summary.clone()),
            bug_resolution: Some(failure.bug_resolution.clone()),
            matches,
            // A classified failure not yet linked to a filed bug
            selectable: failure.bug_number.is_some(),
            ..Self::base(
                OptionType::ClassifiedFailure,
                format!("{}-{}", line_id, failure.id),
            )
        }
    }

    pub fn unstructured_bug(line_id: &str, bug: &BugSuggestion) -> Self {
        Self {
            bug_number: Some(bug.id),
            bug_summary: Some(bug.bug_summary.clone()),
            bug_resolution: Some(bug.bug_resolution.clone()),
            ..Self::base(
                OptionType::UnstructuredBug,
                format!("{}-ub-{}", line_id, bug.id),
            )
        }
    }

    pub fn manual(line_id: &str) -> Self {
        Self::base(OptionType::Manual, format!("{}-manual", line_id))
    }

    pub fn ignore(line_id: &str) -> Self {
        Self {
            classified_failure_id: Some(0),
            ..Self::base(OptionType::Ignore, format!("{}-ignore", line_id))
        }
    }

    /// Score for ordering and thresholds; unscored counts as 0
    pub fn score_or_zero(&self) -> f32 {
        self.score.unwrap_or(0.0)
    }
}

/// Which branch of the default selection produced the default option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionReason {
    /// The autoclassifier's own best classification
    AutoclassifierBest,
    /// Best suggestion scored at or above the good match threshold
    GoodMatch,
    /// Line judged important and the best suggestion is not a bad match
    AcceptableMatch,
    /// Line judged ignorable
    Ignore,
    /// Line judged important with no usable suggestion
    Manual,
}

/// Result of classifying one failure line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub line_id: String,
    /// Ranked line-specific candidates, with visibility applied
    pub options: Vec<LineOption>,
    /// `manual` then `ignore`, always present
    pub extra_options: [LineOption; 2],
    pub default_option_id: String,
    pub reason: SelectionReason,
}

impl Classification {
    /// Default option; falls back to the ignore option
    pub fn default_option(&self) -> &LineOption {
        self.option(&self.default_option_id)
            .unwrap_or(&self.extra_options[1])
    }

    pub fn option(&self, id: &str) -> Option<&LineOption> {
        self.all_options().find(|o| o.id == id)
    }

    pub fn option_mut(&mut self, id: &str) -> Option<&mut LineOption> {
        self.options
            .iter_mut()
            .chain(self.extra_options.iter_mut())
            .find(|o| o.id == id)
    }

    /// Line options followed by the extras
    pub fn all_options(&self) -> impl Iterator<Item = &LineOption> {
        self.options.iter().chain(self.extra_options.iter())
    }

    pub fn visible_options(&self) -> impl Iterator<Item = &LineOption> {
        self.options.iter().filter(|o| !o.hidden)
    }

    pub fn has_hidden(&self) -> bool {
        self.options.iter().any(|o| o.hidden)
    }

    pub fn manual_option(&self) -> &LineOption {
        &self.extra_options[0]
    }

    pub fn ignore_option(&self) -> &LineOption {
        &self.extra_options[1]
    }
}
