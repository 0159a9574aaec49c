//! Per-line classification session
//!
//! Wraps a [`Classification`] with the state a sheriff interacts with: the
//! edit state of the line, the currently selected option, and the payload
//! handed to the persistence layer once the line is confirmed.

use crate::classify::{Classification, Classifier, LineOption, OptionType};
use crate::error::{ClassifyError, Result};
use crate::model::FailureLineContext;
use serde::{Deserialize, Serialize};

/// Edit state of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditState {
    /// A classification has been confirmed; nothing left to choose
    Verified,
    /// Full candidate list shown, selection can change
    Editable,
    /// Only the selected option is shown
    Static,
}

/// Status shown next to a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineStatus {
    ClassificationDisabled,
    Verified,
    UnverifiedIgnore,
    UnverifiedNoBug,
    Unverified,
}

impl LineStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ClassificationDisabled => "classification-disabled",
            Self::Verified => "verified",
            Self::UnverifiedIgnore => "unverified-ignore",
            Self::UnverifiedNoBug => "unverified-no-bug",
            Self::Unverified => "unverified",
        }
    }
}

/// Current classification of a line, derived from the selected option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationInput {
    pub line_id: String,
    #[serde(rename = "type")]
    pub option_type: OptionType,
    pub classified_failure_id: Option<u64>,
    pub bug_number: Option<u64>,
}

/// Payload sent to the persistence layer to verify a line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub id: String,
    pub best_classification: Option<u64>,
    pub bug_number: Option<u64>,
}

/// Whether a line should open with the full candidate list
///
/// Confident matches and ignores start collapsed.
pub fn default_editable(option: Option<&LineOption>, good_match_score: f32) -> bool {
    option.is_some_and(|o| {
        !(o.score.is_some_and(|s| s >= good_match_score) || o.option_type == OptionType::Ignore)
    })
}

/// Classification state of one failure line
#[derive(Debug, Clone)]
pub struct LineSession {
    line_id: String,
    state: EditState,
    verified_ignore: bool,
    classification: Option<Classification>,
    selected_id: Option<String>,
}

impl LineSession {
    /// Start a session for a line
    ///
    /// Verified lines are not classified at all.
    pub fn new(
        classifier: &Classifier,
        context: &FailureLineContext,
        previous: Option<&FailureLineContext>,
    ) -> Self {
        if context.verified {
            return Self {
                line_id: context.id.clone(),
                state: EditState::Verified,
                verified_ignore: context.verified_ignore,
                classification: None,
                selected_id: None,
            };
        }

        let classification = classifier.classify(context, previous);
        let selected = classification.default_option();
        let good_match_score = classifier.selection_config().good_match_score;
        let state = if default_editable(Some(selected), good_match_score) {
            EditState::Editable
        } else {
            EditState::Static
        };

        Self {
            line_id: context.id.clone(),
            state,
            verified_ignore: false,
            selected_id: Some(selected.id.clone()),
            classification: Some(classification),
        }
    }

    pub fn line_id(&self) -> &str {
        &self.line_id
    }

    pub fn state(&self) -> EditState {
        self.state
    }

    pub fn is_verified_ignore(&self) -> bool {
        self.verified_ignore
    }

    pub fn classification(&self) -> Option<&Classification> {
        self.classification.as_ref()
    }

    pub fn selected(&self) -> Option<&LineOption> {
        let id = self.selected_id.as_deref()?;
        self.classification.as_ref()?.option(id)
    }

    /// Expand a collapsed line
    pub fn edit(&mut self) {
        if self.state == EditState::Static {
            self.state = EditState::Editable;
        }
    }

    /// Flip between collapsed and expanded; verified lines stay verified
    pub fn toggle_editable(&mut self) {
        self.state = match self.state {
            EditState::Static => EditState::Editable,
            EditState::Editable => EditState::Static,
            EditState::Verified => EditState::Verified,
        };
    }

    /// Mark the line confirmed
    pub fn verify(&mut self) {
        if let Some(option) = self.selected() {
            self.verified_ignore = option.option_type == OptionType::Ignore;
        }
        self.state = EditState::Verified;
    }

    /// Select an option by id
    pub fn select(&mut self, option_id: &str) -> Result<()> {
        let classification = self.classification_or_err()?;
        if classification.option(option_id).is_none() {
            return Err(ClassifyError::InvalidInput(format!(
                "Unknown option '{}' for line {}",
                option_id, self.line_id
            )));
        }
        self.selected_id = Some(option_id.to_string());
        Ok(())
    }

    /// Set "ignore everywhere" on the ignore option and select it
    pub fn set_ignore_always(&mut self, ignore_always: bool) -> Result<()> {
        let classification = self.classification_mut_or_err()?;
        let ignore = &mut classification.extra_options[1];
        ignore.ignore_always = ignore_always;
        let id = ignore.id.clone();
        self.selected_id = Some(id);
        Ok(())
    }

    /// Select the ignore option, or flip `ignore_always` if it already is
    pub fn ignore_shortcut(&mut self) -> Result<()> {
        let already_selected = self
            .selected()
            .is_some_and(|o| o.option_type == OptionType::Ignore);
        if already_selected {
            let current = self.selected().is_some_and(|o| o.ignore_always);
            self.set_ignore_always(!current)
        } else {
            let id = self.classification_or_err()?.ignore_option().id.clone();
            self.select(&id)
        }
    }

    /// Enter a bug number on the manual option and select it
    ///
    /// Non-digit characters are dropped; input without digits leaves the
    /// stored number unchanged.
    pub fn set_manual_bug_number(&mut self, input: &str) -> Result<()> {
        let digits: String = input.chars().filter(|c| c.is_ascii_digit()).collect();
        let classification = self.classification_mut_or_err()?;
        let manual = &mut classification.extra_options[0];

        if !digits.is_empty() {
            let number = digits.parse::<u64>().map_err(|_| {
                ClassifyError::InvalidInput(format!("Bug number out of range: {}", input))
            })?;
            manual.manual_bug_number = Some(number);
        }

        let id = manual.id.clone();
        self.selected_id = Some(id);
        Ok(())
    }

    /// Reapply user-entered option fields from an earlier session of the
    /// same line after the options were rebuilt
    pub fn carry_forward(&mut self, earlier: &LineSession) {
        let (Some(current), Some(previous)) =
            (self.classification.as_mut(), earlier.classification.as_ref())
        else {
            return;
        };

        let edited = previous
            .all_options()
            .filter(|o| o.ignore_always || o.manual_bug_number.is_some());
        for old in edited {
            if let Some(option) = current.option_mut(&old.id) {
                option.ignore_always = old.ignore_always;
                option.manual_bug_number = old.manual_bug_number;
            }
        }
    }

    /// Classification derived from the selected option
    pub fn input(&self) -> Option<ClassificationInput> {
        let selected = self.selected()?;
        let classification = self.classification.as_ref()?;

        let bug_number = match selected.option_type {
            OptionType::Manual => selected.manual_bug_number,
            OptionType::Ignore => selected.ignore_always.then_some(0),
            OptionType::ClassifiedFailure | OptionType::UnstructuredBug => selected.bug_number,
        };

        // A new bug number for a line whose top classified failure has no bug
        // updates that classified failure
        let unlinked_top = classification.options.first().filter(|top| {
            top.option_type == OptionType::ClassifiedFailure && top.bug_number.is_none()
        });
        let classified_failure_id = match (selected.option_type, unlinked_top) {
            (OptionType::Manual, Some(top)) => top.classified_failure_id,
            _ => selected.classified_failure_id,
        };

        Some(ClassificationInput {
            line_id: self.line_id.clone(),
            option_type: selected.option_type,
            classified_failure_id,
            bug_number,
        })
    }

    pub fn status(&self, can_classify: bool) -> LineStatus {
        if !can_classify {
            return LineStatus::ClassificationDisabled;
        }
        if self.state == EditState::Verified {
            return LineStatus::Verified;
        }
        match self.selected() {
            Some(o) if o.option_type == OptionType::Ignore => LineStatus::UnverifiedIgnore,
            Some(o) if o.option_type == OptionType::Manual && !has_number(o.manual_bug_number) => {
                LineStatus::UnverifiedNoBug
            }
            _ => LineStatus::Unverified,
        }
    }

    /// Whether the current selection is complete enough to save
    pub fn can_save(&self, can_classify: bool) -> bool {
        if !can_classify || self.state == EditState::Verified {
            return false;
        }
        match self.input() {
            None => false,
            Some(input) if input.option_type == OptionType::Ignore => true,
            Some(input) => has_number(input.classified_failure_id) || has_number(input.bug_number),
        }
    }

    /// Payload confirming the current selection
    pub fn verify_request(&self) -> Option<VerifyRequest> {
        let input = self.input()?;
        Some(VerifyRequest {
            id: input.line_id,
            best_classification: input.classified_failure_id.filter(|&id| id != 0),
            bug_number: input.bug_number,
        })
    }

    fn classification_or_err(&self) -> Result<&Classification> {
        self.classification
            .as_ref()
            .ok_or_else(|| verified_error(&self.line_id))
    }

    fn classification_mut_or_err(&mut self) -> Result<&mut Classification> {
        let line_id = &self.line_id;
        self.classification
            .as_mut()
            .ok_or_else(|| verified_error(line_id))
    }
}

fn verified_error(line_id: &str) -> ClassifyError {
    ClassifyError::InvalidInput(format!("Line {} is already verified", line_id))
}

fn has_number(value: Option<u64>) -> bool {
    value.is_some_and(|n| n != 0)
}

/// Sessions for all lines of a job, in log order
pub fn sessions_for_lines(
    classifier: &Classifier,
    lines: &[FailureLineContext],
) -> Vec<LineSession> {
    lines
        .iter()
        .enumerate()
        .map(|(idx, line)| {
            let previous = idx.checked_sub(1).map(|prev| &lines[prev]);
            LineSession::new(classifier, line, previous)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BugSuggestion, ClassifiedFailure, Match};

    fn classifier() -> Classifier {
        Classifier::with_defaults().unwrap()
    }

    fn good_match_line() -> FailureLineContext {
        let mut ctx = FailureLineContext::new("1", "TEST-UNEXPECTED-FAIL | a.js | boom");
        ctx.bug_suggestions.open_recent = vec![BugSuggestion {
            id: 77,
            bug_summary: "a.js | boom".to_string(),
            bug_resolution: String::new(),
        }];
        ctx
    }

    fn unlinked_best_line() -> FailureLineContext {
        let mut ctx = FailureLineContext::new("2", "TEST-UNEXPECTED-FAIL | b.js | bang");
        ctx.classified_failures = vec![ClassifiedFailure {
            id: 5,
            bug_number: None,
            bug_summary: String::new(),
            bug_resolution: String::new(),
        }];
        ctx.matches = vec![Match {
            classified_failure_id: 5,
            matcher_name: "precise".to_string(),
            score: 1.0,
        }];
        ctx.best_classification_id = Some(5);
        ctx
    }

    #[test]
    fn test_good_match_starts_static() {
        let session = LineSession::new(&classifier(), &good_match_line(), None);
        assert_eq!(session.state(), EditState::Static);
        assert_eq!(session.selected().unwrap().id, "1-ub-77");
    }

    #[test]
    fn test_manual_default_starts_editable() {
        let ctx = FailureLineContext::new("3", "TEST-UNEXPECTED-FAIL | c.js | x");
        let session = LineSession::new(&classifier(), &ctx, None);
        assert_eq!(session.selected().unwrap().option_type, OptionType::Manual);
        assert_eq!(session.state(), EditState::Editable);
        assert_eq!(session.status(true), LineStatus::UnverifiedNoBug);
    }

    #[test]
    fn test_ignore_default_starts_static() {
        let ctx = FailureLineContext::new("3", "INFO shutting down");
        let session = LineSession::new(&classifier(), &ctx, None);
        assert_eq!(session.selected().unwrap().option_type, OptionType::Ignore);
        assert_eq!(session.state(), EditState::Static);
        assert_eq!(session.status(true), LineStatus::UnverifiedIgnore);
    }

    #[test]
    fn test_verified_line_not_classified() {
        let mut ctx = good_match_line();
        ctx.verified = true;
        let mut session = LineSession::new(&classifier(), &ctx, None);

        assert_eq!(session.state(), EditState::Verified);
        assert!(session.classification().is_none());
        assert!(session.input().is_none());
        assert_eq!(session.status(true), LineStatus::Verified);
        assert!(session.select("1-manual").is_err());

        session.edit();
        assert_eq!(session.state(), EditState::Verified);
    }

    #[test]
    fn test_verify_keeps_verified_ignore() {
        let mut ctx = good_match_line();
        ctx.verified = true;
        ctx.verified_ignore = true;
        let mut session = LineSession::new(&classifier(), &ctx, None);

        session.verify();
        assert_eq!(session.state(), EditState::Verified);
        assert!(session.is_verified_ignore());
    }

    #[test]
    fn test_edit_transitions() {
        let mut session = LineSession::new(&classifier(), &good_match_line(), None);
        session.edit();
        assert_eq!(session.state(), EditState::Editable);
        session.edit();
        assert_eq!(session.state(), EditState::Editable);
        session.toggle_editable();
        assert_eq!(session.state(), EditState::Static);
        session.verify();
        assert_eq!(session.state(), EditState::Verified);
        assert!(!session.can_save(true));
    }

    #[test]
    fn test_manual_bug_number_digits_only() {
        let mut session = LineSession::new(&classifier(), &good_match_line(), None);
        session.set_manual_bug_number("bug 12a34").unwrap();

        let selected = session.selected().unwrap();
        assert_eq!(selected.option_type, OptionType::Manual);
        assert_eq!(selected.manual_bug_number, Some(1234));
        // Mutations do not change the edit state
        assert_eq!(session.state(), EditState::Static);

        session.set_manual_bug_number("none").unwrap();
        assert_eq!(session.selected().unwrap().manual_bug_number, Some(1234));

        let input = session.input().unwrap();
        assert_eq!(input.bug_number, Some(1234));
        assert!(session.can_save(true));
    }

    #[test]
    fn test_ignore_payload() {
        let mut session = LineSession::new(&classifier(), &good_match_line(), None);
        session.ignore_shortcut().unwrap();

        let input = session.input().unwrap();
        assert_eq!(input.option_type, OptionType::Ignore);
        assert_eq!(input.bug_number, None);
        assert!(session.can_save(true));

        session.ignore_shortcut().unwrap();
        assert!(session.selected().unwrap().ignore_always);
        assert_eq!(session.input().unwrap().bug_number, Some(0));

        let request = session.verify_request().unwrap();
        assert_eq!(request.best_classification, None);
        assert_eq!(request.bug_number, Some(0));
    }

    #[test]
    fn test_manual_updates_unlinked_classified_failure() {
        let mut session = LineSession::new(&classifier(), &unlinked_best_line(), None);
        // The unlinked best option is not selectable
        assert_ne!(session.selected().unwrap().id, "2-5");

        session.set_manual_bug_number("4242").unwrap();
        let input = session.input().unwrap();
        assert_eq!(input.classified_failure_id, Some(5));
        assert_eq!(input.bug_number, Some(4242));

        let request = session.verify_request().unwrap();
        assert_eq!(request.best_classification, Some(5));
    }

    #[test]
    fn test_can_save_requires_permission() {
        let session = LineSession::new(&classifier(), &good_match_line(), None);
        assert!(session.can_save(true));
        assert!(!session.can_save(false));
        assert_eq!(session.status(false), LineStatus::ClassificationDisabled);
    }

    #[test]
    fn test_manual_without_number_cannot_save() {
        let ctx = FailureLineContext::new("3", "TEST-UNEXPECTED-FAIL | c.js | x");
        let session = LineSession::new(&classifier(), &ctx, None);
        assert!(!session.can_save(true));
    }

    #[test]
    fn test_carry_forward() {
        let classifier = classifier();
        let ctx = good_match_line();

        let mut first = LineSession::new(&classifier, &ctx, None);
        first.set_manual_bug_number("99").unwrap();
        first.set_ignore_always(true).unwrap();

        let mut rebuilt = LineSession::new(&classifier, &ctx, None);
        rebuilt.carry_forward(&first);

        let classification = rebuilt.classification().unwrap();
        assert_eq!(classification.manual_option().manual_bug_number, Some(99));
        assert!(classification.ignore_option().ignore_always);
        // Selection is not carried over
        assert_eq!(rebuilt.selected().unwrap().id, "1-ub-77");
    }

    #[test]
    fn test_select_unknown_option() {
        let mut session = LineSession::new(&classifier(), &good_match_line(), None);
        assert!(session.select("1-ub-1").is_err());
        session.select("1-manual").unwrap();
        assert_eq!(session.selected().unwrap().option_type, OptionType::Manual);
    }

    #[test]
    fn test_verify_records_ignore() {
        let mut session = LineSession::new(&classifier(), &good_match_line(), None);
        session.ignore_shortcut().unwrap();
        session.verify();
        assert!(session.is_verified_ignore());
    }
}
