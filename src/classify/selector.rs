// Default selector: picks the option pre-selected for a line
use crate::classify::types::{LineOption, SelectionReason};
use crate::config::SelectionConfig;
use crate::model::{FailureAction, FailureLineContext};
use crate::patterns::PatternRegistry;

/// Score at which a suggestion is used without further checks
pub const GOOD_MATCH_SCORE: f32 = 0.75;
/// Score a suggestion must exceed to be used for an important line
pub const BAD_MATCH_SCORE: f32 = 0.25;

/// Why a line was judged ignorable or not
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Same test as the previous line, likely its signature line
    SameTestAsPrevious,
    /// Crashes and test results are never ignored
    CrashOrTestResult,
    /// Message matched an important-line pattern
    ImportantLine(String),
    /// Nothing marks the line as important
    Unremarkable,
}

impl IgnoreReason {
    pub fn ignore(&self) -> bool {
        matches!(self, Self::SameTestAsPrevious | Self::Unremarkable)
    }
}

/// Chosen default and the branch that chose it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection<'a> {
    pub option: &'a LineOption,
    pub reason: SelectionReason,
}

pub struct DefaultSelector<'a> {
    patterns: &'a PatternRegistry,
    config: &'a SelectionConfig,
}

impl<'a> DefaultSelector<'a> {
    pub fn new(patterns: &'a PatternRegistry, config: &'a SelectionConfig) -> Self {
        Self { patterns, config }
    }

    /// Pick the default among ranked `options` and the `[manual, ignore]`
    /// extras
    pub fn select<'o>(
        &self,
        options: &'o [LineOption],
        extras: &'o [LineOption; 2],
        context: &FailureLineContext,
        previous: Option<&FailureLineContext>,
    ) -> Selection<'o> {
        if let Some(first) = options.first() {
            if first.is_best && first.selectable {
                return Selection {
                    option: first,
                    reason: SelectionReason::AutoclassifierBest,
                };
            }
        }

        // Options are sorted, so the first selectable one is the best suggestion
        let candidate = options.iter().find(|o| o.selectable);

        if let Some(candidate) = candidate {
            if candidate.score_or_zero() >= self.config.good_match_score {
                return Selection {
                    option: candidate,
                    reason: SelectionReason::GoodMatch,
                };
            }
        }

        let reason = self.ignore_reason(context, previous);
        let ignore = reason.ignore();
        tracing::debug!(line = context.id.as_str(), ?reason, "ignore heuristic");

        if !ignore {
            if let Some(candidate) = candidate {
                if candidate.score_or_zero() > self.config.bad_match_score {
                    return Selection {
                        option: candidate,
                        reason: SelectionReason::AcceptableMatch,
                    };
                }
            }
        }

        let [manual, ignore_option] = extras;
        if ignore {
            Selection {
                option: ignore_option,
                reason: SelectionReason::Ignore,
            }
        } else {
            Selection {
                option: manual,
                reason: SelectionReason::Manual,
            }
        }
    }

    /// Guess whether a line without a good suggestion can be ignored
    ///
    /// A pure log line with no important markers is ignorable, as is a line
    /// about the same test as the previous one unless it reports a crash.
    /// Anything else is assumed to be a new bug.
    pub fn ignore_reason(
        &self,
        context: &FailureLineContext,
        previous: Option<&FailureLineContext>,
    ) -> IgnoreReason {
        let action = context.failure_line.as_ref().and_then(|line| line.action);
        if action == Some(FailureAction::Crash) {
            return IgnoreReason::CrashOrTestResult;
        }

        let this_test = context.test_id();
        let prev_test = previous.and_then(|p| p.test_id());

        if let (Some(this_test), Some(prev_test)) = (this_test, prev_test) {
            if this_test == prev_test {
                return IgnoreReason::SameTestAsPrevious;
            }
        }

        if context
            .failure_line
            .as_ref()
            .is_some_and(|line| line.is_crash_or_result())
        {
            return IgnoreReason::CrashOrTestResult;
        }

        match self.patterns.important_match(context.message_text()) {
            Some(name) => IgnoreReason::ImportantLine(name.to_string()),
            None => IgnoreReason::Unremarkable,
        }
    }
}
