// Classification pipeline for a single failure line
//
// Candidates: classified failures and bug suggestions become options
// Scorer: matcher score or token overlap against the bug summary
// Ranker: stable sort, best option pinned first, unlikely options hidden
// Selector: decision tree choosing the default option

mod candidates;
mod extras;
mod overlap;
mod ranker;
mod scorer;
mod selector;
mod types;

pub use candidates::{build_candidates, matcher_lookup, CandidateSet};
pub use extras::extra_options;
pub use overlap::{overlap, Tokenizer};
pub use ranker::{sort_options, Ranker};
pub use scorer::{Scorer, RESOLVED_PENALTY};
pub use selector::{DefaultSelector, IgnoreReason, Selection, BAD_MATCH_SCORE, GOOD_MATCH_SCORE};
pub use types::{Classification, LineOption, MatcherScore, OptionType, SelectionReason};

use crate::config::{Config, ConfigValidator, RankingConfig, ScoringConfig, SelectionConfig};
use crate::error::Result;
use crate::model::FailureLineContext;
use crate::patterns::PatternRegistry;
use std::sync::Arc;

/// Runs the classification pipeline
///
/// Immutable after construction; a single classifier can be shared between
/// threads and reused for any number of lines.
#[derive(Debug, Clone)]
pub struct Classifier {
    patterns: Arc<PatternRegistry>,
    tokenizer: Tokenizer,
    scoring: ScoringConfig,
    ranking: RankingConfig,
    selection: SelectionConfig,
}

impl Classifier {
    /// Create classifier from a loaded configuration
    ///
    /// Fails if the configuration does not validate or a configured
    /// pattern does not compile.
    pub fn new(config: &Config) -> Result<Self> {
        ConfigValidator::validate(config)?;
        let patterns = Arc::new(PatternRegistry::from_config(&config.patterns)?);
        Ok(Self::from_parts(
            patterns,
            config.scoring.clone(),
            config.ranking.clone(),
            config.selection.clone(),
        ))
    }

    /// Classifier with the built-in thresholds and patterns
    pub fn with_defaults() -> Result<Self> {
        Self::new(&Config::default())
    }

    pub fn from_parts(
        patterns: Arc<PatternRegistry>,
        scoring: ScoringConfig,
        ranking: RankingConfig,
        selection: SelectionConfig,
    ) -> Self {
        Self {
            tokenizer: Tokenizer::new(patterns.clone()),
            patterns,
            scoring,
            ranking,
            selection,
        }
    }

    pub fn selection_config(&self) -> &SelectionConfig {
        &self.selection
    }

    /// Classify one line
    ///
    /// `previous` is the line immediately before this one in log order; it
    /// only feeds the ignore heuristic. The result depends on nothing but the
    /// arguments, so repeated calls yield identical classifications.
    pub fn classify(
        &self,
        context: &FailureLineContext,
        previous: Option<&FailureLineContext>,
    ) -> Classification {
        let CandidateSet { mut pool, mut best } = build_candidates(context);

        let scorer = Scorer::new(&self.tokenizer, &self.patterns, &self.scoring);
        if let Some(best) = best.as_mut() {
            scorer.score_option(best, &context.search_text);
        }
        scorer.score_options(&mut pool, &context.search_text);

        let options = Ranker::new(&self.ranking).rank(pool, best);
        let extra_options = extra_options(context);

        debug_assert!(
            options
                .iter()
                .chain(extra_options.iter())
                .filter(|o| o.is_best)
                .count()
                <= 1,
            "more than one option flagged best"
        );

        let selector = DefaultSelector::new(&self.patterns, &self.selection);
        let selection = selector.select(&options, &extra_options, context, previous);
        let default_option_id = selection.option.id.clone();
        let reason = selection.reason;

        tracing::debug!(
            line = context.id.as_str(),
            options = options.len(),
            default = default_option_id.as_str(),
            ?reason,
            "classified line"
        );

        Classification {
            line_id: context.id.clone(),
            options,
            extra_options,
            default_option_id,
            reason,
        }
    }

    /// Classify a job's lines in log order, each against its predecessor
    pub fn classify_lines(&self, lines: &[FailureLineContext]) -> Vec<Classification> {
        lines
            .iter()
            .enumerate()
            .map(|(idx, line)| {
                let previous = idx.checked_sub(1).map(|prev| &lines[prev]);
                self.classify(line, previous)
            })
            .collect()
    }
}
