// Scorer: matcher confidence for classified failures, text overlap for bugs
use crate::classify::overlap::Tokenizer;
use crate::classify::types::{LineOption, OptionType};
use crate::config::ScoringConfig;
use crate::patterns::PatternRegistry;

/// Default multiplier applied to bugs that already have a resolution
pub const RESOLVED_PENALTY: f32 = 0.8;

/// Assigns a score to each line-specific option
pub struct Scorer<'a> {
    tokenizer: &'a Tokenizer,
    patterns: &'a PatternRegistry,
    config: &'a ScoringConfig,
}

impl<'a> Scorer<'a> {
    pub fn new(
        tokenizer: &'a Tokenizer,
        patterns: &'a PatternRegistry,
        config: &'a ScoringConfig,
    ) -> Self {
        Self {
            tokenizer,
            patterns,
            config,
        }
    }

    /// Score every option against the line's search text
    pub fn score_options(&self, options: &mut [LineOption], search_text: &str) {
        for option in options.iter_mut() {
            self.score_option(option, search_text);
        }
    }

    /// Score a single option; extras are left unscored
    pub fn score_option(&self, option: &mut LineOption, search_text: &str) {
        let score = match option.option_type {
            OptionType::ClassifiedFailure => Self::matcher_score(option),
            OptionType::UnstructuredBug => self.text_score(option, search_text),
            OptionType::Manual | OptionType::Ignore => return,
        };

        tracing::trace!(option = option.id.as_str(), score, "scored option");
        option.score = Some(score);
    }

    // The autoclassifier's score is opaque; a failure with no matches (or a
    // non-finite score) scores 0.
    fn matcher_score(option: &LineOption) -> f32 {
        option
            .matches
            .first()
            .map(|m| m.score)
            .filter(|score| score.is_finite())
            .unwrap_or(0.0)
    }

    fn text_score(&self, option: &LineOption, search_text: &str) -> f32 {
        let summary = option.bug_summary.as_deref().unwrap_or("");
        let summary = self.patterns.strip_intermittent(summary);
        let score = self.tokenizer.overlap(search_text, &summary);

        let resolved = option
            .bug_resolution
            .as_deref()
            .is_some_and(|r| !r.is_empty());
        if resolved {
            score * self.config.resolved_penalty
        } else {
            score
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::types::MatcherScore;
    use crate::model::{BugSuggestion, ClassifiedFailure};
    use std::sync::Arc;

    fn fixtures() -> (Tokenizer, Arc<PatternRegistry>, ScoringConfig) {
        let patterns = Arc::new(PatternRegistry::with_defaults().unwrap());
        (
            Tokenizer::new(patterns.clone()),
            patterns,
            ScoringConfig::default(),
        )
    }

    fn bug(summary: &str, resolution: &str) -> LineOption {
        LineOption::unstructured_bug(
            "L",
            &BugSuggestion {
                id: 1,
                bug_summary: summary.to_string(),
                bug_resolution: resolution.to_string(),
            },
        )
    }

    #[test]
    fn test_resolved_penalty() {
        let (tokenizer, patterns, config) = fixtures();
        let scorer = Scorer::new(&tokenizer, &patterns, &config);

        let mut options = vec![bug("a b c", ""), bug("a b c", "FIXED")];
        scorer.score_options(&mut options, "a b d");

        let open = options[0].score.unwrap();
        let resolved = options[1].score.unwrap();
        assert!(open > 0.0);
        assert_eq!(resolved, open * RESOLVED_PENALTY);
    }

    #[test]
    fn test_intermittent_prefix_stripped() {
        let (tokenizer, patterns, config) = fixtures();
        let scorer = Scorer::new(&tokenizer, &patterns, &config);

        let mut option = bug("Intermittent foo | bar", "");
        scorer.score_option(&mut option, "foo | bar");
        assert_eq!(option.score, Some(1.0));
    }

    #[test]
    fn test_classified_failure_uses_first_match() {
        let (tokenizer, patterns, config) = fixtures();
        let scorer = Scorer::new(&tokenizer, &patterns, &config);

        let cf = ClassifiedFailure {
            id: 3,
            bug_number: Some(9),
            bug_summary: "unrelated words".to_string(),
            bug_resolution: String::new(),
        };
        let matches = vec![
            MatcherScore {
                matcher: "precise".to_string(),
                score: 0.6,
            },
            MatcherScore {
                matcher: "fuzzy".to_string(),
                score: 0.95,
            },
        ];
        let mut option = LineOption::classified_failure("L", &cf, matches);
        scorer.score_option(&mut option, "something else");
        assert_eq!(option.score, Some(0.6));
    }

    #[test]
    fn test_classified_failure_without_matches_scores_zero() {
        let (tokenizer, patterns, config) = fixtures();
        let scorer = Scorer::new(&tokenizer, &patterns, &config);

        let cf = ClassifiedFailure {
            id: 3,
            bug_number: Some(9),
            bug_summary: String::new(),
            bug_resolution: String::new(),
        };
        let mut option = LineOption::classified_failure("L", &cf, vec![]);
        scorer.score_option(&mut option, "x");
        assert_eq!(option.score, Some(0.0));

        option.matches = vec![MatcherScore {
            matcher: "broken".to_string(),
            score: f32::NAN,
        }];
        scorer.score_option(&mut option, "x");
        assert_eq!(option.score, Some(0.0));
    }

    #[test]
    fn test_extras_not_scored() {
        let (tokenizer, patterns, config) = fixtures();
        let scorer = Scorer::new(&tokenizer, &patterns, &config);

        let mut option = LineOption::manual("L");
        scorer.score_option(&mut option, "x");
        assert_eq!(option.score, None);
    }

    #[test]
    fn test_empty_search_text() {
        let (tokenizer, patterns, config) = fixtures();
        let scorer = Scorer::new(&tokenizer, &patterns, &config);

        let mut option = bug("a b c", "");
        scorer.score_option(&mut option, "");
        assert_eq!(option.score, Some(0.0));
    }
}
