// Candidate builder: turns raw line data into unscored options
use ahash::{HashMap, HashMapExt, HashSet};

use crate::classify::types::{LineOption, MatcherScore};
use crate::model::{FailureLineContext, Match};

/// Unscored candidates for one line
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    /// Classified failures followed by bug suggestions
    pub pool: Vec<LineOption>,
    /// Autoclassifier pick, kept out of the pool so it is never resorted
    pub best: Option<LineOption>,
}

/// Group matcher scores by classified failure id, preserving input order
pub fn matcher_lookup(matches: &[Match]) -> HashMap<u64, Vec<MatcherScore>> {
    let mut by_failure: HashMap<u64, Vec<MatcherScore>> = HashMap::new();
    for m in matches {
        by_failure
            .entry(m.classified_failure_id)
            .or_default()
            .push(MatcherScore {
                matcher: m.matcher_name.clone(),
                score: m.score,
            });
    }
    by_failure
}

/// Build the candidate pool for a line
///
/// Classified failures explicitly marked with bug number 0 are skipped, and
/// bug suggestions already covered by a classified failure are dropped. When
/// the autoclassifier does not recommend ignoring the line, its best
/// classification is pulled out of the pool and flagged `is_best`.
pub fn build_candidates(context: &FailureLineContext) -> CandidateSet {
    let line_id = context.id.as_str();
    let lookup = matcher_lookup(&context.matches);

    let known: HashSet<u64> = context.classified_failures.iter().map(|cf| cf.id).collect();
    for m in context
        .matches
        .iter()
        .filter(|m| !known.contains(&m.classified_failure_id))
    {
        tracing::warn!(
            line = line_id,
            classified_failure = m.classified_failure_id,
            matcher = m.matcher_name.as_str(),
            "match references a classified failure missing from the line"
        );
    }

    let mut classified: Vec<LineOption> = context
        .classified_failures
        .iter()
        .filter(|cf| cf.bug_number != Some(0))
        .map(|cf| {
            let matches = lookup.get(&cf.id).cloned().unwrap_or_default();
            LineOption::classified_failure(line_id, cf, matches)
        })
        .collect();

    // Bugs already offered, so each option id appears once
    let mut seen_bugs: HashSet<u64> = classified.iter().filter_map(|o| o.bug_number).collect();

    let suggestions: Vec<LineOption> = context
        .bug_suggestions
        .flattened()
        .filter(|bug| seen_bugs.insert(bug.id))
        .map(|bug| LineOption::unstructured_bug(line_id, bug))
        .collect();

    let mut best = None;
    if !context.best_is_ignore() {
        if let Some(best_id) = context.best_classification_id {
            if let Some(index) = classified
                .iter()
                .position(|o| o.classified_failure_id == Some(best_id))
            {
                let mut option = classified.remove(index);
                option.is_best = true;
                best = Some(option);
            }
        }
    }

    tracing::debug!(
        line = line_id,
        classified = classified.len(),
        suggestions = suggestions.len(),
        has_best = best.is_some(),
        "built candidates"
    );

    classified.extend(suggestions);
    CandidateSet {
        pool: classified,
        best,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::types::OptionType;
    use crate::model::{
        BestClassification, BugSuggestion, BugSuggestions, ClassifiedFailure, LineMetadata,
    };

    fn cf(id: u64, bug_number: Option<u64>) -> ClassifiedFailure {
        ClassifiedFailure {
            id,
            bug_number,
            bug_summary: format!("cf {}", id),
            bug_resolution: String::new(),
        }
    }

    fn bug(id: u64) -> BugSuggestion {
        BugSuggestion {
            id,
            bug_summary: format!("bug {}", id),
            bug_resolution: String::new(),
        }
    }

    fn context() -> FailureLineContext {
        let mut ctx = FailureLineContext::new("L", "search");
        ctx.classified_failures = vec![cf(1, Some(100)), cf(2, Some(0)), cf(3, None)];
        ctx.matches = vec![
            Match {
                classified_failure_id: 1,
                matcher_name: "precise".to_string(),
                score: 0.9,
            },
            Match {
                classified_failure_id: 1,
                matcher_name: "fuzzy".to_string(),
                score: 0.4,
            },
        ];
        ctx.bug_suggestions = BugSuggestions {
            open_recent: vec![bug(100), bug(200)],
            all_others: vec![bug(300)],
        };
        ctx
    }

    #[test]
    fn test_pool_order_and_filtering() {
        let set = build_candidates(&context());
        let ids: Vec<&str> = set.pool.iter().map(|o| o.id.as_str()).collect();

        // cf 2 has bug number 0, bug 100 is covered by cf 1
        assert_eq!(ids, vec!["L-1", "L-3", "L-ub-200", "L-ub-300"]);
        assert!(set.best.is_none());
    }

    #[test]
    fn test_suggestion_in_both_lists_listed_once() {
        let mut ctx = FailureLineContext::new("L", "search");
        ctx.bug_suggestions = BugSuggestions {
            open_recent: vec![bug(7)],
            all_others: vec![bug(8), bug(7)],
        };

        let set = build_candidates(&ctx);
        let ids: Vec<&str> = set.pool.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["L-ub-7", "L-ub-8"]);
    }

    #[test]
    fn test_matches_attached_in_order() {
        let set = build_candidates(&context());
        let matchers: Vec<&str> = set.pool[0]
            .matches
            .iter()
            .map(|m| m.matcher.as_str())
            .collect();
        assert_eq!(matchers, vec!["precise", "fuzzy"]);
        // No matches for cf 3
        assert!(set.pool[1].matches.is_empty());
    }

    #[test]
    fn test_dangling_match_ignored() {
        let mut ctx = context();
        ctx.matches.push(Match {
            classified_failure_id: 999,
            matcher_name: "precise".to_string(),
            score: 1.0,
        });
        let set = build_candidates(&ctx);
        assert_eq!(set.pool.len(), 4);
    }

    #[test]
    fn test_best_extracted() {
        let mut ctx = context();
        ctx.best_classification_id = Some(3);
        let set = build_candidates(&ctx);

        let best = set.best.unwrap();
        assert_eq!(best.id, "L-3");
        assert!(best.is_best);
        assert!(set.pool.iter().all(|o| o.id != "L-3" && !o.is_best));
    }

    #[test]
    fn test_best_not_extracted_when_ignore_is_best() {
        let mut ctx = context();
        ctx.best_classification_id = Some(1);
        ctx.metadata = Some(LineMetadata {
            best_classification: Some(BestClassification {
                id: Some(2),
                bug_number: Some(0),
            }),
        });
        let set = build_candidates(&ctx);
        assert!(set.best.is_none());
        assert_eq!(set.pool[0].option_type, OptionType::ClassifiedFailure);
    }

    #[test]
    fn test_best_for_unknown_id() {
        let mut ctx = context();
        ctx.best_classification_id = Some(2);
        // cf 2 was filtered out, so there is nothing to extract
        assert!(build_candidates(&ctx).best.is_none());
    }
}
