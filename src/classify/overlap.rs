// Token overlap between a failure line and a bug summary
use ahash::{HashMap, HashMapExt};
use std::sync::{Arc, LazyLock};

use crate::patterns::PatternRegistry;

static DEFAULT_TOKENIZER: LazyLock<Tokenizer> = LazyLock::new(|| {
    let patterns = PatternRegistry::with_defaults().expect("default patterns are valid");
    Tokenizer::new(Arc::new(patterns))
});

/// Overlap of two strings using the default patterns
///
/// Symmetric Dice coefficient over token multisets, in `[0, 1]`.
pub fn overlap(a: &str, b: &str) -> f32 {
    DEFAULT_TOKENIZER.overlap(a, b)
}

/// Splits free text into tokens after collapsing path prefixes
#[derive(Debug, Clone)]
pub struct Tokenizer {
    patterns: Arc<PatternRegistry>,
}

impl Tokenizer {
    pub fn new(patterns: Arc<PatternRegistry>) -> Self {
        Self { patterns }
    }

    /// Tokens in order of appearance, empty tokens dropped
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let collapsed = self.patterns.collapse_paths(text);
        self.patterns
            .token_separator
            .split(&collapsed)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// `2 * |A ∩ B| / (|A| + |B|)` where the intersection counts repeated
    /// tokens up to the smaller multiplicity
    pub fn overlap(&self, a: &str, b: &str) -> f32 {
        let left = self.tokenize(a);
        let right = self.tokenize(b);

        if left.is_empty() || right.is_empty() {
            return 0.0;
        }

        let left_counts = token_counts(&left);
        let right_counts = token_counts(&right);

        let shared: u32 = left_counts
            .iter()
            .map(|(token, &count)| count.min(*right_counts.get(token).unwrap_or(&0)))
            .sum();

        (2 * shared) as f32 / (left.len() + right.len()) as f32
    }
}

fn token_counts(tokens: &[String]) -> HashMap<&str, u32> {
    let mut counts = HashMap::with_capacity(tokens.len());
    for token in tokens {
        *counts.entry(token.as_str()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_strings() {
        assert_eq!(overlap("foo bar", "foo bar"), 1.0);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(overlap("", "x"), 0.0);
        assert_eq!(overlap("x", ""), 0.0);
        assert_eq!(overlap("", ""), 0.0);
        // Separators only
        assert_eq!(overlap(" | , /", "x"), 0.0);
    }

    #[test]
    fn test_symmetric() {
        let pairs = [
            ("a b c", "b c d e"),
            ("TEST-UNEXPECTED-FAIL | dom/a.html | x", "a.html | x y"),
            ("a a a b", "a b b"),
        ];
        for (a, b) in pairs {
            assert_eq!(overlap(a, b), overlap(b, a));
        }
    }

    #[test]
    fn test_multiset_counts() {
        // shared = min(3,1) + min(1,2) = 2 -> 4 / 7
        let score = overlap("a a a b", "a b b");
        assert!((score - 4.0 / 7.0).abs() < 1e-6);
    }

    #[test]
    fn test_case_sensitive() {
        assert_eq!(overlap("Foo", "foo"), 0.0);
    }

    #[test]
    fn test_path_noise_collapsed() {
        assert_eq!(overlap("dir/sub/file.js | b", "file.js | b"), 1.0);
    }

    #[test]
    fn test_separators() {
        let tokenizer = Tokenizer::new(Arc::new(PatternRegistry::with_defaults().unwrap()));
        assert_eq!(
            tokenizer.tokenize("a,b|c  d/e"),
            vec!["a", "b", "c", "d", "e"]
        );
    }

    #[test]
    fn test_bounds() {
        let inputs = ["", "x", "x x", "a/b c", "| |", "a b c d e f"];
        for a in inputs {
            for b in inputs {
                let score = overlap(a, b);
                assert!((0.0..=1.0).contains(&score), "{a:?} {b:?} -> {score}");
            }
        }
    }
}
