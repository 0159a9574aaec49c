// Ranker: orders scored options and hides unlikely ones
use crate::classify::types::LineOption;
use crate::config::RankingConfig;

/// Sorts the candidate pool and applies the visibility heuristic
pub struct Ranker<'a> {
    config: &'a RankingConfig,
}

impl<'a> Ranker<'a> {
    pub fn new(config: &'a RankingConfig) -> Self {
        Self { config }
    }

    /// Sort the pool, put the best option first and mark hidden options
    pub fn rank(&self, mut pool: Vec<LineOption>, best: Option<LineOption>) -> Vec<LineOption> {
        sort_options(&mut pool);
        if let Some(best) = best {
            pool.insert(0, best);
        }
        self.mark_hidden(&mut pool);
        pool
    }

    /// Hide options scoring below the floor, below a fraction of the top
    /// option, or beyond the visible cap. The first `min_options` entries
    /// stay visible.
    pub fn mark_hidden(&self, options: &mut [LineOption]) {
        let Some(first) = options.first() else {
            return;
        };
        let best_score = first.score_or_zero();
        let config = self.config;

        for (idx, option) in options.iter_mut().enumerate() {
            let score = option.score_or_zero();
            option.hidden = idx >= config.min_options
                && (score < config.lower_cutoff
                    || score < config.best_ratio * best_score
                    || idx >= config.max_options);
        }

        tracing::debug!(
            total = options.len(),
            hidden = options.iter().filter(|o| o.hidden).count(),
            best_score,
            "marked hidden options"
        );
    }
}

/// Stable sort, highest score first
pub fn sort_options(options: &mut [LineOption]) {
    options.sort_by(|a, b| b.score_or_zero().total_cmp(&a.score_or_zero()));
}
