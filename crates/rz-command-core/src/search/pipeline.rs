use super::score::{contains, score};
use crate::registry::{Candidate, Registry};
use crate::window::ResultWindow;
use std::sync::Arc;
use tracing::debug;

/// Per-run switches for [`FilterPipeline::run`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterOptions {
    /// When false every non-force-mounted candidate scores 1
    pub should_filter: bool,

    /// Render cap
    pub max_render: usize,

    /// Registry already holds server-filtered results; skip local scoring
    pub server_filtered: bool,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            should_filter: true,
            max_render: crate::config::DEFAULT_MAX_RENDER,
            server_filtered: false,
        }
    }
}

/// Turns the registry and a query into a [`ResultWindow`].
///
/// Keeps the previous normalized query and the candidates that contained it.
/// When the next query extends the previous one, only those candidates are
/// rescanned. Any registry mutation invalidates the cache.
#[derive(Debug, Default)]
pub struct FilterPipeline {
    last_query: String,
    last_matched: Vec<Arc<Candidate>>,
    last_generation: Option<u64>,
}

impl FilterPipeline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Trim and lowercase a raw query
    #[must_use]
    pub fn normalize(query: &str) -> String {
        query.trim().to_lowercase()
    }

    /// Forget the prefix cache
    pub fn reset(&mut self) {
        self.last_query.clear();
        self.last_matched.clear();
        self.last_generation = None;
    }

    /// Produce the window for `query`.
    pub fn run(
        &mut self,
        registry: &Registry,
        query: &str,
        options: FilterOptions,
    ) -> ResultWindow {
        let max_render = options.max_render.max(1);

        if options.server_filtered {
            let total = registry.len();
            let items: Vec<Arc<Candidate>> =
                registry.iter().take(max_render).cloned().collect();
            debug!("Server-filtered window: {} of {}", items.len(), total);
            return ResultWindow::new(items, total);
        }

        let query = Self::normalize(query);
        let use_cache = self.can_reuse(registry, &query);
        let pool: &[Arc<Candidate>] = if use_cache {
            &self.last_matched
        } else {
            registry.as_slice()
        };

        let mut forced: Vec<Arc<Candidate>> = Vec::new();
        let mut contained: Vec<Arc<Candidate>> = Vec::new();
        let mut scored: Vec<(u32, Arc<Candidate>)> = Vec::new();

        // The cache pool never holds force-mounted candidates, so they always
        // come from the registry in registration order.
        if use_cache {
            forced.extend(registry.iter().filter(|c| c.force_mount).cloned());
        }

        for candidate in pool {
            if candidate.force_mount {
                forced.push(Arc::clone(candidate));
                continue;
            }

            if !options.should_filter {
                contained.push(Arc::clone(candidate));
                scored.push((1, Arc::clone(candidate)));
                continue;
            }

            let text = candidate.search_text();
            if !contains(text, &query) {
                continue;
            }
            contained.push(Arc::clone(candidate));

            let s = score(text, &query);
            if s > 0 {
                scored.push((s, Arc::clone(candidate)));
            }
        }

        if options.should_filter && !query.is_empty() {
            scored.sort_by(|(score_a, a), (score_b, b)| {
                score_b.cmp(score_a).then_with(|| a.order().cmp(&b.order()))
            });
        }

        debug!(
            "Filter '{}': {} scored, {} forced, pool {} (cached: {})",
            query,
            scored.len(),
            forced.len(),
            pool.len(),
            use_cache
        );

        let total = scored.len() + forced.len();
        let items: Vec<Arc<Candidate>> = scored
            .into_iter()
            .map(|(_, c)| c)
            .chain(forced)
            .take(max_render)
            .collect();

        self.last_query = query;
        self.last_matched = contained;
        self.last_generation = Some(registry.generation());

        ResultWindow::new(items, total)
    }

    fn can_reuse(&self, registry: &Registry, query: &str) -> bool {
        !query.is_empty()
            && self.last_generation == Some(registry.generation())
            && query.starts_with(self.last_query.as_str())
    }
}
