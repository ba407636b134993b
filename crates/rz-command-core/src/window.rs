use crate::registry::Candidate;
use std::collections::HashMap;
use std::sync::Arc;

/// The materialized, ordered, capped slice of candidates currently shown.
///
/// The id and value maps are rebuilt on construction, so they always describe
/// exactly the items in this window.
#[derive(Debug, Clone, Default)]
pub struct ResultWindow {
    items: Vec<Arc<Candidate>>,
    total_matches: usize,
    id_index: HashMap<String, usize>,
    value_index: HashMap<String, usize>,
}

impl ResultWindow {
    /// Build a window from already ordered and capped items.
    /// `total_matches` is the uncapped count.
    #[must_use]
    pub fn new(items: Vec<Arc<Candidate>>, total_matches: usize) -> Self {
        let mut id_index = HashMap::with_capacity(items.len());
        let mut value_index = HashMap::with_capacity(items.len());

        for (i, candidate) in items.iter().enumerate() {
            id_index.insert(candidate.id.clone(), i);
            // First occurrence wins for duplicate values
            value_index.entry(candidate.value.clone()).or_insert(i);
        }

        Self {
            total_matches: total_matches.max(items.len()),
            items,
            id_index,
            value_index,
        }
    }

    #[must_use]
    pub fn items(&self) -> &[Arc<Candidate>] {
        &self.items
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Arc<Candidate>> {
        self.items.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Match count before the render cap
    #[must_use]
    pub fn total_matches(&self) -> usize {
        self.total_matches
    }

    #[must_use]
    pub fn index_of_id(&self, id: &str) -> Option<usize> {
        self.id_index.get(id).copied()
    }

    #[must_use]
    pub fn index_of_value(&self, value: &str) -> Option<usize> {
        self.value_index.get(value).copied()
    }

    /// Ids in window order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|c| c.id.as_str())
    }
}
