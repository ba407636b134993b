use rz_command_types::{CandidateSpec, ElementTemplate};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// A registered, normalized candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Unique identifier
    pub id: String,

    /// Value surfaced on selection/execution
    pub value: String,

    /// Display and search label
    pub name: String,

    /// Extra search terms
    pub keywords: Vec<String>,

    /// Group key, `None` for the ungrouped bucket
    pub group: Option<String>,

    /// Skipped by keyboard navigation, still listed
    pub disabled: bool,

    /// Always in the window, never scored
    pub force_mount: bool,

    /// Sourced from a remote fetch or the static JSON payload
    pub is_data_item: bool,

    /// Row template of an inline item
    pub template: Option<ElementTemplate>,

    order: u64,
    search_text: String,
}

impl Candidate {
    /// Insertion sequence number, the sort tie-break
    #[must_use]
    pub fn order(&self) -> u64 {
        self.order
    }

    /// Lowercased name plus keywords, computed once at registration
    #[must_use]
    pub fn search_text(&self) -> &str {
        &self.search_text
    }
}

/// Lowercased `name` followed by the space-joined keywords
fn build_search_text(name: &str, keywords: &[String]) -> String {
    let mut text = name.to_lowercase();
    for keyword in keywords {
        text.push(' ');
        text.push_str(&keyword.to_lowercase());
    }
    text
}

/// The live set of candidates, kept in registration order.
///
/// Ids are unique: registering an id that already exists is silently dropped,
/// so the first registration wins.
#[derive(Debug)]
pub struct Registry {
    items: Vec<Arc<Candidate>>,
    ids: HashSet<String>,
    next_order: u64,
    next_auto_id: u64,
    id_prefix: String,

    /// Bumped on every mutation so derived caches can tell they are stale
    generation: u64,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new("rz-command")
    }
}

impl Registry {
    /// Create an empty registry. Generated ids look like `{prefix}-item-{n}`.
    #[must_use]
    pub fn new(id_prefix: impl Into<String>) -> Self {
        Self {
            items: Vec::new(),
            ids: HashSet::new(),
            next_order: 0,
            next_auto_id: 0,
            id_prefix: id_prefix.into(),
            generation: 0,
        }
    }

    /// Register candidates, returning how many were actually added.
    pub fn register<I>(&mut self, specs: I, is_data_item: bool) -> usize
    where
        I: IntoIterator<Item = CandidateSpec>,
    {
        let added = specs
            .into_iter()
            .filter_map(|spec| self.insert(spec, is_data_item))
            .count();

        if added > 0 {
            self.generation += 1;
        }
        added
    }

    /// Register a single candidate, returning its id when it was added.
    pub fn register_one(&mut self, spec: CandidateSpec, is_data_item: bool) -> Option<String> {
        let id = self.insert(spec, is_data_item)?;
        self.generation += 1;
        Some(id)
    }

    fn insert(&mut self, spec: CandidateSpec, is_data_item: bool) -> Option<String> {
        let id = match spec.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => self.generate_id(),
        };

        if self.ids.contains(&id) {
            debug!("Skipping duplicate candidate id {}", id);
            return None;
        }

        let value = spec.resolved_value();
        let name = spec.resolved_name();
        let keywords: Vec<String> = spec
            .keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(String::from)
            .collect();
        let search_text = build_search_text(&name, &keywords);

        let candidate = Candidate {
            id: id.clone(),
            value,
            name,
            keywords,
            group: spec.group.filter(|g| !g.trim().is_empty()),
            disabled: spec.disabled,
            force_mount: spec.force_mount,
            is_data_item,
            template: spec.template,
            order: self.next_order,
            search_text,
        };

        self.next_order += 1;
        self.ids.insert(id.clone());
        self.items.push(Arc::new(candidate));
        Some(id)
    }

    /// Remove a candidate by id. Returns whether it was present.
    pub fn unregister(&mut self, id: &str) -> bool {
        if !self.ids.remove(id) {
            return false;
        }
        self.items.retain(|c| c.id != id);
        self.generation += 1;
        true
    }

    /// Drop every data item, keeping inline candidates. Returns how many were removed.
    pub fn remove_data_items(&mut self) -> usize {
        let before = self.items.len();
        let ids = &mut self.ids;
        self.items.retain(|c| {
            if c.is_data_item {
                ids.remove(&c.id);
                false
            } else {
                true
            }
        });

        let removed = before - self.items.len();
        if removed > 0 {
            self.generation += 1;
        }
        removed
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Arc<Candidate>> {
        if !self.ids.contains(id) {
            return None;
        }
        self.items.iter().find(|c| c.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Candidates in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Candidate>> {
        self.items.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Arc<Candidate>] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn has_data_items(&self) -> bool {
        self.items.iter().any(|c| c.is_data_item)
    }

    /// Mutation counter; changes whenever the candidate set changes
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn generate_id(&mut self) -> String {
        loop {
            let id = format!("{}-item-{}", self.id_prefix, self.next_auto_id);
            self.next_auto_id += 1;
            if !self.ids.contains(&id) {
                return id;
            }
        }
    }
}
