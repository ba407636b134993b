//! Row rendering: turns a [`ResultWindow`] into grouped rows on a [`Surface`].
//!
//! Rows are created once per candidate id and cached, and so are the group
//! wrappers and headings per group key. Each render refreshes row attributes,
//! refills the wrappers and replaces the whole dynamic region of the results
//! container.

mod memory;

pub use memory::{MemorySurface, NodeId};

use crate::registry::Candidate;
use crate::window::ResultWindow;
use crate::{Error, Result};
use rz_command_types::ElementTemplate;
use std::collections::HashMap;
use tracing::{debug, error};

pub const ATTR_ROLE: &str = "role";
pub const ATTR_VALUE: &str = "data-value";
pub const ATTR_KEYWORDS: &str = "data-keywords";
pub const ATTR_GROUP: &str = "data-group";
pub const ATTR_ARIA_DISABLED: &str = "aria-disabled";
pub const ATTR_FORCE_MOUNT: &str = "data-force-mount";
pub const ATTR_ARIA_SELECTED: &str = "aria-selected";
pub const ATTR_SELECTED: &str = "data-selected";

/// The element tree a renderer writes into.
///
/// `Node` is a cheap handle; appending a node that already has a parent
/// moves it, as in the DOM.
pub trait Surface {
    type Node: Clone + std::fmt::Debug;

    /// Clone a template into a new detached element
    fn instantiate(&mut self, template: &ElementTemplate) -> Self::Node;

    fn set_text(&mut self, node: &Self::Node, text: &str);

    fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str);

    fn remove_attribute(&mut self, node: &Self::Node, name: &str);

    fn append_child(&mut self, parent: &Self::Node, child: &Self::Node);

    /// Detach every child of `node`
    fn clear_children(&mut self, node: &Self::Node);

    /// Remove the previously rendered dynamic region of the results
    /// container and append `nodes` in its place.
    fn replace_results(&mut self, nodes: &[Self::Node]);

    fn scroll_into_view(&mut self, node: &Self::Node);

    /// Post-insert hook so nested behaviors can activate on new content
    fn enhance(&mut self, _nodes: &[Self::Node]) {}
}

/// Templates a renderer clones from
#[derive(Debug, Clone, Default)]
pub struct RowTemplates {
    /// Shared row template for data items
    pub data_item: Option<ElementTemplate>,

    /// Heading cloned into each group wrapper, by group key
    pub headings: HashMap<String, ElementTemplate>,
}

/// Wrapper element of one group, with its heading once instantiated
#[derive(Debug)]
struct GroupNodes<N> {
    wrapper: N,
    heading: Option<N>,
}

/// Renders result windows into a [`Surface`], reusing rows by candidate id
/// and wrappers by group key.
#[derive(Debug)]
pub struct ListRenderer<S: Surface> {
    surface: S,
    templates: RowTemplates,
    rows: HashMap<String, S::Node>,
    groups: HashMap<Option<String>, GroupNodes<S::Node>>,
}

impl<S: Surface> ListRenderer<S> {
    #[must_use]
    pub fn new(surface: S, templates: RowTemplates) -> Self {
        Self {
            surface,
            templates,
            rows: HashMap::new(),
            groups: HashMap::new(),
        }
    }

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    #[must_use]
    pub fn templates(&self) -> &RowTemplates {
        &self.templates
    }

    pub fn set_data_template(&mut self, template: Option<ElementTemplate>) {
        self.templates.data_item = template;
    }

    pub fn set_heading(&mut self, group: impl Into<String>, template: ElementTemplate) {
        let group = group.into();
        self.forget_heading(&group);
        self.templates.headings.insert(group, template);
    }

    pub fn remove_heading(&mut self, group: &str) {
        self.forget_heading(group);
        self.templates.headings.remove(group);
    }

    /// Number of rows materialized so far
    #[must_use]
    pub fn cached_rows(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn row(&self, id: &str) -> Option<&S::Node> {
        self.rows.get(id)
    }

    /// Drop every cached row and group wrapper
    pub fn clear_cache(&mut self) {
        self.rows.clear();
        self.groups.clear();
    }

    /// Render `window` with `active` marked selected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingTemplate`] when data items are in the window but
    /// no data item template exists. Every other row is still rendered.
    pub fn render(&mut self, window: &ResultWindow, active: Option<usize>) -> Result<()> {
        let mut missing_template = false;
        let mut wrappers = Vec::new();

        for (group, members) in partition_by_group(window) {
            let wrapper = self.group_wrapper(group);

            for index in members {
                let Some(candidate) = window.get(index) else {
                    continue;
                };
                let Some(row) = self.row_for(candidate) else {
                    missing_template = true;
                    continue;
                };
                self.apply_attributes(&row, candidate, active == Some(index));
                self.surface.append_child(&wrapper, &row);
            }

            wrappers.push(wrapper);
        }

        self.surface.replace_results(&wrappers);
        self.surface.enhance(&wrappers);
        debug!(
            "Rendered {} rows in {} groups ({} cached)",
            window.len(),
            wrappers.len(),
            self.rows.len()
        );

        if missing_template {
            error!("Data items present but no data item template to render them");
            return Err(Error::MissingTemplate("data items".to_string()));
        }
        Ok(())
    }

    /// Move the selected markers from one row to another and scroll the new
    /// one into view.
    pub fn update_selection(&mut self, previous: Option<&str>, current: Option<&str>) {
        if let Some(row) = previous.and_then(|id| self.rows.get(id)) {
            self.surface.set_attribute(row, ATTR_ARIA_SELECTED, "false");
            self.surface.remove_attribute(row, ATTR_SELECTED);
        }
        if let Some(row) = current.and_then(|id| self.rows.get(id)) {
            self.surface.set_attribute(row, ATTR_ARIA_SELECTED, "true");
            self.surface.set_attribute(row, ATTR_SELECTED, "");
            self.surface.scroll_into_view(row);
        }
    }

    /// Cached wrapper for `group`, emptied and led by its heading
    fn group_wrapper(&mut self, group: Option<&str>) -> S::Node {
        let surface = &mut self.surface;
        let nodes = self
            .groups
            .entry(group.map(String::from))
            .or_insert_with(|| {
                let wrapper = surface.instantiate(&ElementTemplate::new("div"));
                surface.set_attribute(&wrapper, ATTR_ROLE, "group");
                if let Some(key) = group {
                    surface.set_attribute(&wrapper, ATTR_GROUP, key);
                }
                GroupNodes {
                    wrapper,
                    heading: None,
                }
            });

        surface.clear_children(&nodes.wrapper);
        if let Some(template) = group.and_then(|key| self.templates.headings.get(key)) {
            let heading = nodes
                .heading
                .get_or_insert_with(|| surface.instantiate(template));
            surface.append_child(&nodes.wrapper, heading);
        }
        nodes.wrapper.clone()
    }

    fn forget_heading(&mut self, group: &str) {
        if let Some(nodes) = self.groups.get_mut(&Some(group.to_string())) {
            nodes.heading = None;
        }
    }

    fn row_for(&mut self, candidate: &Candidate) -> Option<S::Node> {
        if let Some(row) = self.rows.get(&candidate.id) {
            return Some(row.clone());
        }

        let row = if candidate.is_data_item {
            let template = self.templates.data_item.as_ref()?;
            self.surface.instantiate(template)
        } else {
            match &candidate.template {
                Some(template) => self.surface.instantiate(template),
                None => self.surface.instantiate(&ElementTemplate::new("div")),
            }
        };

        let has_text = if candidate.is_data_item {
            self.templates.data_item.as_ref().is_some_and(|t| t.text.is_some())
        } else {
            candidate.template.as_ref().is_some_and(|t| t.text.is_some())
        };
        if !has_text {
            self.surface.set_text(&row, &candidate.name);
        }

        self.rows.insert(candidate.id.clone(), row.clone());
        Some(row)
    }

    fn apply_attributes(&mut self, row: &S::Node, candidate: &Candidate, selected: bool) {
        let surface = &mut self.surface;
        surface.set_attribute(row, "id", &candidate.id);
        surface.set_attribute(row, ATTR_ROLE, "option");
        surface.set_attribute(row, ATTR_VALUE, &candidate.value);

        if candidate.keywords.is_empty() {
            surface.remove_attribute(row, ATTR_KEYWORDS);
        } else {
            surface.set_attribute(row, ATTR_KEYWORDS, &candidate.keywords.join(" "));
        }

        match &candidate.group {
            Some(group) => surface.set_attribute(row, ATTR_GROUP, group),
            None => surface.remove_attribute(row, ATTR_GROUP),
        }

        surface.set_attribute(
            row,
            ATTR_ARIA_DISABLED,
            if candidate.disabled { "true" } else { "false" },
        );

        if candidate.force_mount {
            surface.set_attribute(row, ATTR_FORCE_MOUNT, "");
        } else {
            surface.remove_attribute(row, ATTR_FORCE_MOUNT);
        }

        surface.set_attribute(
            row,
            ATTR_ARIA_SELECTED,
            if selected { "true" } else { "false" },
        );
        if selected {
            surface.set_attribute(row, ATTR_SELECTED, "");
        } else {
            surface.remove_attribute(row, ATTR_SELECTED);
        }
    }
}

/// Window indices bucketed by group: the ungrouped bucket first (when
/// non-empty), then each group in order of first appearance.
fn partition_by_group(window: &ResultWindow) -> Vec<(Option<&str>, Vec<usize>)> {
    let mut ungrouped = Vec::new();
    let mut groups: Vec<(&str, Vec<usize>)> = Vec::new();

    for (index, candidate) in window.items().iter().enumerate() {
        match candidate.group.as_deref() {
            None => ungrouped.push(index),
            Some(key) => match groups.iter_mut().find(|(k, _)| *k == key) {
                Some((_, members)) => members.push(index),
                None => groups.push((key, vec![index])),
            },
        }
    }

    let mut buckets = Vec::with_capacity(groups.len() + 1);
    if !ungrouped.is_empty() {
        buckets.push((None, ungrouped));
    }
    buckets.extend(groups.into_iter().map(|(k, m)| (Some(k), m)));
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use rz_command_types::CandidateSpec;

    #[test]
    fn test_partition_ungrouped_first_then_appearance_order() {
        let mut registry = Registry::default();
        registry.register(
            [
                CandidateSpec::new("a").with_group("files"),
                CandidateSpec::new("b"),
                CandidateSpec::new("c").with_group("edit"),
                CandidateSpec::new("d").with_group("files"),
            ],
            false,
        );
        let window = ResultWindow::new(registry.as_slice().to_vec(), 4);
        let buckets = partition_by_group(&window);
        assert_eq!(
            buckets,
            vec![
                (None, vec![1]),
                (Some("files"), vec![0, 3]),
                (Some("edit"), vec![2]),
            ]
        );
    }

    #[test]
    fn test_partition_skips_empty_ungrouped() {
        let mut registry = Registry::default();
        registry.register([CandidateSpec::new("a").with_group("g")], false);
        let window = ResultWindow::new(registry.as_slice().to_vec(), 1);
        let buckets = partition_by_group(&window);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].0, Some("g"));
    }
}
