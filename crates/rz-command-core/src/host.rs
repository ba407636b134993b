//! The host element a palette mounts onto, and the sub-elements that attach
//! to a palette through an explicit parent handle.

use crate::config::CommandConfig;
use crate::palette::CommandPalette;
use crate::render::Surface;
use crate::source::ItemSource;
use crate::{Error, Result};
use rz_command_types::{CandidateSpec, ElementTemplate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{error, warn};

/// Everything a palette reads from its host at mount time
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostElement {
    /// Configuration attributes (`data-loop`, `data-items-url`, ...)
    #[serde(default)]
    pub attributes: HashMap<String, String>,

    /// Inline items declared in markup
    #[serde(default)]
    pub items: Vec<CandidateSpec>,

    /// Shared row template for data items
    #[serde(default)]
    pub data_template: Option<ElementTemplate>,

    /// Group heading templates by group key
    #[serde(default)]
    pub headings: HashMap<String, ElementTemplate>,

    /// Raw embedded JSON payload of static items
    #[serde(default)]
    pub static_items: Option<String>,
}

impl HostElement {
    /// Load a host description from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Configuration derived from the host attributes
    #[must_use]
    pub fn config(&self) -> CommandConfig {
        CommandConfig::from_attributes(&self.attributes)
    }

    /// Parse the static payload. Malformed JSON is logged and yields nothing,
    /// and every item gets a generated id.
    #[must_use]
    pub fn parse_static_items(&self) -> Vec<CandidateSpec> {
        let Some(raw) = self.static_items.as_deref().filter(|r| !r.trim().is_empty()) else {
            return Vec::new();
        };

        match serde_json::from_str::<Vec<CandidateSpec>>(raw) {
            Ok(items) => items
                .into_iter()
                .map(|mut item| {
                    item.id = None;
                    item
                })
                .collect(),
            Err(e) => {
                warn!("Ignoring malformed static items payload: {}", e);
                Vec::new()
            }
        }
    }
}

/// An inline item declared inside a palette
#[derive(Debug, Clone)]
pub struct InlineItem {
    spec: CandidateSpec,
}

impl InlineItem {
    #[must_use]
    pub fn new(spec: CandidateSpec) -> Self {
        Self { spec }
    }

    /// Register with `parent`. Returns the item's id, or `None` when an item
    /// with the same id is already registered and this one was dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingParent`] when there is no parent palette,
    /// without touching any palette state.
    pub fn attach<V, S>(
        self,
        parent: Option<&mut CommandPalette<V, S>>,
    ) -> Result<Option<String>>
    where
        V: Surface,
        S: ItemSource,
    {
        let Some(palette) = parent else {
            error!("command item must be used within a command palette");
            return Err(Error::MissingParent("command item"));
        };
        Ok(palette.register_one(self.spec))
    }

    /// Remove a previously attached item.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingParent`] when there is no parent palette.
    pub fn detach<V, S>(id: &str, parent: Option<&mut CommandPalette<V, S>>) -> Result<bool>
    where
        V: Surface,
        S: ItemSource,
    {
        let Some(palette) = parent else {
            error!("command item must be used within a command palette");
            return Err(Error::MissingParent("command item"));
        };
        Ok(palette.unregister(id))
    }
}

/// A heading rendered at the top of one group
#[derive(Debug, Clone)]
pub struct GroupHeading {
    pub group: String,
    pub template: ElementTemplate,
}

impl GroupHeading {
    #[must_use]
    pub fn new(group: impl Into<String>, template: ElementTemplate) -> Self {
        Self {
            group: group.into(),
            template,
        }
    }

    /// Register the heading with `parent` and re-render.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingParent`] when there is no parent palette.
    pub fn attach<V, S>(self, parent: Option<&mut CommandPalette<V, S>>) -> Result<()>
    where
        V: Surface,
        S: ItemSource,
    {
        let Some(palette) = parent else {
            error!("command group must be used within a command palette");
            return Err(Error::MissingParent("command group"));
        };
        palette.set_heading(self.group, self.template);
        Ok(())
    }
}
