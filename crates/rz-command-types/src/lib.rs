//! Shared types for the rz-command palette engine.
//!
//! This crate provides the serializable shapes used by rz-command-core and
//! rz-command-cli: candidate payloads (inline, static JSON, or remote), element
//! templates, keyboard input, and the events a palette emits to its host.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Deserialize a Vec that may be null or missing (both become empty vec)
fn deserialize_null_as_empty_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let opt: Option<Vec<T>> = Option::deserialize(deserializer)?;
    Ok(opt.unwrap_or_default())
}

/// A candidate as declared in markup, an embedded JSON payload, or a remote
/// response. Everything is optional except what makes sense to default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateSpec {
    /// Stable identifier. Generated at registration when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Value surfaced on selection/execution. Defaults to `text`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// Display and search label. Falls back to the resolved value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Visible text of an inline item
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Extra search terms
    #[serde(
        default,
        deserialize_with = "deserialize_null_as_empty_vec",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub keywords: Vec<String>,

    /// Group key for grouped rendering
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub disabled: bool,

    /// Always rendered, never scored
    #[serde(default, skip_serializing_if = "is_false")]
    pub force_mount: bool,

    /// Row template owned by an inline item
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<ElementTemplate>,
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde's skip_serializing_if passes by reference
fn is_false(value: &bool) -> bool {
    !*value
}

impl CandidateSpec {
    /// Create a spec with just a value; name and text follow from it.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_keywords<I, K>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    #[must_use]
    pub fn force_mounted(mut self) -> Self {
        self.force_mount = true;
        self
    }

    #[must_use]
    pub fn with_template(mut self, template: ElementTemplate) -> Self {
        self.template = Some(template);
        self
    }

    /// Value used on selection: explicit value, else visible text, else empty.
    #[must_use]
    pub fn resolved_value(&self) -> String {
        self.value
            .as_deref()
            .or(self.text.as_deref())
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    }

    /// Label used for display and search: explicit name, else the resolved value.
    #[must_use]
    pub fn resolved_name(&self) -> String {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => self.resolved_value(),
        }
    }
}

/// A cloneable element description: what a `<template>` holds in markup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementTemplate {
    #[serde(default = "default_tag")]
    pub tag: String,

    #[serde(default)]
    pub attributes: BTreeMap<String, String>,

    /// Static text content. Rows without it show the candidate name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

fn default_tag() -> String {
    "div".to_string()
}

impl ElementTemplate {
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            text: None,
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// When remote items are loaded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchTrigger {
    /// Once, at mount time
    #[default]
    Immediate,
    /// Lazily, on the first interaction that opens the list
    OnOpen,
}

impl FetchTrigger {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Immediate => "immediate",
            Self::OnOpen => "on-open",
        }
    }
}

impl fmt::Display for FetchTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown fetch trigger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFetchTrigger(pub String);

impl fmt::Display for UnknownFetchTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown fetch trigger: {}", self.0)
    }
}

impl std::error::Error for UnknownFetchTrigger {}

impl FromStr for FetchTrigger {
    type Err = UnknownFetchTrigger;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "immediate" => Ok(Self::Immediate),
            "on-open" | "onopen" | "on_open" => Ok(Self::OnOpen),
            other => Err(UnknownFetchTrigger(other.to_string())),
        }
    }
}

/// Keys the palette reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    ArrowDown,
    ArrowUp,
    Home,
    End,
    Enter,
}

/// Events sent from a palette to its host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandEvent {
    /// The resolved active value changed because the active row moved
    SelectionChanged { value: Option<String> },

    /// A non-disabled row was explicitly activated (click or Enter)
    Execute { value: String },
}
