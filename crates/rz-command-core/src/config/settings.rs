use crate::Result;
use rz_command_types::FetchTrigger;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Render cap applied when `maxRender` is missing or invalid
pub const DEFAULT_MAX_RENDER: usize = 100;

/// Delay between the last keystroke and a server-filtering fetch
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Query string parameter carrying the search text to the items endpoint
pub const DEFAULT_QUERY_PARAM: &str = "q";

/// Palette configuration, read once at mount time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandConfig {
    /// Wrap around at either end during keyboard traversal
    #[serde(default, rename = "loop")]
    pub loop_navigation: bool,

    /// When false every query matches every candidate
    #[serde(default = "default_true")]
    pub should_filter: bool,

    /// Initially active value
    #[serde(default)]
    pub selected_value: Option<String>,

    /// Remote candidate endpoint
    #[serde(default)]
    pub items_url: Option<String>,

    #[serde(default)]
    pub fetch_trigger: FetchTrigger,

    /// Delegate matching to the remote endpoint
    #[serde(default)]
    pub server_filtering: bool,

    #[serde(default = "default_max_render")]
    pub max_render: usize,

    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default = "default_query_param")]
    pub query_param: String,
}

fn default_true() -> bool {
    true
}

fn default_max_render() -> usize {
    DEFAULT_MAX_RENDER
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

fn default_query_param() -> String {
    DEFAULT_QUERY_PARAM.to_string()
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            loop_navigation: false,
            should_filter: true,
            selected_value: None,
            items_url: None,
            fetch_trigger: FetchTrigger::default(),
            server_filtering: false,
            max_render: DEFAULT_MAX_RENDER,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            query_param: default_query_param(),
        }
    }
}

impl CommandConfig {
    /// Load config from a JSON file. A missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid JSON.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        super::warn_unknown_fields(&content, &path.display().to_string());

        let mut config: Self = serde_json::from_str(&content)?;
        config.max_render = sanitize_max_render(config.max_render);
        Ok(config)
    }

    /// Build config from host element attributes (`data-loop`, `data-max-render`, ...).
    /// Bad values fall back to defaults with a warning; this never fails.
    #[must_use]
    pub fn from_attributes(attributes: &HashMap<String, String>) -> Self {
        super::warn_unknown_attributes(attributes);

        let defaults = Self::default();
        let get = |name: &str| attributes.get(name).map(String::as_str);

        let fetch_trigger = match get("data-fetch-trigger") {
            None => defaults.fetch_trigger,
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                warn!("{e}, falling back to {}", defaults.fetch_trigger);
                defaults.fetch_trigger
            }),
        };

        let max_render = match get("data-max-render") {
            None => defaults.max_render,
            Some(raw) => parse_max_render(raw),
        };

        let debounce_ms = match get("data-debounce") {
            None => defaults.debounce_ms,
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warn!("Invalid data-debounce '{raw}', using {DEFAULT_DEBOUNCE_MS}ms");
                DEFAULT_DEBOUNCE_MS
            }),
        };

        Self {
            loop_navigation: parse_bool(get("data-loop"), defaults.loop_navigation),
            should_filter: parse_bool(get("data-should-filter"), defaults.should_filter),
            selected_value: get("data-selected-value")
                .filter(|v| !v.is_empty())
                .map(String::from),
            items_url: get("data-items-url")
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from),
            fetch_trigger,
            server_filtering: parse_bool(get("data-server-filtering"), defaults.server_filtering),
            max_render,
            debounce_ms,
            query_param: get("data-query-param")
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map_or(defaults.query_param, String::from),
        }
    }
}

/// A present attribute with no value counts as true, like HTML boolean attributes.
fn parse_bool(raw: Option<&str>, default: bool) -> bool {
    match raw.map(|v| v.trim().to_ascii_lowercase()) {
        None => default,
        Some(v) if v.is_empty() || v == "true" => true,
        Some(v) if v == "false" => false,
        Some(v) => {
            warn!("Invalid boolean attribute value '{v}', using {default}");
            default
        }
    }
}

fn parse_max_render(raw: &str) -> usize {
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => n,
        _ => {
            warn!("Invalid data-max-render '{raw}', using {DEFAULT_MAX_RENDER}");
            DEFAULT_MAX_RENDER
        }
    }
}

fn sanitize_max_render(value: usize) -> usize {
    if value == 0 {
        warn!("maxRender must be positive, using {DEFAULT_MAX_RENDER}");
        DEFAULT_MAX_RENDER
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_parse_bool_presence_is_true() {
        assert!(parse_bool(Some(""), false));
        assert!(parse_bool(Some("TRUE"), false));
        assert!(!parse_bool(Some("false"), true));
        assert!(parse_bool(None, true));
        assert!(!parse_bool(Some("maybe"), false));
    }

    #[test]
    fn test_parse_max_render_fallbacks() {
        assert_eq!(parse_max_render("25"), 25);
        assert_eq!(parse_max_render("0"), DEFAULT_MAX_RENDER);
        assert_eq!(parse_max_render("-4"), DEFAULT_MAX_RENDER);
        assert_eq!(parse_max_render("many"), DEFAULT_MAX_RENDER);
    }

    #[test]
    fn test_from_attributes_debounce() {
        let config = CommandConfig::from_attributes(&attrs(&[("data-debounce", "50")]));
        assert_eq!(config.debounce_ms, 50);

        let config = CommandConfig::from_attributes(&attrs(&[("data-debounce", "soon")]));
        assert_eq!(config.debounce_ms, DEFAULT_DEBOUNCE_MS);
    }

    #[test]
    fn test_from_attributes_blank_url_is_none() {
        let config = CommandConfig::from_attributes(&attrs(&[("data-items-url", "  ")]));
        assert!(config.items_url.is_none());
    }
}
