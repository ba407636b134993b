//! Config validation - warns about unknown fields and attributes

use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// Keys accepted in a JSON config file
const CONFIG_KEYS: &[&str] = &[
    "loop",
    "shouldFilter",
    "selectedValue",
    "itemsUrl",
    "fetchTrigger",
    "serverFiltering",
    "maxRender",
    "debounceMs",
    "queryParam",
];

/// `data-*` attributes read from a host element
const CONFIG_ATTRIBUTES: &[&str] = &[
    "data-loop",
    "data-should-filter",
    "data-selected-value",
    "data-items-url",
    "data-fetch-trigger",
    "data-server-filtering",
    "data-max-render",
    "data-debounce",
    "data-query-param",
];

/// Validate JSON config and warn about unknown fields.
pub fn warn_unknown_fields(content: &str, config_name: &str) {
    let Ok(value) = serde_json::from_str::<Value>(content) else {
        return;
    };

    let expected: HashSet<&str> = CONFIG_KEYS.iter().copied().collect();
    for path in find_unknown_keys(&value, &expected) {
        warn!("Unknown config field in {config_name}: {path}");
    }
}

/// Warn about `data-*` attributes on the host that no option reads.
/// Non-data attributes (class, id, aria-*) belong to the host and are ignored.
pub fn warn_unknown_attributes(attributes: &HashMap<String, String>) {
    let mut unknown: Vec<&str> = attributes
        .keys()
        .map(String::as_str)
        .filter(|name| name.starts_with("data-") && !CONFIG_ATTRIBUTES.contains(name))
        .collect();
    unknown.sort_unstable();

    for name in unknown {
        warn!("Unknown command attribute: {name}");
    }
}

/// Top-level keys of `value` missing from `expected`, sorted for stable output.
fn find_unknown_keys(value: &Value, expected: &HashSet<&str>) -> Vec<String> {
    let Value::Object(obj) = value else {
        return Vec::new();
    };

    let mut unknowns: Vec<String> = obj
        .keys()
        .filter(|key| !expected.contains(key.as_str()))
        .cloned()
        .collect();
    unknowns.sort();
    unknowns
}
