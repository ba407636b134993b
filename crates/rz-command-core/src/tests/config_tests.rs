//! Tests for config loading

use crate::Result;
use crate::config::{CommandConfig, DEFAULT_DEBOUNCE_MS, DEFAULT_MAX_RENDER, DEFAULT_QUERY_PARAM};
use rz_command_types::FetchTrigger;
use std::collections::HashMap;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_defaults() {
    let config = CommandConfig::default();
    assert!(!config.loop_navigation);
    assert!(config.should_filter);
    assert!(config.selected_value.is_none());
    assert!(config.items_url.is_none());
    assert_eq!(config.fetch_trigger, FetchTrigger::Immediate);
    assert!(!config.server_filtering);
    assert_eq!(config.max_render, DEFAULT_MAX_RENDER);
    assert_eq!(config.debounce_ms, DEFAULT_DEBOUNCE_MS);
    assert_eq!(config.query_param, DEFAULT_QUERY_PARAM);
}

#[test]
fn test_load_missing_file_uses_defaults() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let config = CommandConfig::load(&temp_dir.path().join("missing.json"))?;
    assert_eq!(config, CommandConfig::default());
    Ok(())
}

#[test]
fn test_load_partial_config() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("palette.json");
    fs::write(
        &config_path,
        r#"{
            "loop": true,
            "itemsUrl": "https://example.com/commands",
            "fetchTrigger": "on-open",
            "maxRender": 20
        }"#,
    )
    .unwrap();

    let config = CommandConfig::load(&config_path)?;
    assert!(config.loop_navigation);
    assert_eq!(config.items_url.as_deref(), Some("https://example.com/commands"));
    assert_eq!(config.fetch_trigger, FetchTrigger::OnOpen);
    assert_eq!(config.max_render, 20);
    assert!(config.should_filter);
    assert_eq!(config.debounce_ms, DEFAULT_DEBOUNCE_MS);
    Ok(())
}

#[test]
fn test_load_zero_max_render_falls_back() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("palette.json");
    fs::write(&config_path, r#"{"maxRender": 0}"#).unwrap();

    let config = CommandConfig::load(&config_path)?;
    assert_eq!(config.max_render, DEFAULT_MAX_RENDER);
    Ok(())
}

#[test]
fn test_load_ignores_unknown_fields() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("palette.json");
    fs::write(&config_path, r#"{"serverFiltering": true, "colour": "blue"}"#).unwrap();

    let config = CommandConfig::load(&config_path)?;
    assert!(config.server_filtering);
    Ok(())
}

#[test]
fn test_load_invalid_json_errors() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("palette.json");
    fs::write(&config_path, "{ not json").unwrap();

    let err = CommandConfig::load(&config_path).unwrap_err();
    assert!(matches!(err, crate::Error::Json(_)));
}

#[test]
fn test_load_unknown_trigger_errors() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("palette.json");
    fs::write(&config_path, r#"{"fetchTrigger": "later"}"#).unwrap();

    assert!(CommandConfig::load(&config_path).is_err());
}

#[test]
fn test_from_attributes_reads_every_option() {
    let attributes: HashMap<String, String> = [
        ("data-loop", "true"),
        ("data-should-filter", "false"),
        ("data-selected-value", "copy"),
        ("data-items-url", " /api/commands "),
        ("data-fetch-trigger", "on-open"),
        ("data-server-filtering", ""),
        ("data-max-render", "15"),
        ("data-debounce", "120"),
        ("data-query-param", "search"),
        ("class", "palette"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    let config = CommandConfig::from_attributes(&attributes);
    assert!(config.loop_navigation);
    assert!(!config.should_filter);
    assert_eq!(config.selected_value.as_deref(), Some("copy"));
    assert_eq!(config.items_url.as_deref(), Some("/api/commands"));
    assert_eq!(config.fetch_trigger, FetchTrigger::OnOpen);
    assert!(config.server_filtering);
    assert_eq!(config.max_render, 15);
    assert_eq!(config.debounce_ms, 120);
    assert_eq!(config.query_param, "search");
}

#[test]
fn test_from_attributes_bad_values_fall_back() {
    let attributes: HashMap<String, String> = [
        ("data-fetch-trigger", "eventually"),
        ("data-max-render", "-3"),
        ("data-unknown", "x"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    let config = CommandConfig::from_attributes(&attributes);
    assert_eq!(config.fetch_trigger, FetchTrigger::Immediate);
    assert_eq!(config.max_render, DEFAULT_MAX_RENDER);
}

#[test]
fn test_config_round_trips_through_json() {
    let config = CommandConfig {
        loop_navigation: true,
        items_url: Some("http://localhost/items".to_string()),
        ..Default::default()
    };
    let json = serde_json::to_string(&config).unwrap();
    assert!(json.contains(r#""loop":true"#));
    let parsed: CommandConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, config);
}
