//! End-to-end palette behavior without a remote source

use super::fixtures::{TestPalette, drain_events, host, item, palette, window_ids};
use crate::config::CommandConfig;
use crate::render::{ATTR_ARIA_SELECTED, MemorySurface};
use crate::{CommandPalette, Error, GroupHeading, HostElement, InlineItem};
use rz_command_types::{CandidateSpec, CommandEvent, ElementTemplate, Key};

fn three() -> Vec<CandidateSpec> {
    vec![item("A"), item("B"), item("C")]
}

fn selected(value: &str) -> CommandEvent {
    CommandEvent::SelectionChanged {
        value: Some(value.to_string()),
    }
}

fn executed(value: &str) -> CommandEvent {
    CommandEvent::Execute {
        value: value.to_string(),
    }
}

#[test]
fn test_three_inline_items_empty_query() {
    let (palette, mut rx) = palette(CommandConfig::default(), three());

    assert_eq!(window_ids(&palette), vec!["A", "B", "C"]);
    assert_eq!(palette.total_matches(), 3);
    assert_eq!(palette.active_index(), Some(0));
    assert_eq!(palette.active_value(), Some("A"));
    assert!(palette.is_open());
    assert!(palette.error().is_none());
    assert_eq!(drain_events(&mut rx), vec![selected("A")]);
    assert_eq!(palette.surface().rendered_ids(), vec!["A", "B", "C"]);
}

#[test]
fn test_query_filters_and_reselects() {
    let (mut palette, mut rx) = palette(
        CommandConfig::default(),
        vec![item("Copy"), item("Paste"), item("Cut")],
    );
    drain_events(&mut rx);

    palette.set_query("c");
    // "Copy" and "Cut" start with c, "Paste" does not contain it
    assert_eq!(window_ids(&palette), vec!["Copy", "Cut"]);
    assert_eq!(palette.active_value(), Some("Copy"));
    assert!(drain_events(&mut rx).is_empty());

    palette.set_query("cu");
    assert_eq!(window_ids(&palette), vec!["Cut"]);
    assert_eq!(palette.active_index(), Some(0));
    assert_eq!(drain_events(&mut rx), vec![selected("Cut")]);

    palette.set_query("");
    assert_eq!(window_ids(&palette), vec!["Copy", "Paste", "Cut"]);
    assert_eq!(palette.active_value(), Some("Cut"));
    assert_eq!(palette.active_index(), Some(2));
}

#[test]
fn test_no_matches_is_empty() {
    let (mut palette, _rx) = palette(CommandConfig::default(), three());
    palette.set_query("zzz");

    assert!(palette.is_empty());
    assert!(!palette.is_open());
    assert_eq!(palette.active_index(), None);
    assert_eq!(palette.active_value(), Some("A"));
    assert!(palette.surface().rendered_ids().is_empty());
}

#[test]
fn test_keyboard_navigation_emits_selection() {
    let (mut palette, mut rx) = palette(CommandConfig::default(), three());
    drain_events(&mut rx);

    assert!(palette.handle_key(Key::ArrowDown));
    assert!(palette.handle_key(Key::End));
    assert!(!palette.handle_key(Key::ArrowDown));
    assert!(palette.handle_key(Key::Home));
    assert!(!palette.handle_key(Key::ArrowUp));

    assert_eq!(
        drain_events(&mut rx),
        vec![selected("B"), selected("C"), selected("A")]
    );
}

#[test]
fn test_loop_wraps_around() {
    let config = CommandConfig {
        loop_navigation: true,
        ..Default::default()
    };
    let (mut palette, _rx) = palette(config, three());

    assert!(palette.previous());
    assert_eq!(palette.active_value(), Some("C"));
    assert!(palette.next());
    assert_eq!(palette.active_value(), Some("A"));
}

#[test]
fn test_navigation_updates_row_markers() {
    let (mut palette, _rx) = palette(CommandConfig::default(), three());
    palette.next();

    let renderer = palette.renderer();
    let surface = palette.surface();
    let a = *renderer.row("A").unwrap();
    let b = *renderer.row("B").unwrap();
    assert_eq!(surface.attribute(a, ATTR_ARIA_SELECTED), Some("false"));
    assert_eq!(surface.attribute(b, ATTR_ARIA_SELECTED), Some("true"));
    assert_eq!(surface.scrolled().last(), Some(&b));
}

#[test]
fn test_enter_executes_active() {
    let (mut palette, mut rx) = palette(CommandConfig::default(), three());
    palette.next();
    drain_events(&mut rx);

    assert!(palette.handle_key(Key::Enter));
    assert_eq!(drain_events(&mut rx), vec![executed("B")]);
}

#[test]
fn test_enter_with_empty_window_does_nothing() {
    let (mut palette, mut rx) = palette(CommandConfig::default(), three());
    palette.set_query("nothing");
    drain_events(&mut rx);

    assert!(!palette.handle_key(Key::Enter));
    assert!(drain_events(&mut rx).is_empty());
}

#[test]
fn test_disabled_first_row_is_not_executed() {
    let (mut palette, mut rx) = palette(
        CommandConfig::default(),
        vec![item("A").disabled(), item("B")],
    );
    drain_events(&mut rx);

    // Resync lands on the first row even when it is disabled
    assert_eq!(palette.active_index(), Some(0));
    assert!(!palette.execute_active());
    assert!(drain_events(&mut rx).is_empty());

    assert!(palette.next());
    assert_eq!(palette.active_value(), Some("B"));
}

#[test]
fn test_hover_activates_without_executing() {
    let (mut palette, mut rx) = palette(CommandConfig::default(), three());
    drain_events(&mut rx);

    assert!(palette.hover("C"));
    assert_eq!(palette.active_index(), Some(2));
    assert_eq!(drain_events(&mut rx), vec![selected("C")]);

    assert!(!palette.hover("missing"));
}

#[test]
fn test_click_activates_and_executes() {
    let (mut palette, mut rx) = palette(CommandConfig::default(), three());
    drain_events(&mut rx);

    assert!(palette.click("B"));
    assert_eq!(
        drain_events(&mut rx),
        vec![selected("B"), executed("B")]
    );
}

#[test]
fn test_click_on_disabled_row_is_ignored() {
    let (mut palette, mut rx) = palette(
        CommandConfig::default(),
        vec![item("A"), item("B").disabled()],
    );
    drain_events(&mut rx);

    assert!(!palette.hover("B"));
    assert!(!palette.click("B"));
    assert_eq!(palette.active_index(), Some(0));
    assert!(drain_events(&mut rx).is_empty());
}

#[test]
fn test_external_selected_value_is_not_echoed() {
    let (mut palette, mut rx) = palette(CommandConfig::default(), three());
    drain_events(&mut rx);

    palette.set_selected_value(Some("C".to_string()));
    assert_eq!(palette.active_index(), Some(2));
    assert!(drain_events(&mut rx).is_empty());

    // Index-driven moves announce again afterwards
    palette.previous();
    assert_eq!(drain_events(&mut rx), vec![selected("B")]);
}

#[test]
fn test_initial_selected_value() {
    let config = CommandConfig {
        selected_value: Some("B".to_string()),
        ..Default::default()
    };
    let (palette, mut rx) = palette(config, three());

    assert_eq!(palette.active_index(), Some(1));
    assert!(drain_events(&mut rx).is_empty());
}

#[test]
fn test_max_render_caps_window() {
    let config = CommandConfig {
        max_render: 2,
        ..Default::default()
    };
    let (palette, _rx) = palette(config, three());

    assert_eq!(window_ids(&palette), vec!["A", "B"]);
    assert_eq!(palette.total_matches(), 3);
}

#[test]
fn test_should_filter_false_ignores_query() {
    let config = CommandConfig {
        should_filter: false,
        ..Default::default()
    };
    let (mut palette, _rx) = palette(config, three());
    palette.set_query("zzz");
    assert_eq!(window_ids(&palette), vec!["A", "B", "C"]);
}

#[test]
fn test_register_and_unregister_refilter() {
    let (mut palette, _rx) = palette(CommandConfig::default(), three());

    assert_eq!(palette.register(vec![item("D"), item("A")], false), 1);
    assert_eq!(window_ids(&palette), vec!["A", "B", "C", "D"]);

    assert_eq!(palette.register(vec![item("E")], true), 1);
    assert_eq!(window_ids(&palette), vec!["A", "B", "C", "D"]);

    assert!(palette.unregister("A"));
    assert_eq!(window_ids(&palette), vec!["B", "C", "D", "E"]);
    assert!(!palette.unregister("A"));
}

#[test]
fn test_unregister_active_moves_to_first() {
    let (mut palette, mut rx) = palette(CommandConfig::default(), three());
    palette.last();
    drain_events(&mut rx);

    palette.unregister("C");
    assert_eq!(palette.active_value(), Some("A"));
    assert_eq!(drain_events(&mut rx), vec![selected("A")]);
}

#[test]
fn test_static_items_are_data_items() {
    let mut host = host(vec![item("Inline")]);
    host.static_items = Some(r#"[{"value": "Static one"}, {"value": "Static two"}]"#.to_string());

    let (mut palette, _rx) =
        TestPalette::with_source(CommandConfig::default(), MemorySurface::new(), None);
    palette.mount(host);

    assert_eq!(palette.total_matches(), 3);
    let data: Vec<&str> = palette
        .window()
        .items()
        .iter()
        .filter(|c| c.is_data_item)
        .map(|c| c.value.as_str())
        .collect();
    assert_eq!(data, vec!["Static one", "Static two"]);
    assert!(palette.error().is_none());
}

#[test]
fn test_static_items_without_data_template_set_error() {
    let host = HostElement {
        items: vec![item("Inline")],
        static_items: Some(r#"[{"value": "Static"}]"#.to_string()),
        ..Default::default()
    };
    let (mut palette, _rx) =
        TestPalette::with_source(CommandConfig::default(), MemorySurface::new(), None);
    palette.mount(host);

    assert!(palette.error().is_some());
    assert_eq!(palette.surface().rendered_ids(), vec!["Inline"]);
    assert_eq!(palette.total_matches(), 2);
}

#[test]
fn test_malformed_static_items_mount_cleanly() {
    let mut host = host(three());
    host.static_items = Some("{not json".to_string());

    let (mut palette, _rx) =
        TestPalette::with_source(CommandConfig::default(), MemorySurface::new(), None);
    palette.mount(host);

    assert_eq!(window_ids(&palette), vec!["A", "B", "C"]);
    assert!(palette.error().is_none());
}

#[test]
fn test_inline_item_attach_and_detach() {
    let (mut palette, _rx) = palette(CommandConfig::default(), three());

    let id = InlineItem::new(item("D")).attach(Some(&mut palette)).unwrap();
    assert_eq!(id.as_deref(), Some("D"));
    assert_eq!(palette.total_matches(), 4);

    assert!(InlineItem::detach("D", Some(&mut palette)).unwrap());
    assert_eq!(palette.total_matches(), 3);
}

#[test]
fn test_inline_item_duplicate_id_is_dropped_silently() {
    let (mut palette, _rx) = palette(CommandConfig::default(), three());
    let generation = palette.registry().generation();

    let duplicate = CandidateSpec::new("Other").with_id("A");
    let id = InlineItem::new(duplicate).attach(Some(&mut palette)).unwrap();

    assert_eq!(id, None);
    assert_eq!(palette.registry().generation(), generation);
    assert_eq!(palette.registry().get("A").unwrap().value, "A");
    assert_eq!(window_ids(&palette), vec!["A", "B", "C"]);
}

#[test]
fn test_sub_elements_without_parent_fail_fast() {
    let err = InlineItem::new(item("orphan"))
        .attach::<MemorySurface, super::fixtures::ScriptedSource>(None)
        .unwrap_err();
    assert!(matches!(err, Error::MissingParent("command item")));

    let err = GroupHeading::new("edit", ElementTemplate::new("h3"))
        .attach::<MemorySurface, super::fixtures::ScriptedSource>(None)
        .unwrap_err();
    assert!(matches!(err, Error::MissingParent("command group")));
}

#[test]
fn test_group_heading_attach_renders_heading() {
    let (mut palette, _rx) = palette(
        CommandConfig::default(),
        vec![item("Copy").with_group("edit")],
    );

    GroupHeading::new("edit", ElementTemplate::new("h3").with_text("Edit"))
        .attach(Some(&mut palette))
        .unwrap();

    let surface = palette.surface();
    let group = surface.children(surface.container())[0];
    let heading = surface.children(group)[0];
    assert_eq!(surface.tag(heading), "h3");
    assert_eq!(surface.text(heading), Some("Edit"));
}

#[test]
fn test_config_from_host_attributes() {
    let host: HostElement = serde_json::from_str(
        r#"{
            "attributes": {"data-loop": "", "data-max-render": "2"},
            "items": [{"id": "a", "value": "A"}, {"id": "b", "value": "B"}, {"id": "c", "value": "C"}]
        }"#,
    )
    .unwrap();

    let (mut palette, _rx) = CommandPalette::new(host.config(), MemorySurface::new()).unwrap();
    palette.mount(host);

    assert!(palette.config().loop_navigation);
    assert_eq!(window_ids(&palette), vec!["a", "b"]);
    assert!(palette.previous());
    assert_eq!(palette.active_value(), Some("B"));
}
