//! Plain-text rendering of palette state for the terminal

use rz_command_core::render::Surface;
use rz_command_core::source::ItemSource;
use rz_command_core::{Candidate, CommandEvent, CommandPalette};
use tokio::sync::mpsc::UnboundedReceiver;

/// Print the window, one row per line, then totals and any error.
pub fn print_window<V: Surface, S: ItemSource>(palette: &CommandPalette<V, S>) {
    let active = palette.active_index();

    for (index, candidate) in palette.window().items().iter().enumerate() {
        let marker = if active == Some(index) { '>' } else { ' ' };
        println!("{marker} {index:>3}  {}", describe(candidate));
    }

    let shown = palette.window().len();
    let total = palette.total_matches();
    if total > shown {
        println!("{shown} of {total} matches");
    } else {
        println!("{total} matches");
    }

    if palette.is_loading() {
        println!("loading...");
    }
    if let Some(error) = palette.error() {
        println!("error: {error}");
    }
}

/// Print every event emitted since the last call, as JSON lines.
pub fn print_events(events: &mut UnboundedReceiver<CommandEvent>) {
    while let Ok(event) = events.try_recv() {
        match serde_json::to_string(&event) {
            Ok(json) => println!("event: {json}"),
            Err(e) => eprintln!("Failed to encode event: {e}"),
        }
    }
}

fn describe(candidate: &Candidate) -> String {
    let mut line = format!("{}  {:?}", candidate.id, candidate.value);
    if candidate.name != candidate.value {
        line.push_str(&format!("  ({})", candidate.name));
    }
    if let Some(group) = &candidate.group {
        line.push_str(&format!("  [{group}]"));
    }

    let flags: Vec<&str> = [
        (candidate.disabled, "disabled"),
        (candidate.force_mount, "forced"),
        (candidate.is_data_item, "data"),
    ]
    .into_iter()
    .filter_map(|(set, name)| set.then_some(name))
    .collect();
    if !flags.is_empty() {
        line.push_str(&format!("  <{}>", flags.join(",")));
    }
    line
}
