//! Shared presentation helpers.

use crate::run::RunState;
use comfy_table::Table;
use owo_colors::OwoColorize;

pub fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(header);
    table
}

pub fn title(text: &str) -> String {
    format!("{}", text.bold())
}

/// Run state, colored for terminals.
pub fn state_label(state: RunState) -> String {
    let label = state.as_str();
    match state {
        RunState::Completed => format!("{}", label.green()),
        RunState::Failed => format!("{}", label.red()),
        RunState::Cancelled => format!("{}", label.yellow()),
        RunState::Pending | RunState::Running => format!("{}", label.cyan()),
    }
}
