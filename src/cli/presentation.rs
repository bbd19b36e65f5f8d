//! CLI presentation: text formatters per command family. JSON output is
//! the serde form of the domain types.

mod plan;
mod run;
mod shared;

pub use plan::{
    format_comparison_text, format_health_text, format_route_text, format_simulation_text,
};
pub use run::{format_events_text, format_run_outcome_text, format_runs_text};
pub use shared::state_label;
