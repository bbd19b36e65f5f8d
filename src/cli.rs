//! CLI domain: parse, route, help, output, and presentation only.
//! No domain orchestration; single route table dispatches to domain services.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::command_name;
pub use output::{map_error, to_json};
pub use parse::{Cli, Commands, OutputFormat};
pub use presentation::{
    format_comparison_text, format_events_text, format_health_text, format_route_text,
    format_run_outcome_text, format_runs_text, format_simulation_text, state_label,
};
pub use route::RunContext;
