//! CLI help and command-name contract for logging and routing.

use crate::cli::parse::Commands;

/// Command name used in log fields (e.g. "run", "events").
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Simulate { .. } => "simulate",
        Commands::Compare { .. } => "compare",
        Commands::Route { .. } => "route",
        Commands::Health { .. } => "health",
        Commands::Run { .. } => "run",
        Commands::Runs { .. } => "runs",
        Commands::Events { .. } => "events",
        Commands::Abort { .. } => "abort",
    }
}
