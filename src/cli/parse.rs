//! CLI parse: clap types for Mend. No behavior; definitions only.

use crate::policy::PolicyMode;
use crate::strategy::Strategy;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Mend CLI - recovery plan orchestration
#[derive(Parser)]
#[command(name = "mend")]
#[command(about = "Plan, simulate and run recovery plans across regions")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Rendering for command output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Project a plan's timeline and readiness without dispatching anything
    Simulate {
        /// Plan file (.toml or .json)
        plan: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Trace every strategy for a plan and pick a winner
    Compare {
        plan: PathBuf,
        /// Show the staged timeline of one strategy only
        #[arg(long)]
        strategy: Option<Strategy>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Score plans and recommend fast, safe or balanced execution
    Route {
        /// One or more plan files
        #[arg(required = true)]
        plans: Vec<PathBuf>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Display-only health estimate for a plan
    Health {
        plan: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Execute a plan with the simulated adapter and record the run
    Run {
        plan: PathBuf,
        /// Use the adapter's dry-run path
        #[arg(long)]
        dry_run: bool,
        /// Override the configured policy mode
        #[arg(long)]
        policy_mode: Option<PolicyMode>,
        /// Seed for cross-region tie-breaking
        #[arg(long)]
        seed: Option<u64>,
        /// Fail these action ids in the simulated adapter
        #[arg(long = "fail", value_name = "ACTION_ID")]
        fail: Vec<String>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// List recorded runs for a plan, newest first
    Runs {
        plan_id: String,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Show the latest events for a plan
    Events {
        plan_id: String,
        /// Maximum number of events
        #[arg(long, default_value = "50")]
        limit: usize,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Cancel a recorded run that has not finished
    Abort { run_id: String },
}
