//! Integration tests for the Mend recovery plan orchestrator

mod config_integration;
mod orchestrator_flow;
mod plan_files;
mod strategy_comparison;
mod test_utils;
