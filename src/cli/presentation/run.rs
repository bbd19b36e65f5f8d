//! Run presentation: run outcome, run history and events.

use super::shared::{new_table, state_label, title};
use crate::orchestrator::StartOutcome;
use crate::run::{CommandEvent, RuntimeRun};

pub fn format_run_outcome_text(outcome: &StartOutcome) -> String {
    let run = &outcome.run;
    let mut out = format!(
        "{}\n  Plan: {}\n  State: {}\n  Completed: {}\n  Failed: {}\n  Forecast readiness: {:.1}\n  Estimated: {}m ({})",
        title(&format!("Run {}", run.run_id)),
        run.plan_id,
        state_label(run.state),
        run.completed_actions.len(),
        run.failed_actions.len(),
        outcome.forecast.readiness,
        outcome.forecast.estimated_minutes,
        outcome.forecast.strategy,
    );

    if !outcome.region_peaks.is_empty() {
        out.push_str("\n  Region peaks:");
        for (region, peak) in &outcome.region_peaks {
            out.push_str(&format!("\n    {}: {}", region, peak));
        }
    }
    let action_events: Vec<CommandEvent> = outcome
        .events
        .iter()
        .filter(|e| !e.is_summary())
        .cloned()
        .collect();
    if !action_events.is_empty() {
        out.push_str("\n\n");
        out.push_str(&format_events_text(&action_events));
    }
    out
}

pub fn format_runs_text(runs: &[RuntimeRun]) -> String {
    if runs.is_empty() {
        return "No runs recorded.".to_string();
    }
    let mut table = new_table(vec!["Run", "State", "Started", "Finished", "Completed", "Failed"]);
    for run in runs {
        table.add_row(vec![
            run.run_id.clone(),
            state_label(run.state),
            run.started_at.to_rfc3339(),
            run.finished_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "-".to_string()),
            run.completed_actions.len().to_string(),
            run.failed_actions.len().to_string(),
        ]);
    }
    table.to_string()
}

pub fn format_events_text(events: &[CommandEvent]) -> String {
    if events.is_empty() {
        return "No events recorded.".to_string();
    }
    let mut table = new_table(vec!["Time", "Run", "Action", "Status", "Message"]);
    for event in events {
        let action = if event.is_summary() {
            "-".to_string()
        } else {
            event.action_id.clone()
        };
        let message = match (event.message.as_deref(), event.readiness) {
            (Some(message), _) => message.to_string(),
            (None, Some(readiness)) => format!("readiness {:.1}", readiness),
            (None, None) => String::new(),
        };
        table.add_row(vec![
            event.emitted_at.to_rfc3339(),
            event.run_id.clone(),
            action,
            event.status.as_str().to_string(),
            message,
        ]);
    }
    table.to_string()
}
