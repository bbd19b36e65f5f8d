//! Plan presentation: simulate, compare, route and health.

use super::shared::{new_table, title};
use crate::router::RouteDecision;
use crate::simulation::{SimulatedStatus, SimulationResult, StrategyComparison};
use crate::strategy::Strategy;

pub fn format_simulation_text(result: &SimulationResult) -> String {
    let mut table = new_table(vec!["Action", "Region", "Start", "End", "Status"]);
    for step in &result.steps {
        let status = match step.status {
            SimulatedStatus::Queued => "queued",
            SimulatedStatus::Failed => "over SLA",
        };
        table.add_row(vec![
            step.action_id.clone(),
            step.region.clone(),
            format!("{}m", step.start_minute),
            format!("{}m", step.end_minute),
            status.to_string(),
        ]);
    }

    let mut out = format!(
        "{}\n  Estimated: {}m\n  Readiness after run: {:.1}\n\n{}",
        title(&format!("Simulation of {}", result.plan_id)),
        result.estimated_minutes,
        result.readiness_after_run,
        table
    );
    if !result.critical_warnings.is_empty() {
        out.push_str(&format!("\n\nWarnings ({}):", result.critical_warnings.len()));
        for warning in &result.critical_warnings {
            out.push_str(&format!("\n  - {}", warning));
        }
    }
    out
}

/// Strategy summary table; with `focus`, that strategy's timeline follows.
pub fn format_comparison_text(comparison: &StrategyComparison, focus: Option<Strategy>) -> String {
    let mut table = new_table(vec!["Strategy", "Stages", "Estimated", "Readiness", "Warnings"]);
    for trace in &comparison.traces {
        let name = if trace.strategy == comparison.winner {
            format!("{} *", trace.strategy)
        } else {
            trace.strategy.to_string()
        };
        table.add_row(vec![
            name,
            trace.timeline.len().to_string(),
            format!("{}m", trace.estimated_minutes),
            format!("{:.1}", trace.readiness_after_run),
            trace.warnings.len().to_string(),
        ]);
    }

    let mut out = format!(
        "{}\n  Winner: {}\n\n{}",
        title(&format!("Strategy comparison for {}", comparison.plan_id)),
        comparison.winner,
        table
    );

    if let Some(trace) = focus.and_then(|s| comparison.traces.iter().find(|t| t.strategy == s)) {
        let mut timeline = new_table(vec!["Stage", "Start", "End", "Actions"]);
        for entry in &trace.timeline {
            timeline.add_row(vec![
                entry.stage.to_string(),
                format!("{}m", entry.start_minute),
                format!("{}m", entry.end_minute),
                entry.action_ids.join(", "),
            ]);
        }
        out.push_str(&format!("\n\nTimeline ({}):\n{}", trace.strategy, timeline));
    }
    out
}

pub fn format_route_text(decisions: &[RouteDecision]) -> String {
    if decisions.is_empty() {
        return "No plans to route.".to_string();
    }
    let mut table = new_table(vec!["Plan", "Recommendation", "Score"]);
    for decision in decisions {
        table.add_row(vec![
            decision.plan_id.clone(),
            decision.recommendation.as_str().to_string(),
            format!("{:.1}", decision.score),
        ]);
    }
    let mut out = table.to_string();
    for decision in decisions {
        out.push_str(&format!("\n\n{}:", decision.plan_id));
        for line in &decision.rationale {
            out.push_str(&format!("\n  - {}", line));
        }
    }
    out
}

pub fn format_health_text(plan_id: &str, score: f64) -> String {
    format!("Health of {}: {:.1}/100", plan_id, score)
}
