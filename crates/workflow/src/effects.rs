//! Mapping from tool outcomes to workflow transitions.
//!
//! Tools never mutate the workflow directly. After each execution the
//! controller calls [`apply_tool_effect`], which inspects the outcome and
//! advances the machine. Failures never advance the phase; they only record
//! the error summary for the next state prompt.

use serde_json::Value;
use tracing::debug;

use benchpilot_core::{ToolOutcome, ToolStatus};

use crate::context::{PlanData, PlannedComponent};
use crate::machine::WorkflowMachine;
use crate::states::WorkflowState;

/// Advance `machine` according to what `tool_name` just did.
pub fn apply_tool_effect(machine: &mut WorkflowMachine, tool_name: &str, outcome: &ToolOutcome) {
    if outcome.status == ToolStatus::Failure {
        machine.record_error(outcome.summary.clone());
        return;
    }

    match tool_name {
        "plan_circuit" => {
            let (plan_id, plan) = extract_plan(outcome.data.as_ref());
            machine.set_plan(plan_id, plan);
            match outcome.status {
                // Proposal that still needs the user's sign-off.
                ToolStatus::RequiresConfirmation => {
                    machine.transition_to(WorkflowState::Planning);
                }
                // Backend accepted the plan outright.
                _ => machine.transition_to(WorkflowState::ArtifactCreated),
            }
        }
        "execute_circuit_plan" => {
            if let Some(target) = extract_target(outcome.data.as_ref()) {
                machine.set_target(target.0, target.1, target.2);
            }
            machine.transition_to(WorkflowState::AwaitingUser);
        }
        "open_existing_design" => {
            machine.clear_plan();
            if let Some(target) = extract_target(outcome.data.as_ref()) {
                machine.set_target(target.0, target.1, target.2);
            }
            machine.transition_to(WorkflowState::Populating);
        }
        "confirm_design_open" => {
            machine.transition_to(WorkflowState::Populating);
        }
        "add_component" => {
            machine.record_progress(1);
        }
        "add_components_from_plan" => {
            let added = outcome
                .data
                .as_ref()
                .and_then(|d| d.get("added"))
                .and_then(Value::as_u64)
                .map(|n| n as u32)
                .or(machine.context().progress_total)
                .unwrap_or(0);
            machine.record_progress(added);
        }
        "finish_design" => {
            machine.transition_to(WorkflowState::Completed);
        }
        // save_current_design, queries, connection checks: no phase effect.
        other => {
            debug!(tool_name = %other, "no workflow effect");
        }
    }
}

fn extract_plan(data: Option<&Value>) -> (String, Option<PlanData>) {
    let Some(data) = data else {
        return ("plan_unknown".to_string(), None);
    };
    let plan_id = data
        .get("plan_id")
        .and_then(Value::as_str)
        .unwrap_or("plan_unknown")
        .to_string();
    let title = data
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or("untitled plan")
        .to_string();
    let components = data
        .get("components")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    Some(PlannedComponent {
                        kind: item.get("kind")?.as_str()?.to_string(),
                        name: item.get("name")?.as_str()?.to_string(),
                        value: item
                            .get("value")
                            .and_then(Value::as_str)
                            .map(str::to_string),
                    })
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    let plan = if components.is_empty() && title == "untitled plan" {
        None
    } else {
        Some(PlanData { title, components })
    };
    (plan_id, plan)
}

fn extract_target(data: Option<&Value>) -> Option<(String, Option<String>, Option<String>)> {
    let data = data?;
    let library = data
        .get("library")
        .and_then(Value::as_str)
        .map(str::to_string);
    let cell = data.get("cell").and_then(Value::as_str).map(str::to_string);
    let target = data
        .get("target_ref")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| match (&library, &cell) {
            (Some(l), Some(c)) => Some(format!("{l}/{c}")),
            _ => None,
        })?;
    Some((target, library, cell))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn plan_outcome(status: ToolStatus) -> ToolOutcome {
        let outcome = match status {
            ToolStatus::RequiresConfirmation => {
                ToolOutcome::requires_confirmation("plan proposed")
            }
            _ => ToolOutcome::success("plan created"),
        };
        outcome.with_data(json!({
            "plan_id": "plan_001",
            "title": "RC filter",
            "components": [
                {"kind": "resistor", "name": "R1", "value": "10k"},
                {"kind": "capacitor", "name": "C1", "value": "100n"}
            ]
        }))
    }

    #[test]
    fn proposed_plan_enters_planning() {
        let mut machine = WorkflowMachine::new();
        apply_tool_effect(
            &mut machine,
            "plan_circuit",
            &plan_outcome(ToolStatus::RequiresConfirmation),
        );

        assert_eq!(machine.state(), WorkflowState::Planning);
        assert_eq!(machine.context().plan_id.as_deref(), Some("plan_001"));
        assert_eq!(machine.context().progress_total, Some(2));
    }

    #[test]
    fn accepted_plan_creates_artifact() {
        let mut machine = WorkflowMachine::new();
        apply_tool_effect(
            &mut machine,
            "plan_circuit",
            &plan_outcome(ToolStatus::Success),
        );
        assert_eq!(machine.state(), WorkflowState::ArtifactCreated);
    }

    #[test]
    fn failure_never_advances_phase() {
        let mut machine = WorkflowMachine::new();
        apply_tool_effect(
            &mut machine,
            "plan_circuit",
            &ToolOutcome::failure("backend unreachable"),
        );

        assert_eq!(machine.state(), WorkflowState::Idle);
        assert_eq!(
            machine.context().last_error.as_deref(),
            Some("backend unreachable")
        );
    }

    #[test]
    fn execute_plan_moves_to_awaiting_user_with_target() {
        let mut machine = WorkflowMachine::new();
        apply_tool_effect(
            &mut machine,
            "plan_circuit",
            &plan_outcome(ToolStatus::Success),
        );
        apply_tool_effect(
            &mut machine,
            "execute_circuit_plan",
            &ToolOutcome::success("schematic created")
                .with_data(json!({"library": "rf_lib", "cell": "rc_filter"})),
        );

        assert_eq!(machine.state(), WorkflowState::AwaitingUser);
        assert_eq!(
            machine.context().target_ref.as_deref(),
            Some("rf_lib/rc_filter")
        );
    }

    #[test]
    fn open_existing_design_clears_plan_and_populates() {
        let mut machine = WorkflowMachine::new();
        apply_tool_effect(
            &mut machine,
            "plan_circuit",
            &plan_outcome(ToolStatus::Success),
        );
        apply_tool_effect(
            &mut machine,
            "open_existing_design",
            &ToolOutcome::success("design opened")
                .with_data(json!({"target_ref": "rf_lib/lna_v2"})),
        );

        assert_eq!(machine.state(), WorkflowState::Populating);
        assert!(machine.context().plan_id.is_none());
        assert_eq!(machine.context().target_ref.as_deref(), Some("rf_lib/lna_v2"));
    }

    #[test]
    fn add_component_counts_progress() {
        let mut machine = WorkflowMachine::new();
        apply_tool_effect(
            &mut machine,
            "add_component",
            &ToolOutcome::success("placed R1"),
        );
        apply_tool_effect(
            &mut machine,
            "add_component",
            &ToolOutcome::success("placed C1"),
        );
        assert_eq!(machine.context().progress_count, 2);
    }

    #[test]
    fn bulk_add_uses_reported_count() {
        let mut machine = WorkflowMachine::new();
        apply_tool_effect(
            &mut machine,
            "add_components_from_plan",
            &ToolOutcome::success("placed all").with_data(json!({"added": 4})),
        );
        assert_eq!(machine.context().progress_count, 4);
    }

    #[test]
    fn bulk_add_falls_back_to_plan_total() {
        let mut machine = WorkflowMachine::new();
        apply_tool_effect(
            &mut machine,
            "plan_circuit",
            &plan_outcome(ToolStatus::Success),
        );
        apply_tool_effect(
            &mut machine,
            "add_components_from_plan",
            &ToolOutcome::success("placed all"),
        );
        assert_eq!(machine.context().progress_count, 2);
    }

    #[test]
    fn finish_design_completes() {
        let mut machine = WorkflowMachine::new();
        machine.transition_to(WorkflowState::Populating);
        apply_tool_effect(
            &mut machine,
            "finish_design",
            &ToolOutcome::success("design finished"),
        );
        assert_eq!(machine.state(), WorkflowState::Completed);
    }

    #[test]
    fn queries_have_no_effect() {
        let mut machine = WorkflowMachine::new();
        apply_tool_effect(
            &mut machine,
            "get_current_design",
            &ToolOutcome::success("no design open"),
        );
        assert_eq!(machine.state(), WorkflowState::Idle);
    }
}
