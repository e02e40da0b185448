//! Post-execution termination classification.
//!
//! Some tools end the turn by their nature: after a schematic is created
//! or a design is saved, the user should see the result before the agent
//! does anything else. Others end it conditionally, when their outcome is
//! a proposal awaiting the user's decision.

use benchpilot_core::{ToolOutcome, ToolStatus};

use crate::termination::TerminationReason;

/// Tools whose successful execution always ends the turn.
const TERMINATING_TOOLS: &[&str] = &[
    "execute_circuit_plan",
    "add_components_from_plan",
    "save_current_design",
];

/// Tools that end the turn whenever their outcome is not a failure,
/// because the user must now accept or reject a proposal.
const CONFIRMATION_TOOLS: &[&str] = &["plan_circuit"];

pub fn is_terminating_tool(tool_name: &str) -> bool {
    TERMINATING_TOOLS.contains(&tool_name)
}

pub fn is_confirmation_tool(tool_name: &str) -> bool {
    CONFIRMATION_TOOLS.contains(&tool_name)
}

/// Decide whether `tool_name`'s outcome ends the current turn.
///
/// Returns the reason and a transcript-facing note, or `None` to continue.
/// Failures never terminate here: the model should see the failure and get
/// a chance to recover (the loop guard bounds how long it may try).
pub fn classify_post_execution(
    tool_name: &str,
    outcome: &ToolOutcome,
) -> Option<(TerminationReason, String)> {
    if outcome.status == ToolStatus::Failure {
        return None;
    }

    if is_confirmation_tool(tool_name) {
        return Some((
            TerminationReason::UserConfirmationRequired,
            format!("'{tool_name}' produced a proposal that needs the user's approval."),
        ));
    }

    if is_terminating_tool(tool_name) && outcome.status == ToolStatus::Success {
        return Some((
            TerminationReason::TerminationActionCalled,
            format!("'{tool_name}' completed a state-advancing action; pausing for the user."),
        ));
    }

    if outcome.status == ToolStatus::RequiresConfirmation {
        return Some((
            TerminationReason::UserConfirmationRequired,
            format!("'{tool_name}' is waiting for the user's confirmation."),
        ));
    }

    None
}
