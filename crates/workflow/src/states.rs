//! Workflow phases and their tool visibility sets.

use serde::{Deserialize, Serialize};

/// Tools reachable from every non-idle phase, on top of the phase's own set.
///
/// Idle deliberately omits them: there is nothing to reset or report on yet,
/// and `check_connection` is already in Idle's own set.
pub const GLOBAL_TOOLS: &[&str] = &["reset_workflow", "get_workflow_status", "check_connection"];

/// The phases a design session moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    /// No design task in flight. Exploration and planning entry points.
    Idle,
    /// A plan draft exists but has not been accepted.
    Planning,
    /// A plan was executed into a design artifact.
    ArtifactCreated,
    /// Waiting for the user to open/inspect the created artifact.
    AwaitingUser,
    /// Components are being added to the open design.
    Populating,
    /// The design was saved and the task is done.
    Completed,
}

impl WorkflowState {
    /// Phase-specific tools, not counting [`GLOBAL_TOOLS`].
    pub fn phase_tools(&self) -> &'static [&'static str] {
        match self {
            WorkflowState::Idle => &[
                "check_connection",
                "get_workflow_status",
                "get_project_structure",
                "list_cells",
                "check_cell_exists",
                "get_current_design",
                "plan_circuit",
                "open_existing_design",
                "web_search",
                "instrument_control",
            ],
            WorkflowState::Planning => &["plan_circuit"],
            WorkflowState::ArtifactCreated => &["get_current_design", "execute_circuit_plan"],
            WorkflowState::AwaitingUser => &["get_current_design", "confirm_design_open"],
            WorkflowState::Populating => &[
                "get_current_design",
                "add_component",
                "add_components_from_plan",
                "save_current_design",
                "finish_design",
                "web_search",
                "instrument_control",
            ],
            WorkflowState::Completed => &["get_project_structure", "plan_circuit"],
        }
    }

    /// Phases this phase may legally move to. `Idle` is always reachable
    /// (it is the reset target) and is not listed here.
    pub fn valid_successors(&self) -> &'static [WorkflowState] {
        match self {
            WorkflowState::Idle => &[
                WorkflowState::Planning,
                WorkflowState::ArtifactCreated,
                WorkflowState::Populating,
            ],
            WorkflowState::Planning => &[WorkflowState::ArtifactCreated],
            WorkflowState::ArtifactCreated => &[WorkflowState::AwaitingUser],
            WorkflowState::AwaitingUser => &[WorkflowState::Populating],
            WorkflowState::Populating => &[WorkflowState::Completed],
            WorkflowState::Completed => &[WorkflowState::Planning, WorkflowState::ArtifactCreated],
        }
    }

    /// Whether moving to `next` follows the expected graph.
    pub fn can_transition_to(&self, next: WorkflowState) -> bool {
        next == WorkflowState::Idle
            || *self == next
            || self.valid_successors().contains(&next)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowState::Idle => "idle",
            WorkflowState::Planning => "planning",
            WorkflowState::ArtifactCreated => "artifact_created",
            WorkflowState::AwaitingUser => "awaiting_user",
            WorkflowState::Populating => "populating",
            WorkflowState::Completed => "completed",
        }
    }
}

impl std::fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Default for WorkflowState {
    fn default() -> Self {
        WorkflowState::Idle
    }
}
