//! Why a turn's tool loop stopped.

use serde::{Deserialize, Serialize};

/// The reason the controller stopped issuing tool calls for a user turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// A state-advancing action ran; the user must see its result before
    /// the agent continues.
    TerminationActionCalled,

    /// A tool produced a proposal that needs the user's explicit approval.
    UserConfirmationRequired,

    /// A per-tool or total call quota was exhausted.
    ToolCallLimitReached,

    /// The same call repeated too many times in a row.
    InfiniteLoopDetected,

    /// The model finished with a plain text response.
    TaskCompleted,

    /// The provider or a tool failed in a way the turn could not recover from.
    Error,
}

impl TerminationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminationReason::TerminationActionCalled => "termination_action_called",
            TerminationReason::UserConfirmationRequired => "user_confirmation_required",
            TerminationReason::ToolCallLimitReached => "tool_call_limit_reached",
            TerminationReason::InfiniteLoopDetected => "infinite_loop_detected",
            TerminationReason::TaskCompleted => "task_completed",
            TerminationReason::Error => "error",
        }
    }
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
