//! Status view of a session's workflow, for the status tool and callers.

use serde::Serialize;
use serde_json::Value;

use benchpilot_session::Session;
use benchpilot_workflow::WorkflowState;

/// Snapshot of where a session's workflow stands.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowStatus {
    pub session_id: String,
    pub state: WorkflowState,
    pub allowed_tools: Vec<String>,
    pub plan_id: Option<String>,
    pub target_ref: Option<String>,
    pub progress: String,
    pub last_error: Option<String>,
}

impl WorkflowStatus {
    pub fn of(session: &Session) -> Self {
        let context = session.workflow.context();
        Self {
            session_id: session.id.as_str().to_string(),
            state: session.workflow.state(),
            allowed_tools: session.workflow.allowed_tools(),
            plan_id: context.plan_id.clone(),
            target_ref: context.target_ref.clone(),
            progress: context.progress_display(),
            last_error: context.last_error.clone(),
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use benchpilot_core::SessionId;
    use benchpilot_guard::GuardLimits;

    #[test]
    fn status_reflects_fresh_session() {
        let session = Session::new(SessionId::from("s1"), GuardLimits::default());
        let status = WorkflowStatus::of(&session);

        assert_eq!(status.state, WorkflowState::Idle);
        assert!(status.allowed_tools.contains(&"plan_circuit".to_string()));
        assert!(status.plan_id.is_none());
        assert_eq!(status.progress, "0");
    }

    #[test]
    fn status_serializes_to_json() {
        let session = Session::new(SessionId::from("s1"), GuardLimits::default());
        let json = WorkflowStatus::of(&session).to_json();
        assert_eq!(json["state"], "idle");
        assert_eq!(json["session_id"], "s1");
    }
}
