//! Per-session workflow context: the design state accumulated across turns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::states::WorkflowState;

/// A component the plan intends to place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedComponent {
    /// Component kind (e.g. "resistor", "nmos").
    pub kind: String,

    /// Instance name within the design.
    pub name: String,

    /// Nominal value, if the plan specifies one (e.g. "10k").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// The accepted (or proposed) circuit plan for this session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanData {
    /// Short title of what the plan builds.
    pub title: String,

    /// Components to place, in order.
    #[serde(default)]
    pub components: Vec<PlannedComponent>,
}

/// Everything the workflow machine knows about one session.
///
/// Serialized as-is for persistence; a restarted process reloads this and
/// resumes where the session left off.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowContext {
    /// Current phase.
    pub state: WorkflowState,

    /// Identifier of the active plan, if one exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,

    /// The plan itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_data: Option<PlanData>,

    /// Reference to the design artifact being worked on
    /// (library/cell path or similar backend handle).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_ref: Option<String>,

    /// Library containing the target design.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library_name: Option<String>,

    /// Cell name of the target design.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell_name: Option<String>,

    /// Components placed so far.
    #[serde(default)]
    pub progress_count: u32,

    /// Components the plan calls for in total, once known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_total: Option<u32>,

    /// When this context last changed.
    pub last_updated: DateTime<Utc>,

    /// Most recent tool failure summary, cleared on the next success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl WorkflowContext {
    pub fn new() -> Self {
        Self {
            state: WorkflowState::Idle,
            plan_id: None,
            plan_data: None,
            target_ref: None,
            library_name: None,
            cell_name: None,
            progress_count: 0,
            progress_total: None,
            last_updated: Utc::now(),
            last_error: None,
        }
    }

    /// Human-readable progress like "3/5", or just the count when the
    /// total is unknown.
    pub fn progress_display(&self) -> String {
        match self.progress_total {
            Some(total) => format!("{}/{}", self.progress_count, total),
            None => self.progress_count.to_string(),
        }
    }

    pub fn touch(&mut self) {
        self.last_updated = Utc::now();
    }
}

impl Default for WorkflowContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_context_is_idle_and_empty() {
        let ctx = WorkflowContext::new();
        assert_eq!(ctx.state, WorkflowState::Idle);
        assert!(ctx.plan_id.is_none());
        assert_eq!(ctx.progress_count, 0);
    }

    #[test]
    fn progress_display_with_and_without_total() {
        let mut ctx = WorkflowContext::new();
        ctx.progress_count = 2;
        assert_eq!(ctx.progress_display(), "2");
        ctx.progress_total = Some(5);
        assert_eq!(ctx.progress_display(), "2/5");
    }

    #[test]
    fn context_roundtrips_through_json() {
        let mut ctx = WorkflowContext::new();
        ctx.state = WorkflowState::Populating;
        ctx.plan_id = Some("plan_001".into());
        ctx.plan_data = Some(PlanData {
            title: "RC filter".into(),
            components: vec![PlannedComponent {
                kind: "resistor".into(),
                name: "R1".into(),
                value: Some("10k".into()),
            }],
        });
        ctx.progress_count = 1;
        ctx.progress_total = Some(2);

        let json = serde_json::to_string(&ctx).unwrap();
        let restored: WorkflowContext = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.state, WorkflowState::Populating);
        assert_eq!(
            restored.plan_data.as_ref().unwrap().components[0].name,
            "R1"
        );
        assert_eq!(restored.progress_display(), "1/2");
    }
}
