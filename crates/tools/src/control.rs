//! Workflow control tools.
//!
//! These exist so the model can see and call `reset_workflow` and
//! `get_workflow_status` like any other tool. The controller intercepts
//! both by name before dispatch, because they act on session state that
//! tools cannot reach; the `execute` bodies here only run if a caller
//! drives the registry directly.

use async_trait::async_trait;
use serde_json::{Value, json};

use benchpilot_core::{Tool, ToolError, ToolOutcome};

pub struct ResetWorkflowTool;

#[async_trait]
impl Tool for ResetWorkflowTool {
    fn name(&self) -> &str {
        "reset_workflow"
    }

    fn description(&self) -> &str {
        "Abandon the current design task and return the workflow to idle"
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _arguments: Value) -> Result<ToolOutcome, ToolError> {
        Ok(ToolOutcome::success("workflow reset"))
    }
}

pub struct GetWorkflowStatusTool;

#[async_trait]
impl Tool for GetWorkflowStatusTool {
    fn name(&self) -> &str {
        "get_workflow_status"
    }

    fn description(&self) -> &str {
        "Report the current workflow phase, active plan, and progress"
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _arguments: Value) -> Result<ToolOutcome, ToolError> {
        Ok(ToolOutcome::success("workflow status is provided by the session"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn control_tools_advertise_empty_schemas() {
        let reset = ResetWorkflowTool;
        let status = GetWorkflowStatusTool;
        assert_eq!(reset.parameters_schema()["type"], "object");
        assert_eq!(status.to_definition().name, "get_workflow_status");
    }
}
