//! Design tools: thin adapters from the model-facing tool surface onto a
//! [`DesignBridge`].
//!
//! Backend failures are reported as structured `failure` outcomes rather
//! than hard errors, so the model sees what went wrong and can recover
//! within the turn.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use benchpilot_core::{Tool, ToolError, ToolOutcome};

use crate::bridge::{ComponentSpec, DesignBridge};

/// Every design tool, wired to `bridge`.
pub fn design_tools(bridge: Arc<dyn DesignBridge>) -> Vec<Box<dyn Tool>> {
    vec![
        Box::new(CheckConnectionTool(bridge.clone())),
        Box::new(GetProjectStructureTool(bridge.clone())),
        Box::new(ListCellsTool(bridge.clone())),
        Box::new(CheckCellExistsTool(bridge.clone())),
        Box::new(GetCurrentDesignTool(bridge.clone())),
        Box::new(PlanCircuitTool(bridge.clone())),
        Box::new(ExecuteCircuitPlanTool(bridge.clone())),
        Box::new(OpenExistingDesignTool(bridge.clone())),
        Box::new(ConfirmDesignOpenTool(bridge.clone())),
        Box::new(AddComponentTool(bridge.clone())),
        Box::new(AddComponentsFromPlanTool(bridge.clone())),
        Box::new(SaveCurrentDesignTool(bridge.clone())),
        Box::new(FinishDesignTool(bridge)),
    ]
}

fn failure_from(e: ToolError) -> ToolOutcome {
    ToolOutcome::failure(e.to_string())
}

fn require_str<'a>(arguments: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    arguments
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ToolError::InvalidArguments(format!("missing required argument '{key}'")))
}

struct CheckConnectionTool(Arc<dyn DesignBridge>);

#[async_trait]
impl Tool for CheckConnectionTool {
    fn name(&self) -> &str {
        "check_connection"
    }

    fn description(&self) -> &str {
        "Check whether the design backend is reachable"
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _arguments: Value) -> Result<ToolOutcome, ToolError> {
        match self.0.check_connection().await {
            Ok(true) => Ok(ToolOutcome::success("design backend is connected")),
            Ok(false) => Ok(ToolOutcome::failure("design backend is not connected")),
            Err(e) => Ok(failure_from(e)),
        }
    }
}

struct GetProjectStructureTool(Arc<dyn DesignBridge>);

#[async_trait]
impl Tool for GetProjectStructureTool {
    fn name(&self) -> &str {
        "get_project_structure"
    }

    fn description(&self) -> &str {
        "List the libraries and cells in the current project"
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _arguments: Value) -> Result<ToolOutcome, ToolError> {
        match self.0.project_structure().await {
            Ok(structure) => {
                Ok(ToolOutcome::success("project structure retrieved").with_data(structure))
            }
            Err(e) => Ok(failure_from(e)),
        }
    }
}

struct ListCellsTool(Arc<dyn DesignBridge>);

#[async_trait]
impl Tool for ListCellsTool {
    fn name(&self) -> &str {
        "list_cells"
    }

    fn description(&self) -> &str {
        "List the cells in one library"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "library": {"type": "string", "description": "Library name"}
            },
            "required": ["library"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<ToolOutcome, ToolError> {
        let library = require_str(&arguments, "library")?;
        match self.0.list_cells(library).await {
            Ok(cells) => Ok(ToolOutcome::success(format!(
                "{} cell(s) in '{library}'",
                cells.len()
            ))
            .with_data(json!({"library": library, "cells": cells}))),
            Err(e) => Ok(failure_from(e)),
        }
    }
}

struct CheckCellExistsTool(Arc<dyn DesignBridge>);

#[async_trait]
impl Tool for CheckCellExistsTool {
    fn name(&self) -> &str {
        "check_cell_exists"
    }

    fn description(&self) -> &str {
        "Check whether a cell exists in a library"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "library": {"type": "string"},
                "cell": {"type": "string"}
            },
            "required": ["library", "cell"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<ToolOutcome, ToolError> {
        let library = require_str(&arguments, "library")?;
        let cell = require_str(&arguments, "cell")?;
        match self.0.cell_exists(library, cell).await {
            Ok(exists) => Ok(ToolOutcome::success(format!(
                "cell '{library}/{cell}' {}",
                if exists { "exists" } else { "does not exist" }
            ))
            .with_data(json!({"exists": exists}))),
            Err(e) => Ok(failure_from(e)),
        }
    }
}

struct GetCurrentDesignTool(Arc<dyn DesignBridge>);

#[async_trait]
impl Tool for GetCurrentDesignTool {
    fn name(&self) -> &str {
        "get_current_design"
    }

    fn description(&self) -> &str {
        "Describe the design currently open in the backend, if any"
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _arguments: Value) -> Result<ToolOutcome, ToolError> {
        match self.0.current_design().await {
            Ok(Some(design)) => Ok(ToolOutcome::success("a design is open").with_data(design)),
            Ok(None) => Ok(ToolOutcome::success("no design is currently open")),
            Err(e) => Ok(failure_from(e)),
        }
    }
}

struct PlanCircuitTool(Arc<dyn DesignBridge>);

#[async_trait]
impl Tool for PlanCircuitTool {
    fn name(&self) -> &str {
        "plan_circuit"
    }

    fn description(&self) -> &str {
        "Turn a requirements description into a circuit plan for the user to approve"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "requirements": {
                    "type": "string",
                    "description": "What the circuit should do, in plain language"
                }
            },
            "required": ["requirements"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<ToolOutcome, ToolError> {
        let requirements = require_str(&arguments, "requirements")?;
        match self.0.create_plan(requirements).await {
            Ok(plan) => Ok(ToolOutcome::success("circuit plan created")
                .with_data(plan)
                .with_instruction(
                    "Present this plan to the user and wait for their approval before \
                     executing it.",
                )),
            Err(e) => Ok(failure_from(e)),
        }
    }
}

struct ExecuteCircuitPlanTool(Arc<dyn DesignBridge>);

#[async_trait]
impl Tool for ExecuteCircuitPlanTool {
    fn name(&self) -> &str {
        "execute_circuit_plan"
    }

    fn description(&self) -> &str {
        "Realize an approved circuit plan as a schematic"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "plan_id": {"type": "string", "description": "The approved plan's id"}
            },
            "required": ["plan_id"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<ToolOutcome, ToolError> {
        let plan_id = require_str(&arguments, "plan_id")?;
        match self.0.create_schematic(plan_id).await {
            Ok(target) => Ok(ToolOutcome::success("schematic created")
                .with_data(target)
                .with_instruction(
                    "Ask the user to open the new schematic in their editor, then wait.",
                )),
            Err(e) => Ok(failure_from(e)),
        }
    }
}

struct OpenExistingDesignTool(Arc<dyn DesignBridge>);

#[async_trait]
impl Tool for OpenExistingDesignTool {
    fn name(&self) -> &str {
        "open_existing_design"
    }

    fn description(&self) -> &str {
        "Open an existing design for editing"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "library": {"type": "string"},
                "cell": {"type": "string"}
            },
            "required": ["library", "cell"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<ToolOutcome, ToolError> {
        let library = require_str(&arguments, "library")?;
        let cell = require_str(&arguments, "cell")?;
        match self.0.open_design(library, cell).await {
            Ok(target) => Ok(ToolOutcome::success(format!(
                "design '{library}/{cell}' opened"
            ))
            .with_data(json!({
                "target_ref": format!("{library}/{cell}"),
                "library": target["library"],
                "cell": target["cell"],
            }))),
            Err(e) => Ok(failure_from(e)),
        }
    }
}

struct ConfirmDesignOpenTool(Arc<dyn DesignBridge>);

#[async_trait]
impl Tool for ConfirmDesignOpenTool {
    fn name(&self) -> &str {
        "confirm_design_open"
    }

    fn description(&self) -> &str {
        "Confirm that the user has the created design open and editing may begin"
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _arguments: Value) -> Result<ToolOutcome, ToolError> {
        match self.0.current_design().await {
            Ok(Some(_)) => Ok(ToolOutcome::success("design confirmed open, editing may begin")),
            // The editor may be ahead of the backend view; trust the user.
            Ok(None) => Ok(ToolOutcome::success("confirmation recorded, editing may begin")),
            Err(e) => Ok(failure_from(e)),
        }
    }
}

struct AddComponentTool(Arc<dyn DesignBridge>);

fn component_from(arguments: &Value) -> Result<ComponentSpec, ToolError> {
    Ok(ComponentSpec {
        kind: require_str(arguments, "kind")?.to_string(),
        name: require_str(arguments, "name")?.to_string(),
        value: arguments
            .get("value")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

#[async_trait]
impl Tool for AddComponentTool {
    fn name(&self) -> &str {
        "add_component"
    }

    fn description(&self) -> &str {
        "Place one component in the open design"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "kind": {"type": "string", "description": "Component kind, e.g. resistor"},
                "name": {"type": "string", "description": "Instance name, e.g. R1"},
                "value": {"type": "string", "description": "Nominal value, e.g. 10k"}
            },
            "required": ["kind", "name"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<ToolOutcome, ToolError> {
        let spec = component_from(&arguments)?;
        match self.0.add_component(&spec).await {
            Ok(placed) => {
                Ok(ToolOutcome::success(format!("placed {}", spec.name)).with_data(placed))
            }
            Err(e) => Ok(failure_from(e)),
        }
    }
}

struct AddComponentsFromPlanTool(Arc<dyn DesignBridge>);

#[async_trait]
impl Tool for AddComponentsFromPlanTool {
    fn name(&self) -> &str {
        "add_components_from_plan"
    }

    fn description(&self) -> &str {
        "Place all of the plan's components in the open design at once"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "components": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "kind": {"type": "string"},
                            "name": {"type": "string"},
                            "value": {"type": "string"}
                        },
                        "required": ["kind", "name"]
                    }
                }
            },
            "required": ["components"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<ToolOutcome, ToolError> {
        let items = arguments
            .get("components")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                ToolError::InvalidArguments("missing required argument 'components'".into())
            })?;
        let specs: Vec<ComponentSpec> = items
            .iter()
            .map(component_from)
            .collect::<Result<_, _>>()?;

        match self.0.add_components(&specs).await {
            Ok(added) => Ok(ToolOutcome::success(format!("placed {added} component(s)"))
                .with_data(json!({"added": added}))),
            Err(e) => Ok(failure_from(e)),
        }
    }
}

struct SaveCurrentDesignTool(Arc<dyn DesignBridge>);

#[async_trait]
impl Tool for SaveCurrentDesignTool {
    fn name(&self) -> &str {
        "save_current_design"
    }

    fn description(&self) -> &str {
        "Save the open design"
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _arguments: Value) -> Result<ToolOutcome, ToolError> {
        match self.0.save_design().await {
            Ok(()) => Ok(ToolOutcome::success("design saved")),
            Err(e) => Ok(failure_from(e)),
        }
    }
}

struct FinishDesignTool(Arc<dyn DesignBridge>);

#[async_trait]
impl Tool for FinishDesignTool {
    fn name(&self) -> &str {
        "finish_design"
    }

    fn description(&self) -> &str {
        "Mark the design task as complete"
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _arguments: Value) -> Result<ToolOutcome, ToolError> {
        // Save before declaring done; an unsaved "complete" design is a trap.
        if let Err(e) = self.0.save_design().await {
            return Ok(failure_from(e));
        }
        Ok(ToolOutcome::success("design task complete"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::MockDesignBridge;
    use benchpilot_core::ToolStatus;

    fn bridge() -> Arc<MockDesignBridge> {
        Arc::new(MockDesignBridge::new())
    }

    #[tokio::test]
    async fn plan_circuit_returns_plan_with_instruction() {
        let tools = design_tools(bridge());
        let plan_tool = tools.iter().find(|t| t.name() == "plan_circuit").unwrap();

        let outcome = plan_tool
            .execute(json!({"requirements": "RC low-pass filter"}))
            .await
            .unwrap();

        assert!(outcome.is_success());
        assert_eq!(outcome.data.as_ref().unwrap()["plan_id"], "plan_001");
        assert!(outcome.instruction.unwrap().contains("approval"));
    }

    #[tokio::test]
    async fn missing_arguments_are_rejected() {
        let tools = design_tools(bridge());
        let plan_tool = tools.iter().find(|t| t.name() == "plan_circuit").unwrap();

        let err = plan_tool.execute(json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn backend_failure_becomes_failure_outcome() {
        let bridge = bridge();
        bridge.set_connected(false);
        let tools = design_tools(bridge);
        let structure = tools
            .iter()
            .find(|t| t.name() == "get_project_structure")
            .unwrap();

        let outcome = structure.execute(json!({})).await.unwrap();
        assert_eq!(outcome.status, ToolStatus::Failure);
        assert!(outcome.summary.contains("not connected"));
    }

    #[tokio::test]
    async fn bulk_add_reports_count() {
        let bridge = bridge();
        bridge.open_design("rf_lib", "lna_v2").await.unwrap();
        let tools = design_tools(bridge.clone());
        let bulk = tools
            .iter()
            .find(|t| t.name() == "add_components_from_plan")
            .unwrap();

        let outcome = bulk
            .execute(json!({"components": [
                {"kind": "resistor", "name": "R1", "value": "10k"},
                {"kind": "capacitor", "name": "C1"}
            ]}))
            .await
            .unwrap();

        assert_eq!(outcome.data.unwrap()["added"], 2);
        assert_eq!(bridge.placed_count(), 2);
    }

    #[tokio::test]
    async fn all_design_tools_have_unique_names() {
        let tools = design_tools(bridge());
        let mut names: Vec<&str> = tools.iter().map(|t| t.name()).collect();
        let before = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), before);
    }
}
