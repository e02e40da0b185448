//! The design backend bridge.
//!
//! All CAD-backend specifics sit behind [`DesignBridge`]. The design tools
//! only speak this trait, so swapping the real backend connector for the
//! mock is a wiring change, not a tool change.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Value, json};

use benchpilot_core::ToolError;

/// A component placement request passed to the backend.
#[derive(Debug, Clone)]
pub struct ComponentSpec {
    pub kind: String,
    pub name: String,
    pub value: Option<String>,
}

/// Interface to the design backend.
#[async_trait]
pub trait DesignBridge: Send + Sync {
    /// Whether the backend is reachable.
    async fn check_connection(&self) -> Result<bool, ToolError>;

    /// Libraries and cells visible in the project.
    async fn project_structure(&self) -> Result<Value, ToolError>;

    /// Cells within one library.
    async fn list_cells(&self, library: &str) -> Result<Vec<String>, ToolError>;

    /// Whether `cell` exists in `library`.
    async fn cell_exists(&self, library: &str, cell: &str) -> Result<bool, ToolError>;

    /// The currently open design, if any.
    async fn current_design(&self) -> Result<Option<Value>, ToolError>;

    /// Turn a requirements description into a circuit plan.
    async fn create_plan(&self, requirements: &str) -> Result<Value, ToolError>;

    /// Realize `plan_id` as a schematic; returns the created target.
    async fn create_schematic(&self, plan_id: &str) -> Result<Value, ToolError>;

    /// Open an existing design for editing.
    async fn open_design(&self, library: &str, cell: &str) -> Result<Value, ToolError>;

    /// Place one component in the open design.
    async fn add_component(&self, spec: &ComponentSpec) -> Result<Value, ToolError>;

    /// Place several components; returns how many were placed.
    async fn add_components(&self, specs: &[ComponentSpec]) -> Result<u32, ToolError>;

    /// Save the open design.
    async fn save_design(&self) -> Result<(), ToolError>;
}

/// In-memory backend for tests and offline development.
///
/// Deterministic: plan ids are sequential, the project starts with one
/// library, and every operation succeeds unless the state makes it
/// meaningless (e.g. adding a component with no open design).
pub struct MockDesignBridge {
    state: Mutex<MockState>,
}

struct MockState {
    connected: bool,
    libraries: HashMap<String, Vec<String>>,
    plans: HashMap<String, Value>,
    next_plan: u32,
    open_design: Option<(String, String)>,
    placed: Vec<ComponentSpec>,
}

impl MockDesignBridge {
    pub fn new() -> Self {
        let mut libraries = HashMap::new();
        libraries.insert(
            "rf_lib".to_string(),
            vec!["lna_v2".to_string(), "mixer_core".to_string()],
        );
        Self {
            state: Mutex::new(MockState {
                connected: true,
                libraries,
                plans: HashMap::new(),
                next_plan: 1,
                open_design: None,
                placed: Vec::new(),
            }),
        }
    }

    /// Simulate a dropped backend connection.
    pub fn set_connected(&self, connected: bool) {
        self.state.lock().unwrap().connected = connected;
    }

    /// Components placed so far, for assertions.
    pub fn placed_count(&self) -> usize {
        self.state.lock().unwrap().placed.len()
    }

    fn ensure_connected(state: &MockState) -> Result<(), ToolError> {
        if state.connected {
            Ok(())
        } else {
            Err(ToolError::BridgeUnavailable(
                "design backend is not connected".into(),
            ))
        }
    }
}

impl Default for MockDesignBridge {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DesignBridge for MockDesignBridge {
    async fn check_connection(&self) -> Result<bool, ToolError> {
        Ok(self.state.lock().unwrap().connected)
    }

    async fn project_structure(&self) -> Result<Value, ToolError> {
        let state = self.state.lock().unwrap();
        Self::ensure_connected(&state)?;
        let libs: Vec<Value> = state
            .libraries
            .iter()
            .map(|(lib, cells)| json!({"library": lib, "cells": cells}))
            .collect();
        Ok(json!({"libraries": libs}))
    }

    async fn list_cells(&self, library: &str) -> Result<Vec<String>, ToolError> {
        let state = self.state.lock().unwrap();
        Self::ensure_connected(&state)?;
        state
            .libraries
            .get(library)
            .cloned()
            .ok_or_else(|| ToolError::ExecutionFailed {
                tool_name: "list_cells".into(),
                reason: format!("library '{library}' does not exist"),
            })
    }

    async fn cell_exists(&self, library: &str, cell: &str) -> Result<bool, ToolError> {
        let state = self.state.lock().unwrap();
        Self::ensure_connected(&state)?;
        Ok(state
            .libraries
            .get(library)
            .map(|cells| cells.iter().any(|c| c == cell))
            .unwrap_or(false))
    }

    async fn current_design(&self) -> Result<Option<Value>, ToolError> {
        let state = self.state.lock().unwrap();
        Self::ensure_connected(&state)?;
        Ok(state.open_design.as_ref().map(|(lib, cell)| {
            json!({
                "library": lib,
                "cell": cell,
                "components_placed": state.placed.len(),
            })
        }))
    }

    async fn create_plan(&self, requirements: &str) -> Result<Value, ToolError> {
        let mut state = self.state.lock().unwrap();
        Self::ensure_connected(&state)?;
        let plan_id = format!("plan_{:03}", state.next_plan);
        state.next_plan += 1;

        // A fixed two-component plan keeps tests deterministic.
        let plan = json!({
            "plan_id": plan_id,
            "title": requirements,
            "components": [
                {"kind": "resistor", "name": "R1", "value": "10k"},
                {"kind": "capacitor", "name": "C1", "value": "100n"},
            ],
        });
        state.plans.insert(plan_id.clone(), plan.clone());
        Ok(plan)
    }

    async fn create_schematic(&self, plan_id: &str) -> Result<Value, ToolError> {
        let mut state = self.state.lock().unwrap();
        Self::ensure_connected(&state)?;
        if !state.plans.contains_key(plan_id) {
            return Err(ToolError::ExecutionFailed {
                tool_name: "execute_circuit_plan".into(),
                reason: format!("unknown plan '{plan_id}'"),
            });
        }
        let cell = format!("{plan_id}_schematic");
        state
            .libraries
            .entry("work_lib".to_string())
            .or_default()
            .push(cell.clone());
        // The backend leaves the freshly created schematic open, the same
        // way the editor does, so population can start once the user
        // confirms.
        state.open_design = Some(("work_lib".to_string(), cell.clone()));
        state.placed.clear();
        Ok(json!({"library": "work_lib", "cell": cell}))
    }

    async fn open_design(&self, library: &str, cell: &str) -> Result<Value, ToolError> {
        let mut state = self.state.lock().unwrap();
        Self::ensure_connected(&state)?;
        let exists = state
            .libraries
            .get(library)
            .map(|cells| cells.iter().any(|c| c == cell))
            .unwrap_or(false);
        if !exists {
            return Err(ToolError::ExecutionFailed {
                tool_name: "open_existing_design".into(),
                reason: format!("cell '{library}/{cell}' does not exist"),
            });
        }
        state.open_design = Some((library.to_string(), cell.to_string()));
        state.placed.clear();
        Ok(json!({"library": library, "cell": cell}))
    }

    async fn add_component(&self, spec: &ComponentSpec) -> Result<Value, ToolError> {
        let mut state = self.state.lock().unwrap();
        Self::ensure_connected(&state)?;
        if state.open_design.is_none() {
            return Err(ToolError::ExecutionFailed {
                tool_name: "add_component".into(),
                reason: "no design is open".into(),
            });
        }
        state.placed.push(spec.clone());
        Ok(json!({"kind": spec.kind, "name": spec.name, "value": spec.value}))
    }

    async fn add_components(&self, specs: &[ComponentSpec]) -> Result<u32, ToolError> {
        let mut state = self.state.lock().unwrap();
        Self::ensure_connected(&state)?;
        if state.open_design.is_none() {
            return Err(ToolError::ExecutionFailed {
                tool_name: "add_components_from_plan".into(),
                reason: "no design is open".into(),
            });
        }
        state.placed.extend(specs.iter().cloned());
        Ok(specs.len() as u32)
    }

    async fn save_design(&self) -> Result<(), ToolError> {
        let state = self.state.lock().unwrap();
        Self::ensure_connected(&state)?;
        if state.open_design.is_none() {
            return Err(ToolError::ExecutionFailed {
                tool_name: "save_current_design".into(),
                reason: "no design is open".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn plan_ids_are_sequential() {
        let bridge = MockDesignBridge::new();
        let a = bridge.create_plan("first").await.unwrap();
        let b = bridge.create_plan("second").await.unwrap();
        assert_eq!(a["plan_id"], "plan_001");
        assert_eq!(b["plan_id"], "plan_002");
    }

    #[tokio::test]
    async fn schematic_requires_known_plan() {
        let bridge = MockDesignBridge::new();
        assert!(bridge.create_schematic("plan_999").await.is_err());

        bridge.create_plan("rc filter").await.unwrap();
        let target = bridge.create_schematic("plan_001").await.unwrap();
        assert_eq!(target["library"], "work_lib");
    }

    #[tokio::test]
    async fn created_schematic_is_open_for_editing() {
        let bridge = MockDesignBridge::new();
        bridge.create_plan("rc filter").await.unwrap();
        bridge.create_schematic("plan_001").await.unwrap();

        let open = bridge.current_design().await.unwrap().unwrap();
        assert_eq!(open["cell"], "plan_001_schematic");

        let spec = ComponentSpec {
            kind: "resistor".into(),
            name: "R1".into(),
            value: Some("10k".into()),
        };
        bridge.add_component(&spec).await.unwrap();
        bridge.save_design().await.unwrap();
        assert_eq!(bridge.placed_count(), 1);
    }

    #[tokio::test]
    async fn components_need_an_open_design() {
        let bridge = MockDesignBridge::new();
        let spec = ComponentSpec {
            kind: "resistor".into(),
            name: "R1".into(),
            value: Some("10k".into()),
        };
        assert!(bridge.add_component(&spec).await.is_err());

        bridge.open_design("rf_lib", "lna_v2").await.unwrap();
        bridge.add_component(&spec).await.unwrap();
        assert_eq!(bridge.placed_count(), 1);
    }

    #[tokio::test]
    async fn disconnected_bridge_fails_everything() {
        let bridge = MockDesignBridge::new();
        bridge.set_connected(false);
        assert!(!bridge.check_connection().await.unwrap());
        assert!(matches!(
            bridge.project_structure().await.unwrap_err(),
            ToolError::BridgeUnavailable(_)
        ));
    }
}
