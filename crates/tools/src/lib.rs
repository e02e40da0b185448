//! # Benchpilot Tools
//!
//! Built-in tool implementations. The design tools are thin adapters over
//! a [`DesignBridge`], the interface to the CAD backend; everything
//! backend-specific lives behind that trait, with [`MockDesignBridge`]
//! standing in for tests and offline development.

pub mod bridge;
pub mod control;
pub mod design;
pub mod instrument;
pub mod web_search;

use std::sync::Arc;

use benchpilot_core::ToolRegistry;

pub use bridge::{DesignBridge, MockDesignBridge};
pub use instrument::InstrumentControlTool;
pub use web_search::WebSearchTool;

/// Build a registry holding every built-in tool, wired to `bridge`.
pub fn builtin_registry(bridge: Arc<dyn DesignBridge>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    for tool in design::design_tools(bridge) {
        registry.register(tool);
    }
    registry.register(Box::new(control::ResetWorkflowTool));
    registry.register(Box::new(control::GetWorkflowStatusTool));
    registry.register(Box::new(WebSearchTool::new()));
    registry.register(Box::new(InstrumentControlTool::new()));
    registry
}
