//! # Benchpilot Agent
//!
//! The controller that ties everything together. One call to
//! [`AgentController::handle_turn`] runs a full think/execute/feedback
//! cycle for a session: the model sees the transcript plus the current
//! phase's tools, its tool calls are policed by the workflow machine and
//! the loop guard, outcomes feed back into the transcript and the
//! workflow, and the turn ends with a classified termination reason.

pub mod controller;
pub mod status;

pub use controller::{AgentController, ControllerConfig, TurnOutcome};
pub use status::WorkflowStatus;
