//! # Benchpilot Workflow
//!
//! The workflow state machine that carries a design session through its
//! phases, from idle through planning and population to completion.
//!
//! The machine does three jobs:
//! - tracks which phase the session is in and what design context it has
//!   accumulated (plan, target design, progress counters)
//! - scopes tool visibility: each phase exposes only the tools that make
//!   sense there, so the model cannot even attempt an out-of-phase action
//! - produces per-phase guidance text that the controller injects into the
//!   system message every turn
//!
//! Transitions are advisory rather than enforced: an off-graph transition
//! is logged and applied anyway, because the effects that drive transitions
//! only fire on successful tool outcomes and a hard rejection would wedge
//! the session. Tool visibility is the real enforcement surface.

pub mod context;
pub mod effects;
pub mod machine;
pub mod states;
pub mod store;

pub use context::{PlanData, PlannedComponent, WorkflowContext};
pub use effects::apply_tool_effect;
pub use machine::WorkflowMachine;
pub use states::{GLOBAL_TOOLS, WorkflowState};
pub use store::{ContextStore, DirContextStore};
