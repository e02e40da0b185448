//! # Benchpilot Guard
//!
//! Runaway protection for the agent loop. Three independent brakes:
//!
//! - **per-tool quota**: a single tool may only be called so many times
//!   per session
//! - **total quota**: a hard ceiling on tool calls per session
//! - **loop detection**: the same tool called with the same arguments too
//!   many times in a row is treated as a stuck loop
//!
//! Quota violations deny the call before it runs; loop detection lets the
//! tripping call execute and halts the turn afterwards, so its result still
//! reaches the transcript. Counters span the whole session and only go up;
//! they clear only on an explicit workflow or conversation reset.
//!
//! The crate also owns [`TerminationReason`] and the post-execution
//! classifier that decides when a tool's own outcome ends the turn.

pub mod classify;
pub mod guard;
pub mod limits;
pub mod termination;

pub use classify::{classify_post_execution, is_confirmation_tool, is_terminating_tool};
pub use guard::{GuardVerdict, LoopGuard};
pub use limits::GuardLimits;
pub use termination::TerminationReason;
