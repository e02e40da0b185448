//! # Benchpilot Session
//!
//! Per-session state and its lifecycle. A session binds together one
//! conversation, one workflow machine, and one loop guard; the
//! [`SessionManager`] owns the whole population, enforcing idle expiry
//! and a capacity ceiling with least-recently-active eviction.
//!
//! Conversations live only in memory. Workflow context can optionally be
//! persisted through a [`benchpilot_workflow::ContextStore`], so a
//! restarted process resumes sessions mid-workflow with an empty
//! transcript.

pub mod manager;
pub mod session;

pub use manager::{SessionManager, SessionSettings};
pub use session::{Session, SessionSummary};
