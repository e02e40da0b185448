//! # Benchpilot Core
//!
//! Domain types, traits, and error definitions for the benchpilot agent
//! execution controller. This crate has **zero framework dependencies** — it
//! defines the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! The controller's external collaborators (the language model, the tool
//! implementations, the workflow-context store) are defined as traits here.
//! Implementations live in their respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod message;
pub mod outcome;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, Result, SessionError, StoreError, ToolError};
pub use message::{Conversation, Message, MessageToolCall, Role, SessionId};
pub use outcome::{ToolOutcome, ToolStatus};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage};
pub use tool::{Tool, ToolCall, ToolRegistry};
