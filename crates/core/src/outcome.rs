//! The structured tool result envelope.
//!
//! Every tool returns a [`ToolOutcome`] rather than raw text. The status
//! field drives the controller's post-execution decisions (workflow
//! advancement, turn termination); the summary and optional instruction
//! are what the model actually sees in the transcript.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Coarse classification of a tool execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    /// The tool did what was asked.
    Success,
    /// The tool ran but the operation failed.
    Failure,
    /// The tool produced a proposal that needs the user's sign-off
    /// before the agent may proceed.
    RequiresConfirmation,
}

impl std::fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolStatus::Success => write!(f, "success"),
            ToolStatus::Failure => write!(f, "failure"),
            ToolStatus::RequiresConfirmation => write!(f, "requires_confirmation"),
        }
    }
}

/// Structured result of a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutcome {
    /// How the execution went.
    pub status: ToolStatus,

    /// Human/model-readable summary of what happened.
    pub summary: String,

    /// Structured payload for downstream consumers (workflow effects,
    /// status queries). Not required to be present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Follow-up guidance injected into the transcript alongside the
    /// result, steering the model's next step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
}

impl ToolOutcome {
    pub fn success(summary: impl Into<String>) -> Self {
        Self {
            status: ToolStatus::Success,
            summary: summary.into(),
            data: None,
            instruction: None,
        }
    }

    pub fn failure(summary: impl Into<String>) -> Self {
        Self {
            status: ToolStatus::Failure,
            summary: summary.into(),
            data: None,
            instruction: None,
        }
    }

    pub fn requires_confirmation(summary: impl Into<String>) -> Self {
        Self {
            status: ToolStatus::RequiresConfirmation,
            summary: summary.into(),
            data: None,
            instruction: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = Some(instruction.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == ToolStatus::Success
    }

    /// Render the outcome as the JSON string pushed into the transcript
    /// as a tool-result message.
    pub fn to_transcript(&self) -> String {
        let mut obj = serde_json::Map::new();
        obj.insert("status".into(), Value::String(self.status.to_string()));
        obj.insert("summary".into(), Value::String(self.summary.clone()));
        if let Some(data) = &self.data {
            obj.insert("data".into(), data.clone());
        }
        if let Some(instruction) = &self.instruction {
            obj.insert("instruction".into(), Value::String(instruction.clone()));
        }
        Value::Object(obj).to_string()
    }
}
