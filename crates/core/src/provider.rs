//! Provider trait: the interface to language model backends.
//!
//! The controller is provider-agnostic. Anything that can take a
//! transcript plus a set of tool definitions and return an assistant
//! message can drive it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProviderError;
use crate::message::Message;

/// A request to a language model provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// Model identifier (e.g. "qwen-plus")
    pub model: String,

    /// Conversation transcript, in order.
    pub messages: Vec<Message>,

    /// Sampling temperature.
    pub temperature: f32,

    /// Maximum tokens to generate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Tool definitions the model may call this turn. Already filtered
    /// to the current workflow phase by the caller.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

/// A tool definition advertised to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema for the tool's arguments.
    pub parameters: Value,
}

/// Token usage reported by a provider.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A response from a language model provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// The assistant message, possibly carrying tool calls.
    pub message: Message,

    /// Which model actually served the request.
    pub model: String,

    /// Token usage, if the provider reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// Interface all language model backends implement.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name, for logging and configuration.
    fn name(&self) -> &str;

    /// Run one completion over the given transcript.
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError>;
}
