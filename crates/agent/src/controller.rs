//! The agent controller and its turn loop.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, info, warn};

use benchpilot_core::{
    Message, Provider, ProviderRequest, Result, SessionError, ToolRegistry,
};
use benchpilot_guard::{GuardVerdict, TerminationReason, classify_post_execution};
use benchpilot_session::{Session, SessionManager};
use benchpilot_workflow::apply_tool_effect;

use crate::status::WorkflowStatus;

/// Message returned when the per-turn provider round-trip ceiling is hit.
const TURN_CEILING_MESSAGE: &str =
    "I've made a lot of tool calls without reaching a stopping point. Please simplify \
     your request or break it into smaller steps.";

/// Controller settings, independent of any config file format.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Model identifier passed to the provider.
    pub model: String,

    /// Sampling temperature.
    pub temperature: f32,

    /// Maximum tokens per completion.
    pub max_tokens: Option<u32>,

    /// Maximum provider round-trips per user turn.
    pub max_turns: u32,

    /// Base system prompt, prepended before the workflow phase guidance.
    pub system_prompt: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            model: "qwen-plus".to_string(),
            temperature: 0.7,
            max_tokens: Some(4096),
            max_turns: 10,
            system_prompt: "You are BenchPilot, an assistant for analog and RF circuit \
                            design. Use the available tools to plan, create, and populate \
                            designs. Follow the workflow guidance below."
                .to_string(),
        }
    }
}

impl From<&benchpilot_config::AgentSettings> for ControllerConfig {
    fn from(settings: &benchpilot_config::AgentSettings) -> Self {
        let defaults = ControllerConfig::default();
        Self {
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: Some(settings.max_tokens),
            max_turns: settings.max_turns,
            system_prompt: settings
                .system_prompt
                .clone()
                .unwrap_or(defaults.system_prompt),
        }
    }
}

/// What one user turn produced.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The user-facing response text.
    pub response: String,

    /// The session this turn ran in (echoed back so callers can resume).
    pub session_id: String,

    /// Why the turn's tool loop stopped.
    pub termination_reason: TerminationReason,
}

/// Orchestrates sessions, the provider, the tool registry, and the
/// per-session workflow and guard.
pub struct AgentController {
    provider: Arc<dyn Provider>,
    tools: Arc<ToolRegistry>,
    sessions: Arc<SessionManager>,
    config: ControllerConfig,
}

impl AgentController {
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        sessions: Arc<SessionManager>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            provider,
            tools,
            sessions,
            config,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Run one user turn: append the message, loop the model against the
    /// phase-scoped tools until a termination condition fires, and return
    /// the final response.
    pub async fn handle_turn(
        &self,
        session_id: Option<&str>,
        user_message: &str,
    ) -> Result<TurnOutcome> {
        let entry = self.sessions.get_or_create(session_id).await?;
        let mut session = entry.lock().await;
        let session_id = session.id.as_str().to_string();

        session.touch();
        session.conversation.push(Message::user(user_message));
        info!(session_id = %session_id, state = %session.workflow.state(), "user turn started");

        let outcome = self.run_turn_loop(&mut session, &session_id).await;

        if let Err(e) = self.sessions.persist(&session).await {
            warn!(session_id = %session_id, error = %e, "failed to persist workflow context");
        }
        info!(
            session_id = %session_id,
            reason = %outcome.termination_reason,
            state = %session.workflow.state(),
            "user turn finished"
        );
        Ok(outcome)
    }

    async fn run_turn_loop(&self, session: &mut Session, session_id: &str) -> TurnOutcome {
        for turn in 0..self.config.max_turns {
            let system = format!(
                "{}\n\n{}",
                self.config.system_prompt,
                session.workflow.state_prompt()
            );
            session.conversation.set_system_message(system);

            let allowed = session.workflow.allowed_tools();
            let definitions = self
                .tools
                .definitions()
                .into_iter()
                .filter(|d| allowed.iter().any(|a| a == &d.name))
                .collect();

            let request = ProviderRequest {
                model: self.config.model.clone(),
                messages: session.conversation.messages.clone(),
                temperature: self.config.temperature,
                max_tokens: self.config.max_tokens,
                tools: definitions,
            };

            let response = match self.provider.complete(request).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(session_id = %session_id, error = %e, "provider request failed");
                    let text = format!("The model request failed: {e}");
                    session.conversation.push(Message::assistant(text.clone()));
                    return TurnOutcome {
                        response: text,
                        session_id: session_id.to_string(),
                        termination_reason: TerminationReason::Error,
                    };
                }
            };

            let assistant = response.message;
            session.conversation.push(assistant.clone());

            if assistant.tool_calls.is_empty() {
                debug!(session_id = %session_id, turn, "model finished with text");
                return TurnOutcome {
                    response: assistant.content,
                    session_id: session_id.to_string(),
                    termination_reason: TerminationReason::TaskCompleted,
                };
            }

            let mut halt: Option<(TerminationReason, String)> = None;
            for call in &assistant.tool_calls {
                if halt.is_some() {
                    // The turn already ended; later calls in the batch are
                    // acknowledged but never run.
                    session.conversation.push(Message::tool_result(
                        &call.id,
                        "Skipped: the turn ended before this call could run.",
                    ));
                    continue;
                }
                halt = self.execute_tool_call(session, call).await;
            }

            if let Some((reason, response)) = halt {
                return TurnOutcome {
                    response,
                    session_id: session_id.to_string(),
                    termination_reason: reason,
                };
            }
        }

        warn!(session_id = %session_id, max_turns = self.config.max_turns, "turn ceiling reached");
        session
            .conversation
            .push(Message::assistant(TURN_CEILING_MESSAGE));
        TurnOutcome {
            response: TURN_CEILING_MESSAGE.to_string(),
            session_id: session_id.to_string(),
            termination_reason: TerminationReason::ToolCallLimitReached,
        }
    }

    /// Run one tool call through visibility, the guard, interception, and
    /// dispatch. Returns a termination decision if this call ends the turn.
    async fn execute_tool_call(
        &self,
        session: &mut Session,
        call: &benchpilot_core::MessageToolCall,
    ) -> Option<(TerminationReason, String)> {
        let arguments: Value = serde_json::from_str(&call.arguments).unwrap_or_else(|e| {
            warn!(tool_name = %call.name, error = %e, "malformed tool arguments, using empty object");
            json!({})
        });

        // Phase scoping first: an out-of-phase call costs no guard budget
        // and does not end the turn, the model just gets told no.
        if !session.workflow.is_allowed(&call.name) {
            debug!(tool_name = %call.name, state = %session.workflow.state(), "tool not visible in phase");
            let denial = json!({
                "status": "failure",
                "summary": format!(
                    "The tool '{}' is not available in the current workflow phase ('{}').",
                    call.name,
                    session.workflow.state()
                ),
            });
            session
                .conversation
                .push(Message::tool_result(&call.id, denial.to_string()));
            return None;
        }

        let verdict = session.guard.record_and_check(&call.name, &arguments);
        let halt_after = match verdict {
            GuardVerdict::Deny { reason, message } => {
                session
                    .conversation
                    .push(Message::tool_result(&call.id, message.clone()));
                return Some((reason, message));
            }
            GuardVerdict::AllowThenHalt { reason, message } => Some((reason, message)),
            GuardVerdict::Allow => None,
        };

        // Workflow control tools act on session state the registry cannot
        // reach, so they are handled here instead of dispatched.
        match call.name.as_str() {
            "get_workflow_status" => {
                let status = WorkflowStatus::of(session).to_json();
                session
                    .conversation
                    .push(Message::tool_result(&call.id, status.to_string()));
                return halt_after;
            }
            "reset_workflow" => {
                session.workflow.reset();
                session.guard.reset();
                session.conversation.push(Message::tool_result(
                    &call.id,
                    json!({"status": "success", "summary": "workflow reset to idle"}).to_string(),
                ));
                return None;
            }
            _ => {}
        }

        match self.tools.execute(&call.name, arguments).await {
            Ok(outcome) => {
                apply_tool_effect(&mut session.workflow, &call.name, &outcome);
                session
                    .conversation
                    .push(Message::tool_result(&call.id, outcome.to_transcript()));

                if let Some((reason, note)) = classify_post_execution(&call.name, &outcome) {
                    return Some((reason, termination_response(&outcome, &note)));
                }
                halt_after
            }
            Err(e) => {
                warn!(tool_name = %call.name, error = %e, "tool execution error");
                session.conversation.push(Message::tool_result(
                    &call.id,
                    format!("Error executing '{}': {e}", call.name),
                ));
                halt_after
            }
        }
    }

    /// Reset a session's workflow without running a model turn.
    pub async fn reset_workflow(&self, session_id: &str) -> Result<()> {
        let entry = self
            .sessions
            .get(session_id)
            .await?
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;
        let mut session = entry.lock().await;
        session.workflow.reset();
        session.guard.reset();
        session.touch();
        self.sessions.persist(&session).await
    }

    /// Workflow status for a session, for status endpoints.
    pub async fn get_status(&self, session_id: &str) -> Result<WorkflowStatus> {
        let entry = self
            .sessions
            .get(session_id)
            .await?
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;
        let session = entry.lock().await;
        Ok(WorkflowStatus::of(&session))
    }
}

/// User-facing text for a turn ended by a tool's own outcome: the outcome's
/// summary (with the plan id, when one was produced) plus its follow-up
/// instruction. The classifier note is the fallback for an empty summary.
fn termination_response(outcome: &benchpilot_core::ToolOutcome, note: &str) -> String {
    let mut text = if outcome.summary.is_empty() {
        note.to_string()
    } else {
        outcome.summary.clone()
    };
    if let Some(plan_id) = outcome
        .data
        .as_ref()
        .and_then(|d| d.get("plan_id"))
        .and_then(Value::as_str)
    {
        text.push_str(&format!(" (plan {plan_id})"));
    }
    if let Some(instruction) = &outcome.instruction {
        text.push_str("\n\n");
        text.push_str(instruction);
    }
    text
}
