//! A single session: conversation, workflow, and guard under one id.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use benchpilot_core::{Conversation, SessionId};
use benchpilot_guard::{GuardLimits, LoopGuard};
use benchpilot_workflow::{WorkflowContext, WorkflowMachine, WorkflowState};

/// All state belonging to one logical conversation.
#[derive(Debug)]
pub struct Session {
    pub id: SessionId,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub conversation: Conversation,
    pub workflow: WorkflowMachine,
    pub guard: LoopGuard,
    /// Free-form caller metadata (client name, project, etc.).
    pub metadata: HashMap<String, String>,
}

impl Session {
    pub fn new(id: SessionId, limits: GuardLimits) -> Self {
        let now = Utc::now();
        Self {
            id,
            created_at: now,
            last_activity: now,
            conversation: Conversation::new(),
            workflow: WorkflowMachine::new(),
            guard: LoopGuard::new(limits),
            metadata: HashMap::new(),
        }
    }

    /// Rebuild a session around persisted workflow context. The
    /// conversation starts empty; only the workflow survives restarts.
    pub fn with_workflow_context(
        id: SessionId,
        limits: GuardLimits,
        context: WorkflowContext,
    ) -> Self {
        let mut session = Self::new(id, limits);
        session.workflow = WorkflowMachine::from_context(context);
        session
    }

    /// Mark the session as active now.
    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Seconds since the last activity.
    pub fn idle_secs(&self) -> i64 {
        (Utc::now() - self.last_activity).num_seconds()
    }

    /// Drop the conversation and guard counters but keep the workflow
    /// and identity.
    pub fn clear_conversation(&mut self) {
        self.conversation = Conversation::new();
        self.guard.reset();
        self.touch();
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            created_at: self.created_at,
            last_activity: self.last_activity,
            message_count: self.conversation.len(),
            state: self.workflow.state(),
            idle_secs: self.idle_secs(),
        }
    }
}

/// Lightweight view of a session for listings and status endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub id: SessionId,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub message_count: usize,
    pub state: WorkflowState,
    pub idle_secs: i64,
}
