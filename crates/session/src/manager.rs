//! The session manager: creation, lookup, expiry, eviction, persistence.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use benchpilot_core::{Result, SessionError, SessionId};
use benchpilot_guard::GuardLimits;
use benchpilot_workflow::ContextStore;

use crate::session::{Session, SessionSummary};

/// Lifecycle settings for the session population.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Idle seconds after which a session expires.
    pub expiration_secs: i64,

    /// Maximum live sessions; creating past this evicts the
    /// least-recently-active session.
    pub capacity: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            expiration_secs: 1800,
            capacity: 100,
        }
    }
}

/// Owns every live session.
///
/// Sessions are held as `Arc<Mutex<Session>>`: the outer `RwLock` guards
/// the map for short lookups, the per-session mutex serializes turns so
/// concurrent requests to the same session run one at a time while
/// different sessions proceed in parallel.
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Arc<Mutex<Session>>>>,
    settings: SessionSettings,
    limits: GuardLimits,
    store: Option<Arc<dyn ContextStore>>,
}

impl SessionManager {
    pub fn new(settings: SessionSettings, limits: GuardLimits) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            settings,
            limits,
            store: None,
        }
    }

    /// Attach a persistence backend for workflow contexts.
    pub fn with_store(mut self, store: Arc<dyn ContextStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Create a brand-new session, sweeping expired sessions first and
    /// evicting the least-recently-active one if at capacity.
    pub async fn create(&self) -> Result<Arc<Mutex<Session>>> {
        let id = SessionId::new();
        self.insert_session(id, None).await
    }

    /// Look up a live session. Expired sessions are removed lazily here
    /// and reported as absent.
    pub async fn get(&self, session_id: &str) -> Result<Option<Arc<Mutex<Session>>>> {
        let entry = {
            let sessions = self.sessions.read().await;
            sessions.get(session_id).cloned()
        };
        let Some(entry) = entry else {
            return Ok(None);
        };

        let expired = {
            let session = entry.lock().await;
            session.idle_secs() > self.settings.expiration_secs
        };
        if expired {
            info!(session_id = %session_id, "session expired, removing");
            self.remove(session_id).await?;
            return Ok(None);
        }
        Ok(Some(entry))
    }

    /// Fetch `session_id` if it is live; otherwise create a session under
    /// that id, restoring persisted workflow context when available.
    /// With no id, always create a fresh session.
    pub async fn get_or_create(&self, session_id: Option<&str>) -> Result<Arc<Mutex<Session>>> {
        let Some(session_id) = session_id else {
            return self.create().await;
        };

        if let Some(entry) = self.get(session_id).await? {
            return Ok(entry);
        }

        let restored = match &self.store {
            Some(store) => store.load(session_id).await?,
            None => None,
        };
        if restored.is_some() {
            info!(session_id = %session_id, "restoring session from persisted workflow context");
        }
        self.insert_session(SessionId::from(session_id), restored)
            .await
    }

    /// Delete a session and its persisted context.
    pub async fn delete(&self, session_id: &str) -> Result<()> {
        let removed = {
            let mut sessions = self.sessions.write().await;
            sessions.remove(session_id).is_some()
        };
        if let Some(store) = &self.store {
            store.delete(session_id).await?;
        }
        if !removed {
            return Err(SessionError::NotFound(session_id.to_string()).into());
        }
        Ok(())
    }

    /// Summaries of every live session.
    pub async fn list(&self) -> Vec<SessionSummary> {
        let entries: Vec<Arc<Mutex<Session>>> = {
            let sessions = self.sessions.read().await;
            sessions.values().cloned().collect()
        };
        let mut summaries = Vec::with_capacity(entries.len());
        for entry in entries {
            summaries.push(entry.lock().await.summary());
        }
        summaries
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Persist one session's workflow context, if a store is attached.
    pub async fn persist(&self, session: &Session) -> Result<()> {
        if let Some(store) = &self.store {
            store
                .save(session.id.as_str(), session.workflow.context())
                .await?;
        }
        Ok(())
    }

    async fn insert_session(
        &self,
        id: SessionId,
        restored: Option<benchpilot_workflow::WorkflowContext>,
    ) -> Result<Arc<Mutex<Session>>> {
        self.sweep_expired().await;
        self.evict_if_full().await;

        let session = match restored {
            Some(context) => Session::with_workflow_context(id.clone(), self.limits, context),
            None => Session::new(id.clone(), self.limits),
        };
        let entry = Arc::new(Mutex::new(session));
        {
            let mut sessions = self.sessions.write().await;
            sessions.insert(id.as_str().to_string(), entry.clone());
        }
        debug!(session_id = %id, "session created");
        Ok(entry)
    }

    async fn remove(&self, session_id: &str) -> Result<()> {
        {
            let mut sessions = self.sessions.write().await;
            sessions.remove(session_id);
        }
        if let Some(store) = &self.store {
            store.delete(session_id).await?;
        }
        Ok(())
    }

    /// Drop every session idle past the expiration threshold.
    async fn sweep_expired(&self) {
        let mut expired: Vec<String> = Vec::new();
        {
            let sessions = self.sessions.read().await;
            for (id, entry) in sessions.iter() {
                // A locked session is mid-turn and by definition active.
                if let Ok(session) = entry.try_lock() {
                    if session.idle_secs() > self.settings.expiration_secs {
                        expired.push(id.clone());
                    }
                }
            }
        }
        for id in expired {
            info!(session_id = %id, "sweeping expired session");
            if let Err(e) = self.remove(&id).await {
                warn!(session_id = %id, error = %e, "failed to remove expired session");
            }
        }
    }

    /// At capacity, evict the least-recently-active unlocked session.
    async fn evict_if_full(&self) {
        let victim: Option<String> = {
            let sessions = self.sessions.read().await;
            if sessions.len() < self.settings.capacity {
                None
            } else {
                let mut oldest: Option<(String, chrono::DateTime<chrono::Utc>)> = None;
                for (id, entry) in sessions.iter() {
                    if let Ok(session) = entry.try_lock() {
                        let stamp = session.last_activity;
                        match &oldest {
                            Some((_, best)) if *best <= stamp => {}
                            _ => oldest = Some((id.clone(), stamp)),
                        }
                    }
                }
                oldest.map(|(id, _)| id)
            }
        };
        if let Some(id) = victim {
            warn!(session_id = %id, capacity = self.settings.capacity, "capacity reached, evicting least-recently-active session");
            if let Err(e) = self.remove(&id).await {
                warn!(session_id = %id, error = %e, "failed to evict session");
            }
        }
    }
}
