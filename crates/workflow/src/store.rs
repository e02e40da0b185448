//! Workflow context persistence.
//!
//! A [`ContextStore`] keeps per-session workflow context across process
//! restarts. The shipped implementation is [`DirContextStore`]: one JSON
//! file per session under a directory. Conversations are deliberately not
//! persisted; only the workflow context survives a restart.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, warn};

use benchpilot_core::StoreError;

use crate::context::WorkflowContext;

/// Persistence interface for workflow contexts.
#[async_trait]
pub trait ContextStore: Send + Sync {
    /// Load the context for `session_id`, if one was saved.
    async fn load(&self, session_id: &str) -> Result<Option<WorkflowContext>, StoreError>;

    /// Save the context for `session_id`, replacing any previous one.
    async fn save(&self, session_id: &str, context: &WorkflowContext) -> Result<(), StoreError>;

    /// Delete the saved context for `session_id`. Missing is not an error.
    async fn delete(&self, session_id: &str) -> Result<(), StoreError>;
}

/// File-per-session store under a single directory.
pub struct DirContextStore {
    dir: PathBuf,
}

impl DirContextStore {
    /// Create a store rooted at `dir`. The directory is created on first
    /// save, not here.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, session_id: &str) -> PathBuf {
        // Session ids come from uuids but may also arrive from clients;
        // strip anything that could escape the directory.
        let safe: String = session_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

#[async_trait]
impl ContextStore for DirContextStore {
    async fn load(&self, session_id: &str) -> Result<Option<WorkflowContext>, StoreError> {
        let path = self.path_for(session_id);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io(e.to_string())),
        };

        match serde_json::from_str(&raw) {
            Ok(context) => {
                debug!(session_id = %session_id, "loaded workflow context");
                Ok(Some(context))
            }
            Err(e) => {
                // A corrupt file should not take the session down with it.
                warn!(session_id = %session_id, error = %e, "corrupt workflow context, ignoring");
                Ok(None)
            }
        }
    }

    async fn save(&self, session_id: &str, context: &WorkflowContext) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;

        let path = self.path_for(session_id);
        let json = serde_json::to_string_pretty(context)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        tokio::fs::write(&path, json)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
        debug!(session_id = %session_id, path = %path.display(), "saved workflow context");
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<(), StoreError> {
        let path = self.path_for(session_id);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::states::WorkflowState;
    use tempfile::TempDir;

    #[tokio::test]
    async fn save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = DirContextStore::new(dir.path());

        let mut ctx = WorkflowContext::new();
        ctx.state = WorkflowState::Populating;
        ctx.plan_id = Some("plan_001".into());

        store.save("session_abc", &ctx).await.unwrap();
        let loaded = store.load("session_abc").await.unwrap().unwrap();
        assert_eq!(loaded.state, WorkflowState::Populating);
        assert_eq!(loaded.plan_id.as_deref(), Some("plan_001"));
    }

    #[tokio::test]
    async fn load_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let store = DirContextStore::new(dir.path());
        assert!(store.load("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn corrupt_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        let store = DirContextStore::new(dir.path());
        tokio::fs::write(dir.path().join("bad.json"), "{not json")
            .await
            .unwrap();

        assert!(store.load("bad").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = DirContextStore::new(dir.path());

        store
            .save("session_abc", &WorkflowContext::new())
            .await
            .unwrap();
        store.delete("session_abc").await.unwrap();
        store.delete("session_abc").await.unwrap();
        assert!(store.load("session_abc").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn path_traversal_is_neutralized() {
        let dir = TempDir::new().unwrap();
        let store = DirContextStore::new(dir.path());

        store
            .save("../escape", &WorkflowContext::new())
            .await
            .unwrap();
        // The file must land inside the store directory.
        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(entries, vec!["___escape.json"]);
    }
}
