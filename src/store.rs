//! Session-keyed storage for the presentation layer.
//!
//! Each user gets an independent [`AdaptiveSession`] behind its own lock, so
//! requests for different users never contend on session state while
//! requests for the same user are serialized.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::bank::QuestionBank;
use crate::engine::{AdaptiveSession, EngineConfig, EngineError};

#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<AdaptiveSession>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session for `user_id` and return its self-assessment batch.
    /// An existing session for the same user is replaced.
    pub fn start(
        &self,
        user_id: &str,
        bank: Arc<QuestionBank>,
        config: EngineConfig,
    ) -> Result<Vec<String>, EngineError> {
        let mut session = AdaptiveSession::new(bank, config)?;
        let batch = session.self_assessment_emit()?;
        self.insert(user_id, session);
        Ok(batch)
    }

    pub fn insert(&self, user_id: &str, session: AdaptiveSession) {
        let replaced = self
            .sessions
            .write()
            .insert(user_id.to_string(), Arc::new(Mutex::new(session)));
        if replaced.is_some() {
            tracing::warn!(user_id, "existing session replaced");
        }
    }

    /// Run `f` against the user's session; `None` if there is no such session.
    pub fn with_session<R>(
        &self,
        user_id: &str,
        f: impl FnOnce(&mut AdaptiveSession) -> R,
    ) -> Option<R> {
        let session = self.sessions.read().get(user_id).cloned()?;
        let mut guard = session.lock();
        Some(f(&mut guard))
    }

    /// Remove the user's session and hand it back.
    pub fn finish(&self, user_id: &str) -> Option<AdaptiveSession> {
        let session = self.sessions.write().remove(user_id)?;
        match Arc::try_unwrap(session) {
            Ok(mutex) => Some(mutex.into_inner()),
            Err(_) => {
                tracing::warn!(user_id, "session still in use at finish; dropped from store");
                None
            }
        }
    }

    pub fn evict(&self, user_id: &str) -> bool {
        let removed = self.sessions.write().remove(user_id).is_some();
        if removed {
            tracing::debug!(user_id, "session evicted");
        }
        removed
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.sessions.read().contains_key(user_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}
