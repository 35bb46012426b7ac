use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::RecommendationResult;
use crate::store::VectorStore;

/// Maps request session keys to store-side users.
///
/// The first request carrying a given key provisions a fresh user point with
/// the next session number; later requests with the same key resolve to the
/// same user.
pub struct SessionManager<S: VectorStore> {
    store: Arc<S>,
    sessions: Arc<RwLock<HashMap<String, Uuid>>>,
    next_session: Arc<AtomicI64>,
}

impl<S: VectorStore> Clone for SessionManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            sessions: Arc::clone(&self.sessions),
            next_session: Arc::clone(&self.next_session),
        }
    }
}

impl<S: VectorStore> SessionManager<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            next_session: Arc::new(AtomicI64::new(1)),
        }
    }

    /// Resolve a session key to its user id, creating the user on first sight.
    pub async fn resolve(&self, session_key: &str) -> RecommendationResult<Uuid> {
        {
            let sessions = self.sessions.read().await;
            if let Some(user_id) = sessions.get(session_key) {
                return Ok(*user_id);
            }
        }

        let mut sessions = self.sessions.write().await;
        // Re-check under the write lock: another request may have won the race.
        if let Some(user_id) = sessions.get(session_key) {
            return Ok(*user_id);
        }

        let session_number = self.next_session.fetch_add(1, Ordering::SeqCst);
        let user_id = self.store.create_user(session_number).await?;
        sessions.insert(session_key.to_string(), user_id);
        tracing::info!(user_id = %user_id, session_number, "Bootstrapped session");
        Ok(user_id)
    }
}
