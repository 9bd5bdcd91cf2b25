use crate::{AuthError, Session, SessionStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// A session store kept in process memory.
///
/// Suitable for tests and single-instance deployments. Entries past their TTL are
/// invisible to [`SessionStore::get`] and are purged on the next write.
#[derive(Default)]
pub struct MemoryStore {
    sessions: RwLock<HashMap<String, (Session, DateTime<Utc>)>>,
}

impl MemoryStore {
    /// Number of entries currently held, expired ones included.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether the store holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn put(
        &self,
        id: &str,
        session: &Session,
        ttl: chrono::Duration,
    ) -> Result<(), AuthError> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, (_, deadline)| *deadline > now);
        sessions.insert(id.to_string(), (session.clone(), now + ttl));
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Session>, AuthError> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(id)
            .filter(|(_, deadline)| *deadline > Utc::now())
            .map(|(session, _)| session.clone()))
    }

    async fn delete(&self, id: &str) -> Result<(), AuthError> {
        self.sessions.write().await.remove(id);
        Ok(())
    }
}
