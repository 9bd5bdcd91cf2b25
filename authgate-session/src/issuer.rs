use crate::{Session, SessionConfig, SessionStore};
use authgate_core::{token::generate_token, AuthError, CookieDirective, Identity};
use std::sync::Arc;

/// Turns verified identities into persisted sessions and session cookies.
#[derive(Clone)]
pub struct SessionIssuer {
    store: Arc<dyn SessionStore>,
    config: SessionConfig,
}

impl SessionIssuer {
    /// Create an issuer writing to `store` with the given cookie settings.
    pub fn new(store: Arc<dyn SessionStore>, config: SessionConfig) -> Self {
        Self { store, config }
    }

    /// The session cookie settings.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Create and persist a session for `identity`.
    ///
    /// The cookie directive is only produced once the store has accepted the
    /// record; a failed write yields [`AuthError::SessionPersist`] and nothing else.
    pub async fn create_session(
        &self,
        identity: Identity,
    ) -> Result<(Session, CookieDirective), AuthError> {
        let ttl = self.config.max_age;
        let now = chrono::Utc::now();
        let session = Session {
            id: generate_token(),
            identity,
            created_at: now,
            expires_at: now + ttl,
        };

        self.store
            .put(&session.id, &session, ttl)
            .await
            .map_err(|e| match e {
                AuthError::SessionPersist(msg) => AuthError::SessionPersist(msg),
                other => AuthError::SessionPersist(other.to_string()),
            })?;

        log::info!(
            "Session created for {}:{}",
            session.identity.provider_id,
            session.identity.subject
        );

        let cookie = self.config.cookie(&session.id);
        Ok((session, cookie))
    }

    /// Load a live session by id.
    pub async fn load_session(&self, id: &str) -> Result<Option<Session>, AuthError> {
        let session = self.store.get(id).await?;
        Ok(session.filter(|s| !s.is_expired()))
    }

    /// Delete a session and return the directive that clears its cookie.
    pub async fn invalidate(&self, id: &str) -> Result<CookieDirective, AuthError> {
        self.store.delete(id).await?;
        log::debug!("Session invalidated");
        Ok(self.config.removal_cookie())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use async_trait::async_trait;

    struct FailingStore;

    #[async_trait]
    impl SessionStore for FailingStore {
        async fn put(&self, _: &str, _: &Session, _: chrono::Duration) -> Result<(), AuthError> {
            Err(AuthError::Session("connection refused".into()))
        }

        async fn get(&self, _: &str) -> Result<Option<Session>, AuthError> {
            Ok(None)
        }

        async fn delete(&self, _: &str) -> Result<(), AuthError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_create_session_persists_record() {
        let store = Arc::new(MemoryStore::default());
        let issuer = SessionIssuer::new(store.clone(), SessionConfig::default());

        let (session, cookie) = issuer
            .create_session(Identity::new("google", "u1"))
            .await
            .unwrap();

        assert_eq!(cookie.value, session.id);
        assert_eq!(cookie.name, "SESSION-ID");
        let stored = store.get(&session.id).await.unwrap().unwrap();
        assert_eq!(stored.identity.subject, "u1");
    }

    fn memory_issuer() -> SessionIssuer {
        SessionIssuer::new(Arc::new(MemoryStore::default()), SessionConfig::default())
    }

    async fn login(issuer: &SessionIssuer, subject: &str) -> (Session, CookieDirective) {
        let identity = Identity::new("google", subject);
        issuer.create_session(identity).await.unwrap()
    }

    #[tokio::test]
    async fn test_cookie_never_carries_claims() {
        let issuer = memory_issuer();
        let identity = Identity::new("google", "subject-42").with_email("who@example.com");

        let (_, cookie) = issuer.create_session(identity).await.unwrap();

        assert!(!cookie.value.contains("subject-42"));
        assert!(!cookie.value.contains("who@example.com"));
    }

    #[tokio::test]
    async fn test_store_failure_yields_no_cookie() {
        let issuer = SessionIssuer::new(Arc::new(FailingStore), SessionConfig::default());

        let result = issuer.create_session(Identity::new("google", "u1")).await;

        assert!(matches!(result, Err(AuthError::SessionPersist(_))));
    }

    #[tokio::test]
    async fn test_session_ids_are_unique() {
        let issuer = memory_issuer();
        let (a, _) = login(&issuer, "u1").await;
        let (b, _) = login(&issuer, "u1").await;
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_invalidate_removes_session() {
        let issuer = memory_issuer();
        let (session, _) = login(&issuer, "u1").await;

        let removal = issuer.invalidate(&session.id).await.unwrap();

        assert!(removal.is_removal());
        assert!(issuer.load_session(&session.id).await.unwrap().is_none());
    }
}
