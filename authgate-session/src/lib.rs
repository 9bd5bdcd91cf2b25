//! # Authgate Session
//!
//! Server-side sessions produced by a successful login: the [`Session`] record, the
//! [`SessionStore`] contract, the cookie settings in [`SessionConfig`] and the
//! [`SessionIssuer`] that ties them together.
//!
//! Two stores are provided: [`MemoryStore`] and, behind the `store-redis` feature,
//! [`RedisStore`].

#![warn(missing_docs)]

use async_trait::async_trait;
pub use authgate_core::{AuthError, CookieDirective, Identity, SameSite};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Creates sessions and their cookies.
pub mod issuer;
/// In-process session store.
pub mod memory;
/// Redis-backed session store.
#[cfg(feature = "store-redis")]
pub mod redis_store;

pub use issuer::SessionIssuer;
pub use memory::MemoryStore;
#[cfg(feature = "store-redis")]
pub use redis_store::RedisStore;

/// A server-side session, one per successful authentication.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque random identifier; the only thing the client ever holds.
    pub id: String,
    /// Who logged in.
    pub identity: Identity,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session stops being valid.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Whether the session has passed its expiry.
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    /// The full lifetime the session was issued with.
    pub fn ttl(&self) -> chrono::Duration {
        self.expires_at - self.created_at
    }
}

/// Key-value persistence for sessions with TTL-based expiry.
///
/// The store is responsible for expiring records; `get` must never return a
/// record whose TTL has elapsed.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Store a session under `id` for `ttl`.
    async fn put(&self, id: &str, session: &Session, ttl: chrono::Duration)
        -> Result<(), AuthError>;
    /// Load a live session.
    async fn get(&self, id: &str) -> Result<Option<Session>, AuthError>;
    /// Remove a session. Removing an unknown id is not an error.
    async fn delete(&self, id: &str) -> Result<(), AuthError>;
}

/// Configuration for the session cookie and record lifetime.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Name of the session cookie.
    pub cookie_name: String,
    /// Path the cookie is scoped to.
    pub path: String,
    /// Whether the cookie should only be sent over HTTPS.
    pub secure: bool,
    /// Whether the cookie is hidden from scripts.
    pub http_only: bool,
    /// Cross-site policy of the cookie.
    pub same_site: SameSite,
    /// Lifetime of both the stored record and the cookie.
    pub max_age: chrono::Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "SESSION-ID".to_string(),
            path: "/".to_string(),
            secure: true,
            http_only: true,
            same_site: SameSite::Lax,
            max_age: chrono::Duration::hours(24),
        }
    }
}

impl SessionConfig {
    /// Cookie directive carrying the given session id.
    pub fn cookie(&self, session_id: &str) -> CookieDirective {
        CookieDirective {
            name: self.cookie_name.clone(),
            value: session_id.to_string(),
            path: self.path.clone(),
            max_age: Some(self.max_age),
            secure: self.secure,
            http_only: self.http_only,
            same_site: self.same_site,
        }
    }

    /// Cookie directive that clears the session cookie.
    pub fn removal_cookie(&self) -> CookieDirective {
        CookieDirective {
            secure: self.secure,
            same_site: self.same_site,
            ..CookieDirective::removal(self.cookie_name.clone(), self.path.clone())
        }
    }
}
