//! # Authgate Core
//!
//! `authgate-core` provides the foundational traits and types for the Authgate OAuth2 gateway.
//! It defines identities, errors, cookie directives and the contract an identity provider
//! has to fulfil; the flow, session and web crates all build on these.

#![warn(missing_docs)]

use async_trait::async_trait;

/// Errors that can occur during the authentication process.
pub mod error;
pub use crate::error::AuthError;

/// Identity claims returned by providers.
pub mod state;
pub use crate::state::Identity;

/// Cookie directives shared by the flow and the web adapters.
pub mod cookie;
pub use crate::cookie::{CookieDirective, SameSite};

/// Random tokens and constant-time comparison.
pub mod token;

pub use url;

/// Trait for an OAuth2 identity provider.
///
/// Implementations own the client credentials and the provider endpoints. The
/// callback URI is passed on every call because it is derived from the inbound
/// request rather than configured once.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Get the provider identifier.
    fn provider_id(&self) -> &str;

    /// Build the URL the client is redirected to in order to log in.
    fn authorization_url(&self, callback_uri: &str, state: &str) -> Result<url::Url, AuthError>;

    /// Exchange an authorization code for verified identity claims.
    ///
    /// Codes are single-use at the provider; callers must not retry with the same code.
    async fn exchange_code(&self, code: &str, callback_uri: &str) -> Result<Identity, AuthError>;
}

#[async_trait]
impl<T: IdentityProvider + ?Sized> IdentityProvider for std::sync::Arc<T> {
    fn provider_id(&self) -> &str {
        (**self).provider_id()
    }

    fn authorization_url(&self, callback_uri: &str, state: &str) -> Result<url::Url, AuthError> {
        (**self).authorization_url(callback_uri, state)
    }

    async fn exchange_code(&self, code: &str, callback_uri: &str) -> Result<Identity, AuthError> {
        (**self).exchange_code(code, callback_uri).await
    }
}

#[async_trait]
impl<T: IdentityProvider + ?Sized> IdentityProvider for Box<T> {
    fn provider_id(&self) -> &str {
        (**self).provider_id()
    }

    fn authorization_url(&self, callback_uri: &str, state: &str) -> Result<url::Url, AuthError> {
        (**self).authorization_url(callback_uri, state)
    }

    async fn exchange_code(&self, code: &str, callback_uri: &str) -> Result<Identity, AuthError> {
        (**self).exchange_code(code, callback_uri).await
    }
}
