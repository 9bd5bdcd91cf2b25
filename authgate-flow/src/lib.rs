//! # Authgate Flow
//!
//! `authgate-flow` orchestrates the OAuth2 Authorization Code login of a gateway:
//! the client is sent to the identity provider with a CSRF state, comes back with a
//! code, and leaves with a server-side session.
//!
//! ## Key Components
//!
//! - **[`StateGuard`]**: issues and verifies the per-attempt CSRF state cookie.
//! - **[`AuthenticationFlow`]**: drives initiate → verify → exchange → commit.
//! - **[`AuthenticationFlowBuilder`]**: configures and creates an [`AuthenticationFlow`].
//!
//! The flow is framework-neutral: it returns [`FlowResponse`] redirects carrying
//! [`CookieDirective`](authgate_core::CookieDirective)s, which the web adapters apply.

#![warn(missing_docs)]

use authgate_core::IdentityProvider;
pub use authgate_session::{Session, SessionConfig, SessionIssuer, SessionStore};
use std::sync::Arc;
use std::time::Duration;

pub use chrono;

/// OAuth2 Authorization Code flow implementation.
pub mod oauth2;
/// CSRF state issuance and verification.
pub mod state_guard;

pub use oauth2::{AuthenticationFlow, CallbackParams, FlowConfig, FlowResponse};
pub use state_guard::{StateConfig, StateGuard};

/// Marker for a missing component in the typestate pattern.
#[derive(Clone, Default)]
pub struct Missing;

/// Marker for a configured component in the typestate pattern.
#[derive(Clone)]
pub struct Configured<T>(pub T);

impl AuthenticationFlow {
    /// Create a new [`AuthenticationFlowBuilder`] to configure the flow.
    pub fn builder() -> AuthenticationFlowBuilder<Missing, Missing> {
        AuthenticationFlowBuilder::default()
    }
}

/// A builder for configuring and creating an [`AuthenticationFlow`].
///
/// The provider and the session store are required; `build` only exists once both
/// are set.
pub struct AuthenticationFlowBuilder<P, S> {
    provider: P,
    session_store: S,
    session_config: SessionConfig,
    state_config: StateConfig,
    flow_config: FlowConfig,
}

impl Default for AuthenticationFlowBuilder<Missing, Missing> {
    fn default() -> Self {
        Self {
            provider: Missing,
            session_store: Missing,
            session_config: SessionConfig::default(),
            state_config: StateConfig::default(),
            flow_config: FlowConfig::default(),
        }
    }
}

impl<P, S> AuthenticationFlowBuilder<P, S> {
    /// Set the identity provider.
    pub fn provider<I>(
        self,
        provider: I,
    ) -> AuthenticationFlowBuilder<Configured<Arc<dyn IdentityProvider>>, S>
    where
        I: IdentityProvider + 'static,
    {
        let provider: Arc<dyn IdentityProvider> = Arc::new(provider);
        AuthenticationFlowBuilder {
            provider: Configured(provider),
            session_store: self.session_store,
            session_config: self.session_config,
            state_config: self.state_config,
            flow_config: self.flow_config,
        }
    }

    /// Set the session store.
    pub fn session_store(
        self,
        store: Arc<dyn SessionStore>,
    ) -> AuthenticationFlowBuilder<P, Configured<Arc<dyn SessionStore>>> {
        AuthenticationFlowBuilder {
            provider: self.provider,
            session_store: Configured(store),
            session_config: self.session_config,
            state_config: self.state_config,
            flow_config: self.flow_config,
        }
    }

    /// Set the session cookie configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Set the state cookie configuration.
    ///
    /// Its path is overridden by [`auth_path`](Self::auth_path).
    pub fn state_config(mut self, config: StateConfig) -> Self {
        self.state_config = config;
        self
    }

    /// Set the prefix of the auth routes; the state cookie is scoped to it.
    pub fn auth_path(mut self, path: impl Into<String>) -> Self {
        self.flow_config.auth_path = path.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the path clients land on after logging in.
    pub fn landing_path(mut self, path: impl Into<String>) -> Self {
        self.flow_config.landing_path = path.into();
        self
    }

    /// Set the upper bound for the provider code exchange.
    pub fn exchange_timeout(mut self, timeout: Duration) -> Self {
        self.flow_config.exchange_timeout = timeout;
        self
    }

    /// Honour `X-Forwarded-*` headers when computing the callback origin.
    pub fn trust_forwarded_headers(mut self, trust: bool) -> Self {
        self.flow_config.trust_forwarded_headers = trust;
        self
    }

    /// Whether cookies are restricted to HTTPS. Only disable for local development.
    pub fn secure_cookies(mut self, secure: bool) -> Self {
        self.session_config.secure = secure;
        self.state_config.secure = secure;
        self
    }
}

impl
    AuthenticationFlowBuilder<
        Configured<Arc<dyn IdentityProvider>>,
        Configured<Arc<dyn SessionStore>>,
    >
{
    /// Build the [`AuthenticationFlow`].
    pub fn build(self) -> AuthenticationFlow {
        let mut state_config = self.state_config;
        state_config.path = self.flow_config.auth_path.clone();

        AuthenticationFlow::from_parts(
            self.provider.0,
            StateGuard::new(state_config),
            SessionIssuer::new(self.session_store.0, self.session_config),
            self.flow_config,
        )
    }
}
