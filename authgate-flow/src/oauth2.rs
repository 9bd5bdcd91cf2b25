use crate::state_guard::StateGuard;
use authgate_core::{url::Url, AuthError, CookieDirective, IdentityProvider};
use authgate_session::SessionIssuer;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Where a single login attempt is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FlowState {
    /// Nothing has happened yet.
    Idle,
    /// The client has been sent to the provider holding a state cookie.
    AttemptPending,
    /// The callback arrived and its state is being checked.
    Verifying,
    /// The authorization code is being exchanged at the provider.
    Exchanging,
    /// A session exists and its cookie has been handed out.
    SessionCommitted,
    /// The attempt ended without a session.
    Failed(FailureReason),
}

/// Why an attempt ended in [`FlowState::Failed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FailureReason {
    /// Missing or mismatched CSRF state.
    InvalidState,
    /// The provider did not yield an identity.
    ExchangeError,
    /// The session could not be stored.
    SessionPersistError,
}

impl From<&AuthError> for FailureReason {
    fn from(err: &AuthError) -> Self {
        match err {
            AuthError::InvalidState => FailureReason::InvalidState,
            AuthError::SessionPersist(_) => FailureReason::SessionPersistError,
            _ => FailureReason::ExchangeError,
        }
    }
}

impl FlowState {
    /// The state reached when the current step succeeds. Terminal states stay put.
    fn advance(self) -> FlowState {
        match self {
            FlowState::Idle => FlowState::AttemptPending,
            FlowState::AttemptPending => FlowState::Verifying,
            FlowState::Verifying => FlowState::Exchanging,
            FlowState::Exchanging => FlowState::SessionCommitted,
            terminal => terminal,
        }
    }

    /// The state reached when the current step fails with `err`.
    fn fail(self, err: &AuthError) -> FlowState {
        match self {
            FlowState::SessionCommitted | FlowState::Failed(_) => self,
            _ => FlowState::Failed(err.into()),
        }
    }
}

/// Query parameters the provider appends to the callback URL.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    /// The authorization code.
    pub code: Option<String>,
    /// The CSRF state echoed back by the provider.
    pub state: Option<String>,
    /// Set by the provider when the user denied access or the request was invalid.
    pub error: Option<String>,
}

/// A redirect the web layer should send, with the cookies to set on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowResponse {
    /// Target of the `302 Found`.
    pub location: String,
    /// Cookies to apply, in order.
    pub cookies: Vec<CookieDirective>,
}

/// Route and timing settings of the flow.
#[derive(Debug, Clone)]
pub struct FlowConfig {
    /// Prefix under which the auth routes are mounted.
    pub auth_path: String,
    /// Where the client lands after logging in.
    pub landing_path: String,
    /// Upper bound for the provider code exchange.
    pub exchange_timeout: Duration,
    /// Whether `X-Forwarded-Proto` / `X-Forwarded-Host` are honoured when computing
    /// the callback origin. Only enable behind a proxy that overwrites them.
    pub trust_forwarded_headers: bool,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            auth_path: "/oauth".to_string(),
            landing_path: "/api/profile".to_string(),
            exchange_timeout: Duration::from_secs(10),
            trust_forwarded_headers: false,
        }
    }
}

impl FlowConfig {
    /// Path of the login route.
    pub fn authenticate_path(&self) -> String {
        format!("{}/authenticate", self.auth_path)
    }

    /// Path of the callback route.
    pub fn callback_path(&self) -> String {
        format!("{}/callback", self.auth_path)
    }

    /// Path of the logout route.
    pub fn logout_path(&self) -> String {
        format!("{}/logout", self.auth_path)
    }
}

/// Orchestrates the OAuth2 Authorization Code flow for one provider.
///
/// Every method works on a single request and keeps no state between calls; the
/// only thing linking [`initiate`](Self::initiate) to
/// [`complete`](Self::complete) is the state cookie held by the client.
#[derive(Clone)]
pub struct AuthenticationFlow {
    provider: Arc<dyn IdentityProvider>,
    guard: StateGuard,
    issuer: SessionIssuer,
    config: FlowConfig,
}

impl AuthenticationFlow {
    pub(crate) fn from_parts(
        provider: Arc<dyn IdentityProvider>,
        guard: StateGuard,
        issuer: SessionIssuer,
        config: FlowConfig,
    ) -> Self {
        Self {
            provider,
            guard,
            issuer,
            config,
        }
    }

    /// The route and timing settings.
    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    /// The CSRF state guard.
    pub fn state_guard(&self) -> &StateGuard {
        &self.guard
    }

    /// The session issuer, for session lookup and logout.
    pub fn issuer(&self) -> &SessionIssuer {
        &self.issuer
    }

    /// The provider identifier.
    pub fn provider_id(&self) -> &str {
        self.provider.provider_id()
    }

    /// The callback URL the provider must redirect to, derived from the request origin.
    ///
    /// `origin` is `scheme://host[:port]` of the current request.
    pub fn callback_uri(&self, origin: &str) -> Result<String, AuthError> {
        let parsed = Url::parse(origin)
            .map_err(|e| AuthError::Config(format!("Invalid request origin {origin:?}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(AuthError::Config(format!(
                "Invalid request origin {origin:?}"
            )));
        }
        Ok(format!(
            "{}{}",
            origin.trim_end_matches('/'),
            self.config.callback_path()
        ))
    }

    /// Start a login attempt: issue a state and redirect to the provider.
    pub fn initiate(&self, origin: &str) -> Result<FlowResponse, AuthError> {
        let state = FlowState::Idle;
        let callback_uri = self.callback_uri(origin)?;
        let (csrf_state, cookie) = self.guard.issue();
        let url = self.provider.authorization_url(&callback_uri, &csrf_state)?;

        log::debug!(
            "Login attempt {:?} -> {:?} via {}",
            state,
            state.advance(),
            self.provider.provider_id()
        );

        Ok(FlowResponse {
            location: url.to_string(),
            cookies: vec![cookie],
        })
    }

    /// Finish a login attempt from the provider's callback.
    ///
    /// Verifies the state, exchanges the code and commits a session, strictly in
    /// that order. The session cookie only appears in the returned response; any
    /// error means no cookie other than the state removal should be sent.
    pub async fn complete(
        &self,
        origin: &str,
        params: CallbackParams,
        state_cookie: Option<&str>,
    ) -> Result<FlowResponse, AuthError> {
        let mut state = FlowState::AttemptPending;
        match self.run_callback(&mut state, origin, params, state_cookie).await {
            Ok(session_cookie) => {
                log::debug!("Login attempt finished in {state:?}");
                Ok(FlowResponse {
                    location: self.config.landing_path.clone(),
                    cookies: vec![session_cookie, self.guard.clear()],
                })
            }
            Err(e) => {
                state = state.fail(&e);
                log::warn!("Login attempt finished in {:?}: {}", state, e.kind());
                Err(e)
            }
        }
    }

    async fn run_callback(
        &self,
        state: &mut FlowState,
        origin: &str,
        params: CallbackParams,
        state_cookie: Option<&str>,
    ) -> Result<CookieDirective, AuthError> {
        *state = state.advance();
        self.guard.verify(params.state.as_deref(), state_cookie)?;

        if let Some(error) = params.error {
            return Err(AuthError::Exchange(format!("Provider returned {error}")));
        }
        let code = params
            .code
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AuthError::Exchange("Missing authorization code".to_string()))?;
        let callback_uri = self.callback_uri(origin)?;

        *state = state.advance();
        let identity = self.exchange(&code, &callback_uri).await?;
        log::info!(
            "User authenticated: {}:{}",
            identity.provider_id,
            identity.subject
        );

        let (_, cookie) = self.issuer.create_session(identity).await?;
        *state = state.advance();
        Ok(cookie)
    }

    async fn exchange(
        &self,
        code: &str,
        callback_uri: &str,
    ) -> Result<authgate_core::Identity, AuthError> {
        let timeout = self.config.exchange_timeout;
        let exchange = self.provider.exchange_code(code, callback_uri);
        match tokio::time::timeout(timeout, exchange).await {
            Ok(Ok(identity)) => Ok(identity),
            Ok(Err(AuthError::Exchange(msg))) => Err(AuthError::Exchange(msg)),
            Ok(Err(other)) => Err(AuthError::Exchange(other.to_string())),
            Err(_) => {
                log::error!("Code exchange timed out after {timeout:?}");
                Err(AuthError::Exchange(format!(
                    "Timed out after {}ms",
                    timeout.as_millis()
                )))
            }
        }
    }
}
