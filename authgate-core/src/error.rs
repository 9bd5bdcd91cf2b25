use thiserror::Error;

/// Errors that can occur while authenticating a client.
///
/// `InvalidState`, `Exchange` and `SessionPersist` are terminal for the attempt
/// they occur in and are never retried.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The CSRF state was missing from the callback or the cookie, or they differ.
    #[error("Invalid state")]
    InvalidState,
    /// The provider rejected the authorization code, or the exchange failed or timed out.
    #[error("Code exchange failed: {0}")]
    Exchange(String),
    /// The session record could not be written to the store.
    #[error("Failed to persist session: {0}")]
    SessionPersist(String),
    /// The provider could not build a request (bad endpoint, bad callback URI).
    #[error("Provider error: {0}")]
    Provider(String),
    /// Reading or deleting a session failed.
    #[error("Session error: {0}")]
    Session(String),
    /// No valid session is attached to the request.
    #[error("Not authenticated")]
    Unauthenticated,
    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AuthError {
    /// A stable, machine-readable code for this error.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::InvalidState => "invalid_state",
            AuthError::Exchange(_) => "exchange_error",
            AuthError::SessionPersist(_) => "session_persist_error",
            AuthError::Provider(_) => "provider_error",
            AuthError::Session(_) => "session_error",
            AuthError::Unauthenticated => "unauthenticated",
            AuthError::Config(_) => "config_error",
        }
    }
}
