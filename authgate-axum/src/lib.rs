pub use authgate_flow::{AuthenticationFlow, SessionConfig};
pub use authgate_session::{Session, SessionStore};
use authgate_core::AuthError;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
pub use tower_cookies::CookieManagerLayer;
use tower_cookies::Cookies;

pub mod helpers;

pub use helpers::*;

#[derive(Clone)]
pub struct AuthgateState {
    pub flow: AuthenticationFlow,
}

impl From<AuthenticationFlow> for AuthgateState {
    fn from(flow: AuthenticationFlow) -> Self {
        Self { flow }
    }
}

impl FromRef<AuthgateState> for AuthenticationFlow {
    fn from_ref(state: &AuthgateState) -> Self {
        state.flow.clone()
    }
}

/// Errors surfaced by the axum handlers and extractors.
///
/// None of them ever renders as a redirect: a failed login must be visible as a
/// failure, not as a bounce back to an unauthenticated page.
#[derive(Debug)]
pub enum AuthgateAxumError {
    BadRequest(String),
    Flow(AuthError),
    Internal(String),
}

impl From<AuthError> for AuthgateAxumError {
    fn from(err: AuthError) -> Self {
        AuthgateAxumError::Flow(err)
    }
}

impl IntoResponse for AuthgateAxumError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            AuthgateAxumError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", msg)
            }
            AuthgateAxumError::Internal(msg) => {
                log::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal error".to_string(),
                )
            }
            AuthgateAxumError::Flow(err) => {
                let status = match &err {
                    AuthError::InvalidState => StatusCode::BAD_REQUEST,
                    AuthError::Exchange(_) => StatusCode::BAD_GATEWAY,
                    AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
                    AuthError::SessionPersist(_)
                    | AuthError::Session(_)
                    | AuthError::Provider(_)
                    | AuthError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                let message = if status.is_server_error() {
                    log::error!("Authentication failed: {err}");
                    "Authentication failed".to_string()
                } else {
                    err.to_string()
                };
                (status, err.kind(), message)
            }
        };

        (
            status,
            Json(serde_json::json!({ "error": kind, "message": message })),
        )
            .into_response()
    }
}

/// The extractor for a validated session.
pub struct AuthSession(pub Session);

impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
    AuthenticationFlow: FromRef<S>,
{
    type Rejection = AuthgateAxumError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let flow = AuthenticationFlow::from_ref(state);
        let cookies = Cookies::from_request_parts(parts, state)
            .await
            .map_err(|e| AuthgateAxumError::Internal(e.1.to_string()))?;

        let issuer = flow.issuer();
        let session_id = cookies
            .get(&issuer.config().cookie_name)
            .map(|c| c.value().to_string())
            .ok_or(AuthError::Unauthenticated)?;

        let session = issuer
            .load_session(&session_id)
            .await?
            .ok_or(AuthError::Unauthenticated)?;

        Ok(AuthSession(session))
    }
}

pub trait AuthgateAxumExt {
    fn axum_router<AppState>(&self) -> axum::Router<AppState>
    where
        AppState: Clone + Send + Sync + 'static,
        AuthenticationFlow: FromRef<AppState>;
}

impl AuthgateAxumExt for AuthenticationFlow {
    fn axum_router<AppState>(&self) -> axum::Router<AppState>
    where
        AppState: Clone + Send + Sync + 'static,
        AuthenticationFlow: FromRef<AppState>,
    {
        use axum::routing::get;
        let config = self.config();
        axum::Router::new()
            .route(
                &config.authenticate_path(),
                get(helpers::axum_authenticate_handler),
            )
            .route(&config.callback_path(), get(helpers::axum_callback_handler))
            .route(&config.logout_path(), get(helpers::axum_logout_handler))
    }
}
