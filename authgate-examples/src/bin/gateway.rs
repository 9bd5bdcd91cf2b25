//! # Gateway
//!
//! Runs the Google login flow in front of a protected `/api/profile` endpoint.
//!
//! Configuration comes from the environment (a `.env` file is honoured):
//! - `AUTHGATE_GOOGLE_CLIENT_ID` / `AUTHGATE_GOOGLE_CLIENT_SECRET` (required)
//! - `AUTHGATE_BIND` (default `0.0.0.0:3000`)
//! - `AUTHGATE_LANDING_PATH` (default `/api/profile`)
//! - `AUTHGATE_INSECURE_COOKIES=1` to allow cookies over plain HTTP during development
//! - `AUTHGATE_TRUST_PROXY=1` to honour `X-Forwarded-Proto` / `X-Forwarded-Host`
//! - `REDIS_URL` to keep sessions in Redis instead of process memory
//!
//! Log output is controlled with `RUST_LOG`.

use authgate::axum::{AuthSession, AuthgateAxumExt, AuthgateState};
use authgate::flow::AuthenticationFlow;
use authgate::google::GoogleProvider;
use authgate::session::{MemoryStore, RedisStore, SessionStore};
use axum::{response::IntoResponse, routing::get, Json, Router};
use std::sync::Arc;
use tower_cookies::CookieManagerLayer;

fn session_store() -> Result<Arc<dyn SessionStore>, authgate::AuthError> {
    match std::env::var("REDIS_URL") {
        Ok(url) => {
            log::info!("Storing sessions in Redis");
            Ok(Arc::new(RedisStore::new(&url, "authgate".to_string())?))
        }
        Err(_) => {
            log::warn!("REDIS_URL not set, sessions are kept in memory");
            Ok(Arc::new(MemoryStore::default()))
        }
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

async fn profile(AuthSession(session): AuthSession) -> impl IntoResponse {
    let identity = &session.identity;
    Json(serde_json::json!({
        "provider": identity.provider_id,
        "subject": identity.subject,
        "email": identity.email,
        "name": identity.name,
        "expires_at": session.expires_at.to_rfc3339(),
        "lifetime_seconds": session.ttl().num_seconds(),
    }))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let client_id = std::env::var("AUTHGATE_GOOGLE_CLIENT_ID")
        .map_err(|_| "AUTHGATE_GOOGLE_CLIENT_ID must be set")?;
    let client_secret = std::env::var("AUTHGATE_GOOGLE_CLIENT_SECRET")
        .map_err(|_| "AUTHGATE_GOOGLE_CLIENT_SECRET must be set")?;
    let bind = std::env::var("AUTHGATE_BIND")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let insecure = env_flag("AUTHGATE_INSECURE_COOKIES");
    let trust_proxy = env_flag("AUTHGATE_TRUST_PROXY");

    let mut builder = AuthenticationFlow::builder()
        .provider(GoogleProvider::new(client_id, client_secret)?)
        .session_store(session_store()?)
        .secure_cookies(!insecure)
        .trust_forwarded_headers(trust_proxy);
    if let Ok(landing) = std::env::var("AUTHGATE_LANDING_PATH") {
        builder = builder.landing_path(landing);
    }
    let flow = builder.build();

    let app = Router::new()
        .route("/api/profile", get(profile))
        .merge(flow.axum_router())
        .layer(CookieManagerLayer::new())
        .with_state(AuthgateState::from(flow));

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    log::info!("Gateway listening on {bind}");
    axum::serve(listener, app).await?;
    Ok(())
}
