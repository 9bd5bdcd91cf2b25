//! Google identity provider for authgate.
//!
//! Builds Google's consent URL and turns an authorization code into an
//! [`Identity`] by calling the token endpoint and then the OpenID Connect
//! userinfo endpoint.

use async_trait::async_trait;
use authgate_core::{url::Url, AuthError, Identity, IdentityProvider};
use serde::Deserialize;
use std::time::Duration;

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";
const SCOPE: &str = "openid email profile";

pub struct GoogleProvider {
    client_id: String,
    client_secret: String,
    auth_url: String,
    token_url: String,
    userinfo_url: String,
    http_client: reqwest::Client,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct GoogleUserInfo {
    sub: String,
    email: Option<String>,
    email_verified: Option<bool>,
    name: Option<String>,
    picture: Option<String>,
    locale: Option<String>,
}

impl GoogleProvider {
    /// Create a provider for the given OAuth client.
    ///
    /// Fails with [`AuthError::Config`] if the HTTP client cannot be built.
    pub fn new(client_id: String, client_secret: String) -> Result<Self, AuthError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AuthError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client_id,
            client_secret,
            auth_url: AUTH_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
            userinfo_url: USERINFO_URL.to_string(),
            http_client,
        })
    }

    /// Point the provider at different endpoints, e.g. a mock server in tests.
    pub fn with_endpoints(
        mut self,
        auth_url: impl Into<String>,
        token_url: impl Into<String>,
        userinfo_url: impl Into<String>,
    ) -> Self {
        self.auth_url = auth_url.into();
        self.token_url = token_url.into();
        self.userinfo_url = userinfo_url.into();
        self
    }

    async fn fetch_access_token(
        &self,
        code: &str,
        callback_uri: &str,
    ) -> Result<String, AuthError> {
        let response = self
            .http_client
            .post(&self.token_url)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", callback_uri),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AuthError::Exchange(format!("Token request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            log::warn!("Google rejected authorization code with {status}");
            return Err(AuthError::Exchange(format!(
                "Token endpoint returned {status}: {body}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Exchange(format!("Malformed token response: {e}")))?;
        Ok(token.access_token)
    }

    async fn fetch_user_info(&self, access_token: &str) -> Result<GoogleUserInfo, AuthError> {
        let response = self
            .http_client
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::Exchange(format!("Userinfo request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AuthError::Exchange(format!(
                "Userinfo endpoint returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::Exchange(format!("Malformed userinfo response: {e}")))
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn provider_id(&self) -> &str {
        "google"
    }

    fn authorization_url(&self, callback_uri: &str, state: &str) -> Result<Url, AuthError> {
        Url::parse_with_params(
            &self.auth_url,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", callback_uri),
                ("response_type", "code"),
                ("scope", SCOPE),
                ("state", state),
            ],
        )
        .map_err(|e| AuthError::Provider(format!("Invalid authorization endpoint: {e}")))
    }

    async fn exchange_code(&self, code: &str, callback_uri: &str) -> Result<Identity, AuthError> {
        let access_token = self.fetch_access_token(code, callback_uri).await?;
        let info = self.fetch_user_info(&access_token).await?;

        let mut identity = Identity::new("google", info.sub);
        identity.email = info.email;
        identity.name = info.name;
        if let Some(verified) = info.email_verified {
            identity
                .attributes
                .insert("email_verified".to_string(), verified.to_string());
        }
        if let Some(picture) = info.picture {
            identity.attributes.insert("picture".to_string(), picture);
        }
        if let Some(locale) = info.locale {
            identity.attributes.insert("locale".to_string(), locale);
        }
        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> GoogleProvider {
        GoogleProvider::new("client-id".into(), "client-secret".into())
            .unwrap()
            .with_endpoints(
            format!("{}/auth", server.uri()),
            format!("{}/token", server.uri()),
            format!("{}/userinfo", server.uri()),
        )
    }

    #[test]
    fn test_new_returns_configured_provider() {
        let provider = GoogleProvider::new("client-id".into(), "secret".into()).unwrap();
        assert_eq!(provider.provider_id(), "google");
        assert_eq!(provider.token_url, TOKEN_URL);
        assert_eq!(provider.userinfo_url, USERINFO_URL);
    }

    #[test]
    fn test_authorization_url() {
        let provider = GoogleProvider::new("client-id".into(), "secret".into()).unwrap();
        let url = provider
            .authorization_url("https://gw.example.com/oauth/callback", "abc123")
            .unwrap();

        assert_eq!(url.host_str(), Some("accounts.google.com"));
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("client_id".into(), "client-id".into())));
        assert!(pairs.contains(&(
            "redirect_uri".into(),
            "https://gw.example.com/oauth/callback".into()
        )));
        assert!(pairs.contains(&("response_type".into(), "code".into())));
        assert!(pairs.contains(&("scope".into(), "openid email profile".into())));
        assert!(pairs.contains(&("state".into(), "abc123".into())));
    }

    #[tokio::test]
    async fn test_exchange_code_maps_userinfo() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("code=auth-code"))
            .and(body_string_contains("grant_type=authorization_code"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ya29.token",
                "token_type": "Bearer",
                "expires_in": 3599
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .and(header("authorization", "Bearer ya29.token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "sub": "1090",
                "email": "u1@example.com",
                "email_verified": true,
                "name": "User One",
                "picture": "https://example.com/p.png"
            })))
            .mount(&server)
            .await;

        let identity = provider(&server)
            .exchange_code("auth-code", "https://gw.example.com/oauth/callback")
            .await
            .unwrap();

        assert_eq!(identity.provider_id, "google");
        assert_eq!(identity.subject, "1090");
        assert_eq!(identity.email.as_deref(), Some("u1@example.com"));
        assert_eq!(identity.name.as_deref(), Some("User One"));
        assert_eq!(
            identity.attributes.get("email_verified").map(String::as_str),
            Some("true")
        );
    }

    #[tokio::test]
    async fn test_rejected_code_is_exchange_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant"
            })))
            .mount(&server)
            .await;

        let result = provider(&server)
            .exchange_code("used-code", "https://gw.example.com/oauth/callback")
            .await;

        match result {
            Err(AuthError::Exchange(msg)) => assert!(msg.contains("invalid_grant")),
            other => panic!("expected exchange error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_userinfo_failure_is_exchange_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ya29.token"
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let result = provider(&server)
            .exchange_code("auth-code", "https://gw.example.com/oauth/callback")
            .await;

        assert!(matches!(result, Err(AuthError::Exchange(_))));
    }
}
