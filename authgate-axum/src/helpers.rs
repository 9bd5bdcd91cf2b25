use crate::AuthgateAxumError;
use authgate_core::{CookieDirective, SameSite};
use authgate_flow::{AuthenticationFlow, CallbackParams, FlowResponse};
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use tower_cookies::{cookie::time, Cookie, Cookies};

pub fn to_tower_same_site(ss: SameSite) -> tower_cookies::cookie::SameSite {
    match ss {
        SameSite::Lax => tower_cookies::cookie::SameSite::Lax,
        SameSite::Strict => tower_cookies::cookie::SameSite::Strict,
        SameSite::None => tower_cookies::cookie::SameSite::None,
    }
}

/// Translate a flow cookie directive into a `tower-cookies` cookie.
pub fn create_cookie(directive: &CookieDirective) -> Cookie<'static> {
    let mut builder = Cookie::build((directive.name.clone(), directive.value.clone()))
        .path(directive.path.clone())
        .secure(directive.secure)
        .http_only(directive.http_only)
        .same_site(to_tower_same_site(directive.same_site));

    if let Some(max_age) = directive.max_age {
        builder = builder.max_age(time::Duration::seconds(max_age.num_seconds()));
    }
    builder.build()
}

/// Recompute `scheme://host` of the current request.
///
/// With `trust_forwarded` set, proxy headers win over the request itself so the
/// callback URL matches what the client actually used. Returns `None` when no
/// usable host is present.
pub fn request_origin(
    headers: &HeaderMap,
    uri: &Uri,
    default_scheme: &str,
    trust_forwarded: bool,
) -> Option<String> {
    let first_value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let forwarded = |name: &str| first_value(name).filter(|_| trust_forwarded);

    let scheme = forwarded("x-forwarded-proto")
        .or_else(|| uri.scheme_str().map(str::to_string))
        .unwrap_or_else(|| default_scheme.to_string());
    if scheme != "http" && scheme != "https" {
        return None;
    }

    let host = forwarded("x-forwarded-host")
        .or_else(|| first_value(header::HOST.as_str()))
        .or_else(|| uri.authority().map(|a| a.to_string()))?;
    let valid_host = host
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | ':' | '[' | ']'));
    if !valid_host {
        return None;
    }

    Some(format!("{scheme}://{host}"))
}

fn origin_for(
    flow: &AuthenticationFlow,
    headers: &HeaderMap,
    uri: &Uri,
) -> Result<String, AuthgateAxumError> {
    let default_scheme = if flow.issuer().config().secure {
        "https"
    } else {
        "http"
    };
    let trust_forwarded = flow.config().trust_forwarded_headers;
    request_origin(headers, uri, default_scheme, trust_forwarded).ok_or_else(|| {
        AuthgateAxumError::BadRequest("Cannot determine request origin".to_string())
    })
}

fn redirect(cookies: &Cookies, response: FlowResponse) -> Response {
    for directive in &response.cookies {
        cookies.add(create_cookie(directive));
    }
    (StatusCode::FOUND, [(header::LOCATION, response.location)]).into_response()
}

/// `GET {prefix}/authenticate`: send the client to the provider.
pub async fn axum_authenticate_handler(
    State(flow): State<AuthenticationFlow>,
    cookies: Cookies,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Response, AuthgateAxumError> {
    let origin = origin_for(&flow, &headers, &uri)?;
    let response = flow.initiate(&origin)?;
    Ok(redirect(&cookies, response))
}

/// `GET {prefix}/callback`: verify the state, exchange the code, commit the session.
pub async fn axum_callback_handler(
    State(flow): State<AuthenticationFlow>,
    cookies: Cookies,
    headers: HeaderMap,
    uri: Uri,
    Query(params): Query<CallbackParams>,
) -> Result<Response, AuthgateAxumError> {
    let guard = flow.state_guard();
    let state_cookie = cookies
        .get(&guard.config().cookie_name)
        .map(|c| c.value().to_string());

    // The attempt is consumed whatever the outcome.
    cookies.add(create_cookie(&guard.clear()));

    let origin = origin_for(&flow, &headers, &uri)?;
    let response = flow
        .complete(&origin, params, state_cookie.as_deref())
        .await?;
    Ok(redirect(&cookies, response))
}

/// `GET {prefix}/logout`: drop the session and its cookie.
pub async fn axum_logout_handler(
    State(flow): State<AuthenticationFlow>,
    cookies: Cookies,
) -> Response {
    let issuer = flow.issuer();
    if let Some(cookie) = cookies.get(&issuer.config().cookie_name) {
        if let Err(e) = issuer.invalidate(cookie.value()).await {
            log::warn!("Session deletion failed during logout: {e}");
        }
    }
    cookies.add(create_cookie(&issuer.config().removal_cookie()));
    (StatusCode::FOUND, [(header::LOCATION, "/")]).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn test_origin_from_host_header() {
        let uri: Uri = "/oauth/authenticate".parse().unwrap();
        let origin = request_origin(
            &headers(&[("host", "gw.example.com:8443")]),
            &uri,
            "https",
            false,
        );
        assert_eq!(origin.as_deref(), Some("https://gw.example.com:8443"));
    }

    #[test]
    fn test_origin_prefers_forwarded_headers() {
        let uri: Uri = "/oauth/authenticate".parse().unwrap();
        let origin = request_origin(
            &headers(&[
                ("host", "internal:3000"),
                ("x-forwarded-host", "public.example.com"),
                ("x-forwarded-proto", "https, http"),
            ]),
            &uri,
            "http",
            true,
        );
        assert_eq!(origin.as_deref(), Some("https://public.example.com"));
    }

    #[test]
    fn test_origin_ignores_untrusted_forwarded_headers() {
        let uri: Uri = "/oauth/authenticate".parse().unwrap();
        let origin = request_origin(
            &headers(&[
                ("host", "gw.example.com"),
                ("x-forwarded-host", "evil.example.net"),
                ("x-forwarded-proto", "http"),
            ]),
            &uri,
            "https",
            false,
        );
        assert_eq!(origin.as_deref(), Some("https://gw.example.com"));
    }

    #[test]
    fn test_origin_rejects_suspicious_host() {
        let uri: Uri = "/oauth/authenticate".parse().unwrap();
        let bad_host = headers(&[("host", "evil.com/x?")]);
        assert!(request_origin(&bad_host, &uri, "https", false).is_none());
        assert!(request_origin(&HeaderMap::new(), &uri, "https", false).is_none());
        let bad_scheme = headers(&[("host", "ok.com"), ("x-forwarded-proto", "gopher")]);
        assert!(request_origin(&bad_scheme, &uri, "https", true).is_none());
    }

    #[test]
    fn test_create_cookie_carries_attributes() {
        let directive = CookieDirective {
            name: "auth-state".into(),
            value: "abc".into(),
            path: "/oauth".into(),
            max_age: Some(authgate_flow::chrono::Duration::minutes(30)),
            secure: true,
            http_only: true,
            same_site: SameSite::Lax,
        };
        let cookie = create_cookie(&directive);
        assert_eq!(cookie.name(), "auth-state");
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.path(), Some("/oauth"));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.max_age(), Some(time::Duration::minutes(30)));
    }
}
