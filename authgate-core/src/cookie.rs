use serde::{Deserialize, Serialize};

/// Controls whether a cookie is sent with cross-site requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
    /// The cookie is sent with "safe" cross-site requests (e.g., following a link).
    Lax,
    /// The cookie is only sent for same-site requests.
    Strict,
    /// The cookie is sent with all requests, including cross-site. Requires `Secure`.
    None,
}

/// A framework-neutral instruction to set (or clear) a cookie on the response.
///
/// Web adapters translate directives into their own cookie types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CookieDirective {
    /// Cookie name.
    pub name: String,
    /// Cookie value. Empty for removals.
    pub value: String,
    /// Path the cookie is scoped to.
    pub path: String,
    /// Lifetime. `None` makes it a browser-session cookie.
    pub max_age: Option<chrono::Duration>,
    /// Only send over HTTPS.
    pub secure: bool,
    /// Hide from client-side scripts.
    pub http_only: bool,
    /// Cross-site policy.
    pub same_site: SameSite,
}

impl CookieDirective {
    /// A directive that expires the named cookie immediately.
    pub fn removal(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: String::new(),
            path: path.into(),
            max_age: Some(chrono::Duration::zero()),
            secure: true,
            http_only: true,
            same_site: SameSite::Lax,
        }
    }

    /// Whether applying this directive deletes the cookie.
    pub fn is_removal(&self) -> bool {
        self.max_age == Some(chrono::Duration::zero())
    }
}
