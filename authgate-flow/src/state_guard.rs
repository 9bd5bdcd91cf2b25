use authgate_core::token::{constant_time_eq, generate_token};
use authgate_core::{AuthError, CookieDirective, SameSite};

/// Upper bound on how long a login attempt may stay open.
pub const MAX_STATE_AGE_MINUTES: i64 = 30;

/// Configuration for the CSRF state cookie.
#[derive(Debug, Clone)]
pub struct StateConfig {
    /// Name of the state cookie.
    pub cookie_name: String,
    /// Path the cookie is scoped to; the auth routes prefix.
    pub path: String,
    /// Lifetime of the attempt. Clamped to [`MAX_STATE_AGE_MINUTES`].
    pub max_age: chrono::Duration,
    /// Whether the cookie should only be sent over HTTPS.
    pub secure: bool,
    /// Cross-site policy. `Strict` would drop the cookie on the provider's redirect back.
    pub same_site: SameSite,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            cookie_name: "auth-state".to_string(),
            path: "/oauth".to_string(),
            max_age: chrono::Duration::minutes(MAX_STATE_AGE_MINUTES),
            secure: true,
            same_site: SameSite::Lax,
        }
    }
}

/// Issues and verifies the anti-CSRF state of a login attempt.
///
/// The state is never stored server-side: it travels to the provider in the
/// authorization URL and back in the callback query, and a copy sits in a cookie
/// the provider cannot set. A callback is genuine only if both copies match.
#[derive(Debug, Clone, Default)]
pub struct StateGuard {
    config: StateConfig,
}

impl StateGuard {
    /// Create a guard with the given cookie settings.
    pub fn new(config: StateConfig) -> Self {
        Self { config }
    }

    /// The cookie settings.
    pub fn config(&self) -> &StateConfig {
        &self.config
    }

    /// Generate a fresh state and the cookie directive carrying it.
    pub fn issue(&self) -> (String, CookieDirective) {
        let state = generate_token();
        let max_age = self
            .config
            .max_age
            .min(chrono::Duration::minutes(MAX_STATE_AGE_MINUTES));
        let cookie = CookieDirective {
            name: self.config.cookie_name.clone(),
            value: state.clone(),
            path: self.config.path.clone(),
            max_age: Some(max_age),
            secure: self.config.secure,
            http_only: true,
            same_site: self.config.same_site,
        };
        (state, cookie)
    }

    /// Check the state presented in the callback against the cookie copy.
    pub fn verify(&self, presented: Option<&str>, cookie: Option<&str>) -> Result<(), AuthError> {
        match (presented, cookie) {
            (Some(presented), Some(cookie))
                if !presented.is_empty() && constant_time_eq(presented, cookie) =>
            {
                Ok(())
            }
            (None, _) | (_, None) => {
                log::warn!("Callback rejected: state missing from query or cookie");
                Err(AuthError::InvalidState)
            }
            _ => {
                log::warn!("Callback rejected: state mismatch");
                Err(AuthError::InvalidState)
            }
        }
    }

    /// Directive discarding the state cookie once the attempt has been consumed.
    pub fn clear(&self) -> CookieDirective {
        CookieDirective {
            secure: self.config.secure,
            same_site: self.config.same_site,
            ..CookieDirective::removal(self.config.cookie_name.clone(), self.config.path.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_issue_sets_scoped_cookie() {
        let guard = StateGuard::default();
        let (state, cookie) = guard.issue();

        assert_eq!(cookie.name, "auth-state");
        assert_eq!(cookie.value, state);
        assert_eq!(cookie.path, "/oauth");
        assert_eq!(cookie.max_age, Some(chrono::Duration::minutes(30)));
        assert!(cookie.secure);
        assert!(cookie.http_only);
    }

    #[test]
    fn test_issue_has_enough_entropy() {
        let (state, _) = StateGuard::default().issue();
        // base64url carries 6 bits per character
        assert!(state.len() * 6 >= 128);
    }

    #[test]
    fn test_issue_never_repeats() {
        let guard = StateGuard::default();
        let states: HashSet<String> = (0..500).map(|_| guard.issue().0).collect();
        assert_eq!(states.len(), 500);
    }

    #[test]
    fn test_max_age_is_clamped() {
        let guard = StateGuard::new(StateConfig {
            max_age: chrono::Duration::hours(5),
            ..Default::default()
        });
        let (_, cookie) = guard.issue();
        assert_eq!(cookie.max_age, Some(chrono::Duration::minutes(30)));
    }

    #[test]
    fn test_verify_matching_pair() {
        let guard = StateGuard::default();
        let (state, cookie) = guard.issue();
        assert!(guard.verify(Some(&state), Some(&cookie.value)).is_ok());
    }

    #[test]
    fn test_verify_rejects_missing_values() {
        let guard = StateGuard::default();
        assert!(matches!(
            guard.verify(Some("abc"), None),
            Err(AuthError::InvalidState)
        ));
        assert!(matches!(
            guard.verify(None, Some("abc")),
            Err(AuthError::InvalidState)
        ));
        assert!(matches!(guard.verify(None, None), Err(AuthError::InvalidState)));
        assert!(matches!(
            guard.verify(Some(""), Some("")),
            Err(AuthError::InvalidState)
        ));
    }

    #[test]
    fn test_verify_rejects_single_character_difference() {
        let guard = StateGuard::default();
        let (state, _) = guard.issue();
        for i in 0..state.len() {
            let mut tampered: Vec<char> = state.chars().collect();
            tampered[i] = if tampered[i] == 'A' { 'B' } else { 'A' };
            let tampered: String = tampered.into_iter().collect();
            assert!(guard.verify(Some(&tampered), Some(&state)).is_err());
        }
        assert!(guard.verify(Some(&state[1..]), Some(&state)).is_err());
    }

    #[test]
    fn test_clear_expires_cookie_on_same_path() {
        let guard = StateGuard::default();
        let removal = guard.clear();
        assert!(removal.is_removal());
        assert_eq!(removal.name, "auth-state");
        assert_eq!(removal.path, "/oauth");
    }
}
