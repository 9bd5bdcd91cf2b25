use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identity claims returned by a provider after a successful code exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// The provider that vouched for this identity, e.g. `google`.
    pub provider_id: String,
    /// Stable subject identifier at the provider.
    pub subject: String,
    /// Email address, if released by the provider.
    pub email: Option<String>,
    /// Display name.
    pub name: Option<String>,
    /// Any other provider-issued metadata worth keeping in the session.
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl Identity {
    /// Create an identity with only the subject set.
    pub fn new(provider_id: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            subject: subject.into(),
            email: None,
            name: None,
            attributes: HashMap::new(),
        }
    }

    /// Set the email address.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add a provider attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}
