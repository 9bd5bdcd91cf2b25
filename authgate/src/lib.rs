//! # Authgate
//!
//! Umbrella crate for the authgate OAuth2 login gateway. Each component lives in
//! its own crate and is re-exported here behind a feature flag:
//!
//! | Feature       | Module        | Crate                        |
//! |---------------|---------------|------------------------------|
//! | *(always)*    | [`core`]      | `authgate-core`              |
//! | `session`     | `session`     | `authgate-session`           |
//! | `store-redis` | `session`     | `authgate-session` + Redis   |
//! | `flow`        | `flow`        | `authgate-flow`              |
//! | `axum`        | `axum`        | `authgate-axum`              |
//! | `google`      | `google`      | `authgate-providers-google`  |

pub use authgate_core as core;
pub use authgate_core::{AuthError, Identity, IdentityProvider};

#[cfg(feature = "session")]
pub use authgate_session as session;

#[cfg(feature = "flow")]
pub use authgate_flow as flow;

#[cfg(feature = "flow")]
pub use authgate_flow::AuthenticationFlow;

#[cfg(feature = "axum")]
pub use authgate_axum as axum;

#[cfg(feature = "google")]
pub use authgate_providers_google as google;
