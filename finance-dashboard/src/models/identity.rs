use serde::{Deserialize, Serialize};

use crate::gate::SessionIdentity;

/// Session keys for login state.
pub mod keys {
    /// Profile returned by the identity provider after a completed login.
    pub const IDENTITY: &str = "identity";

    /// OAuth `state` and PKCE verifier of a login that has been started but
    /// not yet completed.
    pub const PENDING_LOGIN: &str = "pending_login";
}

/// Identity claims returned by the provider at the end of a login handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderProfile {
    /// Name of the provider that vouched for this identity.
    pub provider: String,
    /// Provider-scoped stable user id (`sub`).
    pub subject: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

impl ProviderProfile {
    pub fn to_identity(&self) -> SessionIdentity {
        SessionIdentity::authenticated(self.email.clone(), self.name.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingLogin {
    pub provider: String,
    pub state: String,
    pub code_verifier: String,
}
