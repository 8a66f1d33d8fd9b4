use serde::{Deserialize, Serialize};

use crate::types::identity::{Identity, ProfileAttributes, UnknownRole};

/// Claims embedded in every session token minted at login.
///
/// The front-end re-hydrates its identity from these claims on startup
/// **without** talking to a server, so they carry everything an `Identity`
/// needs. Signature checking on that path is opt-in; these claims are a
/// convenience for rendering, not an authorization boundary. Any backend
/// serving protected data must verify the token itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Standard JWT subject, the user id rendered as a string.
    pub sub: String,

    /// Numeric user ID.
    pub user_id: i64,

    /// UUID v4 generated per login. Lets a backend revoke one session without
    /// touching the others.
    pub session_id: String,

    pub name: String,
    pub email: String,

    /// Kept as a plain string on the wire; converted to `Role` when the
    /// identity is rebuilt so an unknown value is rejected explicitly.
    pub role: String,

    #[serde(flatten)]
    pub profile: ProfileAttributes,

    /// Standard JWT expiry (Unix timestamp, seconds).
    pub exp: usize,

    /// Issued-at (Unix timestamp, seconds).
    pub iat: usize,
}

impl SessionClaims {
    pub fn from_identity(identity: &Identity, session_id: String, iat: usize, exp: usize) -> Self {
        Self {
            sub: identity.id.to_string(),
            user_id: identity.id,
            session_id,
            name: identity.name.clone(),
            email: identity.email.clone(),
            role: identity.role.as_str().to_string(),
            profile: identity.profile.clone(),
            exp,
            iat,
        }
    }

    /// Rebuild the identity the claims were minted from.
    pub fn to_identity(&self) -> Result<Identity, UnknownRole> {
        Ok(Identity {
            id: self.user_id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role.parse()?,
            profile: self.profile.clone(),
        })
    }
}
