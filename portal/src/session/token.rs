use std::fmt;

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;
use tracing::debug;

use shared::types::portal_config::AuthConfig;
use shared::types::{Identity, SessionClaims, UnknownRole};

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token names an unknown role: {0}")]
    UnknownRole(#[from] UnknownRole),

    #[error("no signing secret configured")]
    MissingSecret,

    #[error("failed to sign token: {0}")]
    Signing(String),

    #[error("token expiry out of range")]
    ExpiryOutOfRange,
}

/// A freshly minted token together with the claims it carries.
#[derive(Debug, Clone)]
pub struct MintedToken {
    pub token: String,
    pub claims: SessionClaims,
}

/// Mints and decodes HS256 session tokens.
///
/// Decoding checks `exp` but, unless `verify_signature` is set, not the
/// signature: the decoded identity drives rendering only.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    verify_signature: bool,
    expiry_secs: u64,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("verify_signature", &self.verify_signature)
            .field("expiry_secs", &self.expiry_secs)
            .finish()
    }
}

impl TokenCodec {
    pub fn new(secret: &str, expiry_secs: u64, verify_signature: bool) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            verify_signature,
            expiry_secs,
        }
    }

    pub fn from_config(auth: &AuthConfig) -> Result<Self, TokenError> {
        let secret = auth.resolved_jwt_secret().ok_or(TokenError::MissingSecret)?;
        let expiry_secs = auth
            .token_expiry_secs()
            .ok_or(TokenError::ExpiryOutOfRange)?;
        Ok(Self::new(&secret, expiry_secs, auth.verify_signature))
    }

    pub fn expiry_secs(&self) -> u64 {
        self.expiry_secs
    }

    pub fn mint(&self, identity: &Identity) -> Result<MintedToken, TokenError> {
        self.mint_at(identity, Utc::now().timestamp())
    }

    /// Mint with an explicit issue time (Unix seconds).
    pub fn mint_at(&self, identity: &Identity, issued_at: i64) -> Result<MintedToken, TokenError> {
        let iat = issued_at.max(0) as usize;
        let exp = usize::try_from(self.expiry_secs)
            .ok()
            .and_then(|secs| iat.checked_add(secs))
            .ok_or(TokenError::ExpiryOutOfRange)?;
        let claims =
            SessionClaims::from_identity(identity, uuid::Uuid::new_v4().to_string(), iat, exp);

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        debug!("Minted session {} for user {}", claims.session_id, claims.user_id);
        Ok(MintedToken { token, claims })
    }

    pub fn decode_claims(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        if !self.verify_signature {
            validation.insecure_disable_signature_validation();
        }

        decode::<SessionClaims>(token.trim(), &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed(e.to_string()),
            })
    }

    /// Rebuild the identity a token was minted for.
    pub fn identity_from(&self, token: &str) -> Result<Identity, TokenError> {
        let claims = self.decode_claims(token)?;
        Ok(claims.to_identity()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::types::{ProfileAttributes, Role};

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn admin() -> Identity {
        Identity {
            id: 1,
            name: "Admin User".into(),
            email: "admin@hospital.com".into(),
            role: Role::Admin,
            profile: ProfileAttributes::default(),
        }
    }

    #[test]
    fn minted_token_rehydrates_identity() {
        let codec = TokenCodec::new(SECRET, 3600, false);
        let minted = codec.mint(&admin()).unwrap();
        assert_eq!(codec.identity_from(&minted.token).unwrap(), admin());
        assert_eq!(minted.claims.exp - minted.claims.iat, 3600);
    }

    #[test]
    fn huge_expiry_is_an_error_not_a_panic() {
        let codec = TokenCodec::new(SECRET, u64::MAX, false);
        assert!(matches!(
            codec.mint(&admin()),
            Err(TokenError::ExpiryOutOfRange)
        ));

        let auth = AuthConfig {
            token_expiry_minutes: i64::MAX as u64,
            jwt_secret: Some(SECRET.into()),
            verify_signature: false,
        };
        assert!(matches!(
            TokenCodec::from_config(&auth),
            Err(TokenError::ExpiryOutOfRange)
        ));
    }

    #[test]
    fn each_login_gets_its_own_session_id() {
        let codec = TokenCodec::new(SECRET, 3600, false);
        let a = codec.mint(&admin()).unwrap();
        let b = codec.mint(&admin()).unwrap();
        assert_ne!(a.claims.session_id, b.claims.session_id);
    }

    #[test]
    fn garbage_is_malformed() {
        let codec = TokenCodec::new(SECRET, 3600, false);
        for bad in ["", "mock-jwt-token-1", "a.b.c", "eyJhbGciOiJIUzI1NiJ9.!!!.sig"] {
            assert!(matches!(
                codec.identity_from(bad),
                Err(TokenError::Malformed(_))
            ));
        }
    }

    #[test]
    fn expired_token_is_rejected() {
        let codec = TokenCodec::new(SECRET, 60, false);
        let two_hours_ago = Utc::now().timestamp() - 7200;
        let minted = codec.mint_at(&admin(), two_hours_ago).unwrap();
        assert!(matches!(
            codec.identity_from(&minted.token),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn foreign_signature_is_trusted_unless_verification_is_on() {
        let other = TokenCodec::new("another-secret-another-secret-xx", 3600, false);
        let minted = other.mint(&admin()).unwrap();

        let lenient = TokenCodec::new(SECRET, 3600, false);
        assert!(lenient.identity_from(&minted.token).is_ok());

        let strict = TokenCodec::new(SECRET, 3600, true);
        assert!(matches!(
            strict.identity_from(&minted.token),
            Err(TokenError::Malformed(_))
        ));
    }

    #[test]
    fn unknown_role_claim_is_rejected() {
        let codec = TokenCodec::new(SECRET, 3600, false);
        let now = Utc::now().timestamp() as usize;
        let mut claims =
            SessionClaims::from_identity(&admin(), "sid".into(), now, now + 3600);
        claims.role = "nurse".into();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert!(matches!(
            codec.identity_from(&token),
            Err(TokenError::UnknownRole(_))
        ));
    }
}
