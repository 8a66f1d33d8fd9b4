use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::types::identity::{ProfileAttributes, Role};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    #[serde(default = "default_token_expiry")]
    pub token_expiry_minutes: u64,
    /// HMAC key used to sign session tokens.
    ///
    /// Prefer loading this via the `JWT_SECRET` environment variable; this
    /// field is the fallback. **Minimum length:** 32 characters.
    pub jwt_secret: Option<String>,
    /// Verify the token signature when re-hydrating a session on startup.
    /// Off by default: the portal trusts the decoded claims for rendering only.
    #[serde(default)]
    pub verify_signature: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Where the session token is persisted between runs.
    #[serde(default = "default_token_path")]
    pub token_path: PathBuf,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct DoctorEntry {
    pub id: i64,
    pub name: String,
    pub department: String,
    #[serde(default)]
    pub consultation_fee: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BookingConfig {
    /// How many days after today are offered for booking.
    #[serde(default = "default_window_days")]
    pub window_days: u32,
    #[serde(default = "default_doctors")]
    pub doctors: Vec<DoctorEntry>,
}

/// A seeded login. Passwords are stored as argon2 PHC strings only.
#[derive(Debug, Deserialize, Clone)]
pub struct AccountConfig {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    #[serde(flatten)]
    pub profile: ProfileAttributes,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub auth: AuthConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub booking: BookingConfig,
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

impl AuthConfig {
    /// Token expiry converted to seconds, or `None` if that overflows.
    pub fn token_expiry_secs(&self) -> Option<u64> {
        self.token_expiry_minutes.checked_mul(60)
    }

    /// Resolve the JWT secret with `JWT_SECRET` env-var taking priority over
    /// the config file field.
    ///
    /// Returns `None` when neither source is set.
    pub fn resolved_jwt_secret(&self) -> Option<String> {
        std::env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .or_else(|| self.jwt_secret.clone())
            .filter(|s| !s.is_empty())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            token_path: default_token_path(),
        }
    }
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
            doctors: default_doctors(),
        }
    }
}

// ---------------------------------------------------------------------------
// Serde defaults
// ---------------------------------------------------------------------------

/// Longest session a config may ask for: one year.
pub const MAX_TOKEN_EXPIRY_MINUTES: u64 = 60 * 24 * 365;

pub fn default_token_expiry() -> u64 {
    60
}

pub fn default_token_path() -> PathBuf {
    PathBuf::from("portal-session.token")
}

pub fn default_window_days() -> u32 {
    7
}

/// Built-in catalogue used when the config names no doctors.
pub fn default_doctors() -> Vec<DoctorEntry> {
    [
        (1, "Dr. John Smith", "Cardiology", "$150"),
        (7, "Dr. Patricia Miller", "Cardiology", "$160"),
        (2, "Dr. Emily Johnson", "Neurology", "$180"),
        (3, "Dr. Michael Brown", "Dermatology", "$130"),
        (4, "Dr. Sarah Wilson", "Pediatrics", "$140"),
        (5, "Dr. Robert Davis", "Orthopedics", "$160"),
        (6, "Dr. Jennifer Lee", "Ophthalmology", "$150"),
        (8, "Dr. Lisa Adams", "Gynecology", "$170"),
        (9, "Dr. David Clark", "Urology", "$165"),
        (10, "Dr. Jessica White", "Dentistry", "$120"),
        (11, "Dr. Mark Robinson", "Psychology", "$135"),
    ]
    .into_iter()
    .map(|(id, name, department, fee)| DoctorEntry {
        id,
        name: name.to_string(),
        department: department.to_string(),
        consultation_fee: Some(fee.to_string()),
    })
    .collect()
}
