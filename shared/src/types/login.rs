use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::identity::Identity;

// ---------------------------------------------------------------------------
// Login wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct LoginData {
    #[serde(alias = "username")]
    pub email: String,
    pub password: String,
}

/// Successful / failed login response envelope.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoginResponse {
    Success {
        user: Identity,
        /// Session token, also written to the token store.
        token: String,
        expires_in: u64,
        message: String,
        /// Landing route for the user's role.
        redirect: String,
    },
    Error {
        code: String,
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Login errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoginError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Missing required field: {0}")]
    MissingField(String),
    #[error("Please enter a valid email")]
    InvalidEmail,
    #[error("An error occurred during sign in. Please try again.")]
    InternalError,
}

impl LoginError {
    pub fn to_code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::MissingField(_) => "MISSING_FIELD",
            Self::InvalidEmail => "INVALID_EMAIL",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    pub fn to_message(&self) -> String {
        self.to_string()
    }

    pub fn to_response(&self) -> LoginResponse {
        LoginResponse::Error {
            code: self.to_code().to_string(),
            message: self.to_message(),
        }
    }
}

// ---------------------------------------------------------------------------
// Logout
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub status: String,
    pub message: String,
    pub redirect: String,
}

impl LogoutResponse {
    pub fn new(redirect: &str) -> Self {
        Self {
            status: "success".to_string(),
            message: "Logged out successfully".to_string(),
            redirect: redirect.to_string(),
        }
    }
}
