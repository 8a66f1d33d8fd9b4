use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationData {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub phone_number: String,
    pub gender: String,
    pub address: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub blood_group: Option<String>,
}

/// Registration response codes
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RegistrationResponse {
    Success {
        user_id: i64,
        email: String,
        message: String,
        redirect: String,
    },
    Error {
        code: String,
        message: String,
    },
}

/// Error codes for registration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("Email is already registered")]
    EmailTaken,
    #[error("Please enter a valid email")]
    InvalidEmail,
    #[error("Password must be at least 6 characters")]
    InvalidPassword,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Please enter a valid phone number")]
    InvalidPhoneNumber,
    #[error("Missing required field: {0}")]
    MissingField(String),
    #[error("An internal error occurred")]
    InternalError,
}

impl RegistrationError {
    pub fn to_code(&self) -> &'static str {
        match self {
            Self::EmailTaken => "EMAIL_TAKEN",
            Self::InvalidEmail => "INVALID_EMAIL",
            Self::InvalidPassword => "INVALID_PASSWORD",
            Self::PasswordMismatch => "PASSWORD_MISMATCH",
            Self::InvalidPhoneNumber => "INVALID_PHONE_NUMBER",
            Self::MissingField(_) => "MISSING_FIELD",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    pub fn to_message(&self) -> String {
        self.to_string()
    }

    pub fn to_response(&self) -> RegistrationResponse {
        RegistrationResponse::Error {
            code: self.to_code().to_string(),
            message: self.to_message(),
        }
    }
}
