use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, error, info};

use crate::types::portal_config::{AppConfig, ConfigError, MAX_TOKEN_EXPIRY_MINUTES};

pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
    let path = path.as_ref();
    info!("Loading configuration from: {}", path.display());

    let contents = fs::read_to_string(path)?;
    debug!("Processing file: {}", path.display());

    let config = parse_config(&contents)?;

    info!("Configuration loaded successfully");
    Ok(config)
}

/// Parse and validate a TOML document.
pub fn parse_config(contents: &str) -> Result<AppConfig, ConfigError> {
    if contents.trim().is_empty() {
        error!("Configuration file is empty");
        return Err(ConfigError::InvalidConfig("empty file".into()));
    }

    let config: AppConfig = toml::from_str(contents)?;
    debug!(
        "Config: expiry={}m, window={}d, doctors={}, accounts={}",
        config.auth.token_expiry_minutes,
        config.booking.window_days,
        config.booking.doctors.len(),
        config.accounts.len()
    );

    validate_config(&config)?;

    info!("Config validated");

    Ok(config)
}

fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.auth.token_expiry_minutes == 0 {
        return Err(ConfigError::InvalidConfig(
            "token_expiry_minutes must be greater than 0".into(),
        ));
    }
    if config.auth.token_expiry_minutes > MAX_TOKEN_EXPIRY_MINUTES
        || config.auth.token_expiry_secs().is_none()
    {
        return Err(ConfigError::InvalidConfig(format!(
            "token_expiry_minutes must be at most {}",
            MAX_TOKEN_EXPIRY_MINUTES
        )));
    }

    // Tokens are minted at login, so a missing key must fail at load time
    // rather than on the first sign-in.
    match config.auth.resolved_jwt_secret() {
        None => {
            return Err(ConfigError::InvalidConfig(
                "jwt_secret must be set via the JWT_SECRET env var or auth.jwt_secret config field"
                    .into(),
            ));
        }
        Some(secret) if secret.len() < 32 => {
            return Err(ConfigError::InvalidConfig(
                "jwt_secret must be at least 32 characters long".into(),
            ));
        }
        _ => {}
    }

    if config.storage.token_path.as_os_str().is_empty() {
        return Err(ConfigError::InvalidConfig(
            "storage.token_path cannot be empty".into(),
        ));
    }

    if !(1..=60).contains(&config.booking.window_days) {
        return Err(ConfigError::InvalidConfig(
            "booking.window_days must be between 1 and 60".into(),
        ));
    }

    let mut doctor_ids = HashSet::new();
    for doctor in &config.booking.doctors {
        if doctor.department.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(format!(
                "doctor {} has no department",
                doctor.id
            )));
        }
        if !doctor_ids.insert(doctor.id) {
            return Err(ConfigError::InvalidConfig(format!(
                "duplicate doctor id: {}",
                doctor.id
            )));
        }
    }

    let mut account_ids = HashSet::new();
    let mut emails = HashSet::new();
    for account in &config.accounts {
        if !account_ids.insert(account.id) {
            return Err(ConfigError::InvalidConfig(format!(
                "duplicate account id: {}",
                account.id
            )));
        }
        if !emails.insert(account.email.to_lowercase()) {
            return Err(ConfigError::InvalidConfig(format!(
                "duplicate account email: {}",
                account.email
            )));
        }
    }

    Ok(())
}
