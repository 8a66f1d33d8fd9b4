use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{error, info, warn};

use shared::types::portal_config::AccountConfig;
use shared::types::{
    Identity, LoginError, ProfileAttributes, RegistrationData, RegistrationError, Role,
};

use crate::credentials::password::{
    hash_password, is_acceptable_password, is_valid_email, is_valid_phone_number,
    sanitize_string, verify_password,
};

/// Resolves an email/password pair to an identity.
pub trait CredentialSource: Send + Sync {
    fn verify(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Identity, LoginError>> + Send;
}

#[derive(Debug, Clone)]
struct Account {
    identity: Identity,
    password_hash: String,
}

#[derive(Debug, Default)]
struct DirectoryInner {
    /// Keyed by normalised (trimmed, lowercased) email.
    accounts: HashMap<String, Account>,
    next_id: i64,
}

/// In-memory account store with argon2 password hashes.
///
/// Cheap to clone; clones share the same accounts.
#[derive(Debug, Clone, Default)]
pub struct AccountDirectory {
    inner: Arc<RwLock<DirectoryInner>>,
}

fn normalise_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl AccountDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from `[[accounts]]` entries; hashes are taken as-is.
    pub fn from_config(accounts: &[AccountConfig]) -> Self {
        let mut inner = DirectoryInner::default();
        for account in accounts {
            inner.next_id = inner.next_id.max(account.id);
            inner.accounts.insert(
                normalise_email(&account.email),
                Account {
                    identity: Identity {
                        id: account.id,
                        name: account.name.clone(),
                        email: account.email.clone(),
                        role: account.role,
                        profile: account.profile.clone(),
                    },
                    password_hash: account.password_hash.clone(),
                },
            );
        }
        info!("Account directory seeded with {} accounts", inner.accounts.len());
        Self {
            inner: Arc::new(RwLock::new(inner)),
        }
    }

    /// Add an account with a plaintext password, replacing any account with
    /// the same email.
    pub async fn add_account(&self, identity: Identity, password: &str) -> anyhow::Result<()> {
        let password_hash = hash_password(password)?;
        let mut inner = self.inner.write().await;
        inner.next_id = inner.next_id.max(identity.id);
        inner.accounts.insert(
            normalise_email(&identity.email),
            Account {
                identity,
                password_hash,
            },
        );
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.accounts.len()
    }

    pub async fn find_by_email(&self, email: &str) -> Option<Identity> {
        self.inner
            .read()
            .await
            .accounts
            .get(&normalise_email(email))
            .map(|a| a.identity.clone())
    }

    /// Patient self-registration. The role is always `patient`; the caller is
    /// sent to sign in afterwards rather than being logged in.
    pub async fn register(&self, data: RegistrationData) -> Result<Identity, RegistrationError> {
        let name = sanitize_string(&data.name);
        let email = sanitize_string(&data.email);
        validate_registration(&name, &email, &data)?;

        let password_hash = hash_password(&data.password).map_err(|e| {
            error!("Password hashing failed during registration: {}", e);
            RegistrationError::InternalError
        })?;

        let mut inner = self.inner.write().await;
        let key = normalise_email(&email);
        if inner.accounts.contains_key(&key) {
            warn!("Registration rejected, email already registered: {}", email);
            return Err(RegistrationError::EmailTaken);
        }

        inner.next_id += 1;
        let identity = Identity {
            id: inner.next_id,
            name,
            email,
            role: Role::Patient,
            profile: ProfileAttributes {
                age: data.age,
                blood_group: data.blood_group.clone(),
                ..ProfileAttributes::default()
            },
        };
        inner.accounts.insert(
            key,
            Account {
                identity: identity.clone(),
                password_hash,
            },
        );

        info!("Patient registered: {}", identity);
        Ok(identity)
    }
}

fn validate_registration(
    name: &str,
    email: &str,
    data: &RegistrationData,
) -> Result<(), RegistrationError> {
    if name.is_empty() {
        return Err(RegistrationError::MissingField("name".to_string()));
    }
    if email.is_empty() {
        return Err(RegistrationError::MissingField("email".to_string()));
    }
    if !is_valid_email(email) {
        return Err(RegistrationError::InvalidEmail);
    }
    if data.password.is_empty() {
        return Err(RegistrationError::MissingField("password".to_string()));
    }
    if !is_acceptable_password(&data.password) {
        return Err(RegistrationError::InvalidPassword);
    }
    if data.password != data.confirm_password {
        return Err(RegistrationError::PasswordMismatch);
    }
    let phone = data.phone_number.trim();
    if phone.is_empty() {
        return Err(RegistrationError::MissingField("phone_number".to_string()));
    }
    if !is_valid_phone_number(phone) {
        return Err(RegistrationError::InvalidPhoneNumber);
    }
    if data.gender.trim().is_empty() {
        return Err(RegistrationError::MissingField("gender".to_string()));
    }
    if data.address.trim().is_empty() {
        return Err(RegistrationError::MissingField("address".to_string()));
    }
    Ok(())
}

impl CredentialSource for AccountDirectory {
    async fn verify(&self, email: &str, password: &str) -> Result<Identity, LoginError> {
        let account = self
            .inner
            .read()
            .await
            .accounts
            .get(&normalise_email(email))
            .cloned()
            .ok_or_else(|| {
                warn!("No account for email: {}", email);
                LoginError::InvalidCredentials
            })?;

        let password_valid = verify_password(&account.password_hash, password).map_err(|e| {
            error!("Password verification error: {}", e);
            LoginError::InternalError
        })?;

        if !password_valid {
            warn!("Invalid password for: {}", email);
            return Err(LoginError::InvalidCredentials);
        }

        Ok(account.identity)
    }
}
