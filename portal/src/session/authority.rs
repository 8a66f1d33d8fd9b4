use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{error, info, warn};

use shared::types::{Identity, LoginData, LoginError, LoginResponse, LogoutResponse};

use crate::credentials::CredentialSource;
use crate::credentials::password::is_valid_email;
use crate::routing::{LANDING_ROUTE, MenuEntry, RouteDecision, RouteTable, menu_for_role, role_home};
use crate::session::store::TokenStore;
use crate::session::token::TokenCodec;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct SessionState {
    /// Flips to `true` once `initialize` has run; never back.
    ready: bool,
    identity: Option<Identity>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    /// `initialize` has not completed; render nothing protected.
    Loading,
    Anonymous,
    Authenticated(Identity),
}

/// Navigation check that respects the loading gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Loading,
    Ready(RouteDecision),
}

// ---------------------------------------------------------------------------
// SessionView: read side
// ---------------------------------------------------------------------------

/// Read-only handle onto the session, handed to every consumer that needs to
/// know who is signed in. Clones observe the same state; only the owning
/// [`SessionAuthority`] writes to it.
#[derive(Debug, Clone)]
pub struct SessionView {
    state: Arc<RwLock<SessionState>>,
}

impl SessionView {
    pub async fn status(&self) -> SessionStatus {
        let state = self.state.read().await;
        match (&state.ready, &state.identity) {
            (false, _) => SessionStatus::Loading,
            (true, None) => SessionStatus::Anonymous,
            (true, Some(identity)) => SessionStatus::Authenticated(identity.clone()),
        }
    }

    pub async fn is_ready(&self) -> bool {
        self.state.read().await.ready
    }

    pub async fn identity(&self) -> Option<Identity> {
        self.state.read().await.identity.clone()
    }

    /// Authorize `path` against `table`, or report `Loading` while the
    /// session is still being restored.
    pub async fn check(&self, table: &RouteTable, path: &str) -> Gate {
        let state = self.state.read().await;
        if !state.ready {
            return Gate::Loading;
        }
        Gate::Ready(table.authorize(path, state.identity.as_ref()))
    }

    /// Sidebar for whoever is signed in; empty when nobody is.
    pub async fn menu(&self) -> &'static [MenuEntry] {
        match &self.state.read().await.identity {
            Some(identity) => menu_for_role(identity.role),
            None => &[],
        }
    }
}

// ---------------------------------------------------------------------------
// SessionAuthority: write side
// ---------------------------------------------------------------------------

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginSuccess {
    pub identity: Identity,
    pub token: String,
    pub expires_in: u64,
    /// The role's landing route.
    pub redirect: &'static str,
}

impl LoginSuccess {
    pub fn to_response(&self) -> LoginResponse {
        LoginResponse::Success {
            user: self.identity.clone(),
            token: self.token.clone(),
            expires_in: self.expires_in,
            message: "Login successful".to_string(),
            redirect: self.redirect.to_string(),
        }
    }
}

/// Single writer of the session: restores it on startup, and performs login
/// and logout.
#[derive(Debug)]
pub struct SessionAuthority<S, C> {
    state: Arc<RwLock<SessionState>>,
    store: S,
    credentials: C,
    codec: TokenCodec,
}

impl<S, C> SessionAuthority<S, C>
where
    S: TokenStore,
    C: CredentialSource,
{
    pub fn new(store: S, credentials: C, codec: TokenCodec) -> Self {
        Self {
            state: Arc::new(RwLock::new(SessionState::default())),
            store,
            credentials,
            codec,
        }
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            state: Arc::clone(&self.state),
        }
    }

    pub fn credentials(&self) -> &C {
        &self.credentials
    }

    /// Restore the identity from the persisted token, if any.
    ///
    /// Never fails: an unreadable, malformed or expired token leaves the
    /// session anonymous, and the bad token is discarded.
    pub async fn initialize(&self) -> SessionStatus {
        let identity = match self.store.read().await {
            Ok(Some(token)) => match self.codec.identity_from(&token) {
                Ok(identity) => {
                    info!("Session restored: {}", identity);
                    Some(identity)
                }
                Err(e) => {
                    warn!("Discarding persisted session token: {}", e);
                    if let Err(e) = self.store.clear().await {
                        warn!("Failed to discard session token: {}", e);
                    }
                    None
                }
            },
            Ok(None) => {
                info!("No persisted session");
                None
            }
            Err(e) => {
                warn!("Could not read persisted session: {}", e);
                None
            }
        };

        let mut state = self.state.write().await;
        state.identity = identity.clone();
        state.ready = true;

        match identity {
            Some(identity) => SessionStatus::Authenticated(identity),
            None => SessionStatus::Anonymous,
        }
    }

    /// Check credentials, persist a fresh token and set the identity.
    ///
    /// On failure the current session is left untouched.
    pub async fn login(&self, data: &LoginData) -> Result<LoginSuccess, LoginError> {
        validate_login(data)?;
        let email = data.email.trim();

        info!("Attempting login for: {}", email);
        let identity = self.credentials.verify(email, &data.password).await?;

        let minted = self.codec.mint(&identity).map_err(|e| {
            error!("Failed to mint session token: {}", e);
            LoginError::InternalError
        })?;

        self.store.store(&minted.token).await.map_err(|e| {
            error!("Failed to persist session token: {}", e);
            LoginError::InternalError
        })?;

        {
            let mut state = self.state.write().await;
            state.identity = Some(identity.clone());
            state.ready = true;
        }

        info!("Login successful: {}", identity);
        Ok(LoginSuccess {
            redirect: role_home(identity.role),
            identity,
            token: minted.token,
            expires_in: self.codec.expiry_secs(),
        })
    }

    /// Forget the identity and delete the persisted token. Always succeeds;
    /// a store failure is logged.
    pub async fn logout(&self) -> LogoutResponse {
        let previous = {
            let mut state = self.state.write().await;
            state.ready = true;
            state.identity.take()
        };

        if let Err(e) = self.store.clear().await {
            error!("Failed to clear session token: {}", e);
        }

        match previous {
            Some(identity) => info!("Logged out: {}", identity),
            None => info!("Logout with no active session"),
        }
        LogoutResponse::new(LANDING_ROUTE)
    }
}

/// Form-level checks done before the credential source is consulted.
fn validate_login(data: &LoginData) -> Result<(), LoginError> {
    let email = data.email.trim();
    if email.is_empty() {
        return Err(LoginError::MissingField("email".to_string()));
    }
    if !is_valid_email(email) {
        return Err(LoginError::InvalidEmail);
    }
    if data.password.is_empty() {
        return Err(LoginError::MissingField("password".to_string()));
    }
    Ok(())
}
