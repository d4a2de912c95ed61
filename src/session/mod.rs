pub mod storage;

use log::{ info, warn };
use std::sync::{ Arc, RwLock, RwLockReadGuard, RwLockWriteGuard };
use thiserror::Error;

use crate::api::{ ApiError, Backend };
use crate::models::{ RegisterRequest, UserProfile };
use self::storage::{ CredentialStorage, StorageError, TOKEN_KEY };

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)] Api(#[from] ApiError),
    #[error(transparent)] Storage(#[from] StorageError),
    #[error("{0}")] Validation(String),
    #[error("login succeeded but no token was returned")]
    MissingToken,
}

impl SessionError {
    pub fn user_message(&self) -> String {
        match self {
            SessionError::Api(e) => e.user_message(),
            SessionError::Storage(e) => format!("Could not save the session: {}", e),
            SessionError::Validation(msg) => msg.clone(),
            SessionError::MissingToken => "Login successful but no token received.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verification {
    NotStarted,
    InFlight,
    Done,
}

struct SessionState {
    credential: Option<String>,
    profile: Option<UserProfile>,
    verification: Verification,
    /// Bumped whenever the credential is set or cleared.
    generation: u64,
}

/// Point-in-time copy of the session used for access decisions.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub credential: Option<String>,
    pub profile: Option<UserProfile>,
    pub verifying: bool,
}

impl SessionSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    pub fn username(&self) -> Option<&str> {
        self.profile.as_ref().map(|p| p.username.as_str())
    }
}

/// Bearer credential and profile for the running client, shared as `Arc<SessionStore>`.
///
/// Credential and profile are always set and cleared together. The persisted copy lives in
/// [`CredentialStorage`] under [`TOKEN_KEY`]; once loaded, the in-memory copy is authoritative.
pub struct SessionStore {
    storage: Arc<dyn CredentialStorage>,
    state: RwLock<SessionState>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn CredentialStorage>) -> Self {
        Self {
            storage,
            state: RwLock::new(SessionState {
                credential: None,
                profile: None,
                verification: Verification::NotStarted,
                generation: 0,
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.read();
        SessionSnapshot {
            credential: state.credential.clone(),
            profile: state.profile.clone(),
            verifying: state.verification != Verification::Done,
        }
    }

    pub fn credential(&self) -> Option<String> {
        self.read().credential.clone()
    }

    pub fn profile(&self) -> Option<UserProfile> {
        self.read().profile.clone()
    }

    pub fn is_verifying(&self) -> bool {
        self.read().verification != Verification::Done
    }

    /// Identifies the current session. Two equal values mean no login or logout happened between.
    pub fn generation(&self) -> u64 {
        self.read().generation
    }

    /// Loads the persisted credential and verifies it against the backend.
    ///
    /// Runs at most once; later calls return the current snapshot without any request.
    pub async fn initialize(&self, backend: &dyn Backend) -> SessionSnapshot {
        {
            let mut state = self.write();
            if state.verification != Verification::NotStarted {
                drop(state);
                return self.snapshot();
            }
            state.verification = Verification::InFlight;
        }

        let persisted = match self.storage.get_item(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.trim().is_empty()),
            Err(e) => {
                warn!("Could not read stored session: {}", e);
                None
            }
        };

        let Some(token) = persisted else {
            info!("No stored session found");
            self.write().verification = Verification::Done;
            return self.snapshot();
        };

        let verified = backend.fetch_current_user(Some(&token)).await;

        let mut state = self.write();
        state.verification = Verification::Done;
        if state.credential.is_some() {
            // a login landed while verifying; it wins
            drop(state);
            return self.snapshot();
        }
        match verified {
            Ok(profile) => {
                info!("Restored session for {}", profile.username);
                state.credential = Some(token);
                state.profile = Some(profile);
                state.generation += 1;
            }
            Err(e) => {
                warn!("Stored session rejected, clearing it: {}", e);
                state.credential = None;
                state.profile = None;
                if let Err(e) = self.storage.remove_item(TOKEN_KEY) {
                    warn!("Could not remove stored session: {}", e);
                }
            }
        }
        drop(state);
        self.snapshot()
    }

    pub fn login(&self, token: &str, profile: UserProfile) -> Result<(), SessionError> {
        if token.is_empty() {
            return Err(SessionError::MissingToken);
        }
        self.storage.set_item(TOKEN_KEY, token)?;

        let mut state = self.write();
        info!("Logged in as {}", profile.username);
        state.credential = Some(token.to_string());
        state.profile = Some(profile);
        state.verification = Verification::Done;
        state.generation += 1;
        Ok(())
    }

    pub fn logout(&self) -> Result<(), SessionError> {
        {
            let mut state = self.write();
            if let Some(profile) = state.profile.take() {
                info!("Logged out {}", profile.username);
            }
            if state.credential.take().is_some() {
                state.generation += 1;
            }
        }
        self.storage.remove_item(TOKEN_KEY).map_err(|e| {
            warn!("Could not remove stored session: {}", e);
            SessionError::from(e)
        })
    }

    /// Exchanges credentials for a token, fetches the matching profile, then logs in.
    ///
    /// Bad credentials leave the session untouched. A profile fetch failure after a token was
    /// issued clears the session.
    pub async fn sign_in(
        &self,
        backend: &dyn Backend,
        username: &str,
        password: &str
    ) -> Result<UserProfile, SessionError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(SessionError::Validation("Please enter your username and password.".into()));
        }

        let current = self.credential();
        let token = backend.login(current.as_deref(), username, password).await?;
        if token.access_token.is_empty() {
            return Err(SessionError::MissingToken);
        }

        match backend.fetch_current_user(Some(&token.access_token)).await {
            Ok(profile) => {
                self.login(&token.access_token, profile.clone())?;
                Ok(profile)
            }
            Err(e) => {
                warn!("Token issued but profile fetch failed: {}", e);
                if let Err(clear_err) = self.logout() {
                    warn!("Cleanup after failed sign-in failed: {}", clear_err);
                }
                Err(e.into())
            }
        }
    }

    pub async fn register(
        &self,
        backend: &dyn Backend,
        username: &str,
        password: &str,
        email: Option<&str>
    ) -> Result<(), SessionError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(SessionError::Validation("Username and password are required.".into()));
        }

        let request = RegisterRequest::new(username, password, email);
        let current = self.credential();
        backend.register(current.as_deref(), &request).await?;
        info!("Registered user {}", username);
        Ok(())
    }
}
