//! Credential storage and management

use anyhow::{Context, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Access credential currently in use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    /// Role claim decoded from the token, if it could be read
    pub role: Option<String>,
}

/// Failure to read the role claim out of an access token.
#[derive(Debug, Error)]
pub enum ClaimsError {
    #[error("token is not a three-part JWT")]
    Malformed,
    #[error("token payload is not base64url: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("token payload is not JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decode the role claim from a JWT access token.
///
/// Reads `role` as a string, falling back to the first entry of a `roles`
/// array. A well-formed token without either claim yields `Ok(None)`.
/// The signature is not checked; the server is the authority on validity.
pub fn decode_role(token: &str) -> Result<Option<String>, ClaimsError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(ClaimsError::Malformed);
    }
    let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(parts[1].trim_end_matches('='))?;
    let claims: serde_json::Value = serde_json::from_slice(&decoded)?;

    if let Some(role) = claims.get("role").and_then(|v| v.as_str()) {
        return Ok(Some(role.to_string()));
    }
    Ok(claims
        .get("roles")
        .and_then(|v| v.as_array())
        .and_then(|roles| roles.first())
        .and_then(|v| v.as_str())
        .map(String::from))
}

/// Session record as written to durable storage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub access_token: Option<String>,
    pub role: Option<String>,
    /// Cookie header value for the API origin (carries the refresh cookie)
    pub session_cookies: Option<String>,
}

/// Durable storage backend for the session record
pub trait TokenStorage: Send + Sync {
    fn load(&self) -> Result<Option<StoredSession>>;
    fn save(&self, session: &StoredSession) -> Result<()>;
    fn remove(&self) -> Result<()>;
}

/// TOML file storage, readable only by the owner on unix.
pub struct FileTokenStorage {
    path: PathBuf,
}

impl FileTokenStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl TokenStorage for FileTokenStorage {
    fn load(&self) -> Result<Option<StoredSession>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path).context("Failed to read credentials file")?;
        let session = toml::from_str(&content).context("Failed to parse credentials file")?;
        Ok(Some(session))
    }

    fn save(&self, session: &StoredSession) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).context("Failed to create config directory")?;
        }
        let content =
            toml::to_string_pretty(session).context("Failed to serialize credentials")?;
        fs::write(&self.path, content).context("Failed to write credentials file")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&self.path, perms)
                .context("Failed to set credentials permissions")?;
        }

        Ok(())
    }

    fn remove(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path).context("Failed to remove credentials file")?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct SessionState {
    credential: Option<Credential>,
    session_cookies: Option<String>,
}

impl SessionState {
    fn to_stored(&self) -> StoredSession {
        StoredSession {
            access_token: self.credential.as_ref().map(|c| c.token.clone()),
            role: self.credential.as_ref().and_then(|c| c.role.clone()),
            session_cookies: self.session_cookies.clone(),
        }
    }
}

/// Process-wide credential holder, mirrored to durable storage.
///
/// None of the operations fail: storage errors and undecodable tokens are
/// logged and the in-memory state is updated regardless.
#[derive(Clone)]
pub struct CredentialStore {
    state: Arc<Mutex<SessionState>>,
    storage: Arc<dyn TokenStorage>,
}

impl CredentialStore {
    /// Open the store, seeding memory from durable storage.
    pub fn open(storage: Arc<dyn TokenStorage>) -> Self {
        let state = match storage.load() {
            Ok(Some(stored)) => SessionState {
                credential: stored
                    .access_token
                    .filter(|t| !t.is_empty())
                    .map(|token| Credential {
                        token,
                        role: stored.role,
                    }),
                session_cookies: stored.session_cookies,
            },
            Ok(None) => SessionState::default(),
            Err(e) => {
                tracing::warn!("Ignoring unreadable credentials: {:#}", e);
                SessionState::default()
            }
        };

        Self {
            state: Arc::new(Mutex::new(state)),
            storage,
        }
    }

    pub fn get(&self) -> Option<Credential> {
        self.lock().credential.clone()
    }

    pub fn token(&self) -> Option<String> {
        self.lock().credential.as_ref().map(|c| c.token.clone())
    }

    /// Replace the current credential. An empty token clears the store.
    pub fn set(&self, token: &str) {
        if token.is_empty() {
            tracing::warn!("Refusing to store an empty access token, clearing instead");
            self.clear();
            return;
        }

        let role = match decode_role(token) {
            Ok(role) => role,
            Err(e) => {
                tracing::warn!("Could not decode role from access token: {}", e);
                None
            }
        };

        let stored = {
            let mut state = self.lock();
            state.credential = Some(Credential {
                token: token.to_string(),
                role,
            });
            state.to_stored()
        };
        self.persist(&stored);
    }

    pub fn session_cookies(&self) -> Option<String> {
        self.lock().session_cookies.clone()
    }

    pub fn set_session_cookies(&self, cookies: Option<String>) {
        let stored = {
            let mut state = self.lock();
            if state.session_cookies == cookies {
                return;
            }
            state.session_cookies = cookies;
            state.to_stored()
        };
        self.persist(&stored);
    }

    /// Drop the credential and session cookies from memory and storage.
    pub fn clear(&self) {
        *self.lock() = SessionState::default();
        if let Err(e) = self.storage.remove() {
            tracing::warn!("Failed to remove stored credentials: {:#}", e);
        }
    }

    fn persist(&self, stored: &StoredSession) {
        if let Err(e) = self.storage.save(stored) {
            tracing::warn!("Failed to persist credentials: {:#}", e);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// In-memory storage for tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryTokenStorage {
    session: Mutex<Option<StoredSession>>,
}

#[cfg(test)]
impl MemoryTokenStorage {
    pub fn with_session(session: StoredSession) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }

    pub fn stored(&self) -> Option<StoredSession> {
        self.session.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl TokenStorage for MemoryTokenStorage {
    fn load(&self) -> Result<Option<StoredSession>> {
        Ok(self.stored())
    }

    fn save(&self, session: &StoredSession) -> Result<()> {
        *self.session.lock().unwrap() = Some(session.clone());
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        *self.session.lock().unwrap() = None;
        Ok(())
    }
}
