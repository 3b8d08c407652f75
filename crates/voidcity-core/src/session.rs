//! Bearer token lifecycle: storage, expiry checks, and clearing.
//!
//! The token is persisted under a single well-known key. Components never
//! read storage directly; they go through a [`Session`], which wraps an
//! injected [`TokenStore`] so tests can substitute an in-memory one.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, Validation};
use serde::Deserialize;

use crate::error::CoreError;

/// Storage key for the bearer token.
pub const TOKEN_KEY: &str = "jwtToken";

/// Persistent home for the session token.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Option<String>;
    fn save(&self, token: &str) -> Result<(), CoreError>;
    /// Remove the token. Never fails; problems are logged.
    fn remove(&self);
}

/// Process-local token storage.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.token.lock().ok().and_then(|t| t.clone())
    }

    fn save(&self, token: &str) -> Result<(), CoreError> {
        let mut slot = self
            .token
            .lock()
            .map_err(|_| CoreError::Session("token store lock poisoned".into()))?;
        *slot = Some(token.to_string());
        Ok(())
    }

    fn remove(&self) {
        if let Ok(mut slot) = self.token.lock() {
            *slot = None;
        }
    }
}

/// Token persisted as a small JSON document (`{"jwtToken": "..."}`).
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<String> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        let mut doc: HashMap<String, String> = match serde_json::from_str(&content) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "Unreadable session file: {e}");
                return None;
            }
        };
        doc.remove(TOKEN_KEY).filter(|t| !t.is_empty())
    }

    fn save(&self, token: &str) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let doc = HashMap::from([(TOKEN_KEY, token)]);
        let json =
            serde_json::to_string_pretty(&doc).map_err(|e| CoreError::Session(e.to_string()))?;
        write_private(&self.path, json.as_bytes())?;
        Ok(())
    }

    fn remove(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %self.path.display(), "Failed to remove session file: {e}"),
        }
    }
}

/// Write `contents` to a file only the current user can read.
#[cfg(unix)]
fn write_private(path: &std::path::Path, contents: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // `mode` only applies on creation.
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    file.write_all(contents)
}

#[cfg(not(unix))]
fn write_private(path: &std::path::Path, contents: &[u8]) -> std::io::Result<()> {
    std::fs::write(path, contents)
}

/// Shared handle to the current session. Cheap to clone.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn TokenStore>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.token().is_some())
            .finish()
    }
}

impl Session {
    pub fn new(store: impl TokenStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// A session backed by memory only, with no token.
    pub fn in_memory() -> Self {
        Self::new(MemoryTokenStore::new())
    }

    /// The stored token, if any. Does not check expiry.
    pub fn token(&self) -> Option<String> {
        self.store.load()
    }

    /// Persist a freshly issued token.
    pub fn set_token(&self, token: &str) -> Result<(), CoreError> {
        self.store.save(token)?;
        tracing::info!(expires_at = ?expires_at(token), "Session token stored");
        Ok(())
    }

    pub fn clear(&self) {
        self.store.remove();
        tracing::info!("Session cleared");
    }

    pub fn is_valid(&self, token: &str) -> bool {
        is_valid_at(token, Utc::now())
    }

    /// Pre-flight check for authenticated views.
    ///
    /// Returns the token when present and unexpired. An expired or malformed
    /// token is cleared before returning `None`.
    pub fn valid_token(&self) -> Option<String> {
        let token = self.token()?;
        if self.is_valid(&token) {
            Some(token)
        } else {
            tracing::info!("Stored token is expired or malformed");
            self.clear();
            None
        }
    }
}

#[derive(Debug, Deserialize)]
struct ExpiryClaim {
    exp: i64,
}

/// Decode the `exp` claim without verifying the signature.
///
/// The client never holds the signing secret; the server remains the
/// authority on whether a token is accepted.
pub fn expires_at(token: &str) -> Option<DateTime<Utc>> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data =
        jsonwebtoken::decode::<ExpiryClaim>(token, &DecodingKey::from_secret(&[]), &validation)
            .ok()?;
    DateTime::from_timestamp(data.claims.exp, 0)
}

/// Whether `token` decodes and its expiry lies after `now`.
pub fn is_valid_at(token: &str, now: DateTime<Utc>) -> bool {
    expires_at(token).is_some_and(|exp| exp > now)
}
