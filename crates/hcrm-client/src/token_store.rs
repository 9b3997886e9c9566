//! Durable storage for the bearer session.
//!
//! The session is two string entries, the raw token and its expiry in epoch
//! seconds, kept in a small key-value store. Every store operation is atomic
//! with respect to the others, so a reader never observes a token without its
//! expiry or the other way round.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::{CrmError, CrmResult};

/// Storage key for the raw bearer token.
pub const TOKEN_KEY: &str = "auth_token";

/// Storage key for the token expiry (epoch seconds).
pub const EXPIRES_KEY: &str = "token_expires";

// =============================================================================
// Session
// =============================================================================

/// An authenticated session. Replaced wholesale, never mutated.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub expires_at: i64,
}

impl Session {
    pub fn new(token: impl Into<String>, expires_at: i64) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    /// Valid strictly before the expiry instant.
    pub fn is_valid_at(&self, now: i64) -> bool {
        now < self.expires_at
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now().timestamp())
    }

    /// Seconds until expiry; negative once expired.
    pub fn seconds_remaining_at(&self, now: i64) -> i64 {
        self.expires_at - now
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

// =============================================================================
// Key-value backends
// =============================================================================

/// Durable string key-value storage. Each call is atomic.
pub trait KeyValueStore: Send + Sync {
    /// Read several keys in one snapshot.
    fn read(&self, keys: &[&str]) -> CrmResult<Vec<Option<String>>>;

    /// Write several entries at once.
    fn write(&self, entries: &[(&str, &str)]) -> CrmResult<()>;

    /// Remove keys; missing keys are not an error.
    fn remove(&self, keys: &[&str]) -> CrmResult<()>;
}

/// In-process store, lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> CrmResult<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| CrmError::storage("memory store lock poisoned"))
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, keys: &[&str]) -> CrmResult<Vec<Option<String>>> {
        let entries = self.lock()?;
        Ok(keys.iter().map(|k| entries.get(*k).cloned()).collect())
    }

    fn write(&self, new_entries: &[(&str, &str)]) -> CrmResult<()> {
        let mut entries = self.lock()?;
        for (key, value) in new_entries {
            entries.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }

    fn remove(&self, keys: &[&str]) -> CrmResult<()> {
        let mut entries = self.lock()?;
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }
}

/// JSON file store. Writes go to a temp file in the same directory and are
/// renamed into place.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing or corrupt file reads as empty.
    fn load_map(&self) -> CrmResult<BTreeMap<String, String>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(CrmError::storage(format!(
                    "failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        match serde_json::from_str(&raw) {
            Ok(map) => Ok(map),
            Err(e) => {
                warn!(path = %self.path.display(), "Ignoring corrupt session file: {}", e);
                Ok(BTreeMap::new())
            }
        }
    }

    fn store_map(&self, map: &BTreeMap<String, String>) -> CrmResult<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| {
            CrmError::storage(format!("failed to create {}: {}", dir.display(), e))
        })?;

        let body = serde_json::to_vec_pretty(map)
            .map_err(|e| CrmError::storage(format!("failed to encode session: {}", e)))?;

        let mut tmp = NamedTempFile::new_in(&dir)
            .map_err(|e| CrmError::storage(format!("failed to create temp file: {}", e)))?;
        tmp.write_all(&body)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| CrmError::storage(format!("failed to write session: {}", e)))?;
        tmp.persist(&self.path).map_err(|e| {
            CrmError::storage(format!("failed to replace {}: {}", self.path.display(), e.error))
        })?;
        Ok(())
    }

    fn guard(&self) -> CrmResult<std::sync::MutexGuard<'_, ()>> {
        self.lock
            .lock()
            .map_err(|_| CrmError::storage("session file lock poisoned"))
    }
}

impl KeyValueStore for FileStore {
    fn read(&self, keys: &[&str]) -> CrmResult<Vec<Option<String>>> {
        let _guard = self.guard()?;
        let map = self.load_map()?;
        Ok(keys.iter().map(|k| map.get(*k).cloned()).collect())
    }

    fn write(&self, entries: &[(&str, &str)]) -> CrmResult<()> {
        let _guard = self.guard()?;
        let mut map = self.load_map()?;
        for (key, value) in entries {
            map.insert((*key).to_string(), (*value).to_string());
        }
        self.store_map(&map)
    }

    fn remove(&self, keys: &[&str]) -> CrmResult<()> {
        let _guard = self.guard()?;
        let mut map = self.load_map()?;
        let before = map.len();
        for key in keys {
            map.remove(*key);
        }
        if map.len() == before && !self.path.exists() {
            return Ok(());
        }
        self.store_map(&map)
    }
}

// =============================================================================
// Token store
// =============================================================================

/// Persists the session under [`TOKEN_KEY`] / [`EXPIRES_KEY`].
pub struct TokenStore {
    backend: std::sync::Arc<dyn KeyValueStore>,
}

impl TokenStore {
    pub fn new(backend: std::sync::Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(std::sync::Arc::new(MemoryStore::new()))
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(std::sync::Arc::new(FileStore::new(path)))
    }

    pub fn save(&self, session: &Session) -> CrmResult<()> {
        let expires = session.expires_at.to_string();
        self.backend
            .write(&[(TOKEN_KEY, session.token.as_str()), (EXPIRES_KEY, expires.as_str())])?;
        debug!(expires_at = session.expires_at, "Session persisted");
        Ok(())
    }

    /// Absent when either key is missing or the expiry does not parse.
    pub fn load(&self) -> CrmResult<Option<Session>> {
        let values = self.backend.read(&[TOKEN_KEY, EXPIRES_KEY])?;
        let mut values = values.into_iter();
        let token = values.next().flatten();
        let expires = values.next().flatten();

        Ok(match (token, expires) {
            (Some(token), Some(expires)) if !token.is_empty() => expires
                .trim()
                .parse::<i64>()
                .ok()
                .map(|expires_at| Session::new(token, expires_at)),
            _ => None,
        })
    }

    pub fn clear(&self) -> CrmResult<()> {
        self.backend.remove(&[TOKEN_KEY, EXPIRES_KEY])
    }
}
