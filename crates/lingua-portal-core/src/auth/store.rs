use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use keyring::Entry;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::ApiError;
use crate::config::{Config, TokenBackend, APP_NAME};

/// Key the bearer token is stored under in every scope
pub const TOKEN_KEY: &str = "auth_token";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageScope {
    /// Survives restarts
    Durable,
    /// Lives as long as the process
    Ephemeral,
}

/// One place a token can live.
pub trait TokenScope: Send + Sync {
    fn get(&self) -> Result<Option<String>, ApiError>;
    fn set(&self, token: &str) -> Result<(), ApiError>;
    fn remove(&self) -> Result<(), ApiError>;
}

/// In-process scope
#[derive(Debug, Default)]
pub struct MemoryScope {
    token: Mutex<Option<String>>,
}

impl MemoryScope {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        // A poisoned slot still holds a plain string; keep using it.
        self.token.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl TokenScope for MemoryScope {
    fn get(&self) -> Result<Option<String>, ApiError> {
        Ok(self.slot().clone())
    }

    fn set(&self, token: &str) -> Result<(), ApiError> {
        *self.slot() = Some(token.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<(), ApiError> {
        *self.slot() = None;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredToken {
    token: String,
    stored_at: DateTime<Utc>,
}

/// JSON file in the cache directory
pub struct FileScope {
    path: PathBuf,
}

impl FileScope {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            path: dir.join(format!("{}.json", TOKEN_KEY)),
        }
    }

    fn read(&self) -> Result<Option<StoredToken>, ApiError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)
            .map_err(|e| ApiError::Storage(format!("Failed to read token file: {}", e)))?;
        let stored: StoredToken = serde_json::from_str(&contents)
            .map_err(|e| ApiError::Storage(format!("Failed to parse token file: {}", e)))?;
        Ok(Some(stored))
    }
}

impl TokenScope for FileScope {
    fn get(&self) -> Result<Option<String>, ApiError> {
        Ok(self.read()?.map(|s| s.token))
    }

    fn set(&self, token: &str) -> Result<(), ApiError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ApiError::Storage(format!("Failed to create token directory: {}", e)))?;
        }
        let stored = StoredToken {
            token: token.to_string(),
            stored_at: Utc::now(),
        };
        let contents = serde_json::to_string_pretty(&stored)
            .map_err(|e| ApiError::Storage(e.to_string()))?;
        std::fs::write(&self.path, contents)
            .map_err(|e| ApiError::Storage(format!("Failed to write token file: {}", e)))
    }

    fn remove(&self) -> Result<(), ApiError> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)
                .map_err(|e| ApiError::Storage(format!("Failed to remove token file: {}", e)))?;
        }
        Ok(())
    }
}

/// OS keychain entry
pub struct KeyringScope {
    service: String,
}

impl KeyringScope {
    pub fn new() -> Self {
        Self::with_service(APP_NAME)
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self) -> Result<Entry, ApiError> {
        Entry::new(&self.service, TOKEN_KEY)
            .map_err(|e| ApiError::Storage(format!("Failed to create keyring entry: {}", e)))
    }
}

impl Default for KeyringScope {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenScope for KeyringScope {
    fn get(&self) -> Result<Option<String>, ApiError> {
        match self.entry()?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(ApiError::Storage(format!("Failed to read token from keychain: {}", e))),
        }
    }

    fn set(&self, token: &str) -> Result<(), ApiError> {
        self.entry()?
            .set_password(token)
            .map_err(|e| ApiError::Storage(format!("Failed to store token in keychain: {}", e)))
    }

    fn remove(&self) -> Result<(), ApiError> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(ApiError::Storage(format!("Failed to delete token from keychain: {}", e))),
        }
    }
}

/// Persists the bearer token in a durable or an ephemeral scope.
pub struct SessionStore {
    durable: Box<dyn TokenScope>,
    ephemeral: Box<dyn TokenScope>,
}

impl SessionStore {
    pub fn new(durable: Box<dyn TokenScope>, ephemeral: Box<dyn TokenScope>) -> Self {
        Self { durable, ephemeral }
    }

    /// Durable scope per `config.token_backend`, in-process ephemeral scope
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let durable: Box<dyn TokenScope> = match config.token_backend {
            TokenBackend::File => Box::new(FileScope::new(config.cache_dir()?)),
            TokenBackend::Keyring => Box::new(KeyringScope::new()),
        };
        Ok(Self::new(durable, Box::new(MemoryScope::new())))
    }

    /// Two fresh in-memory scopes
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryScope::new()), Box::new(MemoryScope::new()))
    }

    /// Write to the durable scope when `remember` is set, otherwise to the
    /// ephemeral one. The other scope is left alone.
    pub fn store_token(&self, token: &str, remember: bool) -> Result<(), ApiError> {
        let scope = if remember {
            StorageScope::Durable
        } else {
            StorageScope::Ephemeral
        };
        debug!(?scope, "Storing token");
        self.scope(scope).set(token)
    }

    /// Durable token first, then ephemeral.
    pub fn get_stored_token(&self) -> Result<Option<String>, ApiError> {
        Ok(self.get_stored_session()?.map(|(token, _)| token))
    }

    /// Stored token together with the scope it was found in
    pub fn get_stored_session(&self) -> Result<Option<(String, StorageScope)>, ApiError> {
        if let Some(token) = self.durable.get()?.filter(|t| !t.is_empty()) {
            return Ok(Some((token, StorageScope::Durable)));
        }
        Ok(self
            .ephemeral
            .get()?
            .filter(|t| !t.is_empty())
            .map(|t| (t, StorageScope::Ephemeral)))
    }

    /// Clear both scopes. Both are attempted even if the first fails.
    pub fn remove_stored_token(&self) -> Result<(), ApiError> {
        let durable = self.durable.remove();
        let ephemeral = self.ephemeral.remove();
        durable.and(ephemeral)
    }

    /// Remove `token` from whichever scope still holds it. A different
    /// token written there since is left in place.
    pub fn discard_token(&self, token: &str) -> Result<(), ApiError> {
        for scope in [&self.durable, &self.ephemeral] {
            if scope.get()?.as_deref() == Some(token) {
                scope.remove()?;
            }
        }
        Ok(())
    }

    pub fn scope(&self, scope: StorageScope) -> &dyn TokenScope {
        match scope {
            StorageScope::Durable => self.durable.as_ref(),
            StorageScope::Ephemeral => self.ephemeral.as_ref(),
        }
    }

    /// Structural check only: three dot separated segments. Signature and
    /// expiry are left to the backend.
    pub fn is_token_valid(token: &str) -> bool {
        !token.is_empty() && token.split('.').count() == 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_token_valid_is_structural() {
        assert!(SessionStore::is_token_valid("a.b.c"));
        assert!(SessionStore::is_token_valid("header.payload.signature"));
        // Segments are not inspected
        assert!(SessionStore::is_token_valid(".."));
        assert!(SessionStore::is_token_valid("not.base64!.at-all"));

        assert!(!SessionStore::is_token_valid(""));
        assert!(!SessionStore::is_token_valid("a.b"));
        assert!(!SessionStore::is_token_valid("abc"));
        assert!(!SessionStore::is_token_valid("a.b.c.d"));
    }

    #[test]
    fn test_store_token_respects_remember() {
        let store = SessionStore::in_memory();

        store.store_token("d.u.r", true).unwrap();
        assert_eq!(store.scope(StorageScope::Durable).get().unwrap().as_deref(), Some("d.u.r"));
        assert!(store.scope(StorageScope::Ephemeral).get().unwrap().is_none());

        store.store_token("e.p.h", false).unwrap();
        // Writing one scope does not clear the other
        assert_eq!(store.scope(StorageScope::Durable).get().unwrap().as_deref(), Some("d.u.r"));
        assert_eq!(store.scope(StorageScope::Ephemeral).get().unwrap().as_deref(), Some("e.p.h"));
    }

    #[test]
    fn test_get_stored_token_prefers_durable() {
        let store = SessionStore::in_memory();
        assert!(store.get_stored_token().unwrap().is_none());

        store.store_token("e.p.h", false).unwrap();
        assert_eq!(
            store.get_stored_session().unwrap(),
            Some(("e.p.h".to_string(), StorageScope::Ephemeral))
        );

        store.store_token("d.u.r", true).unwrap();
        assert_eq!(store.get_stored_token().unwrap().as_deref(), Some("d.u.r"));
    }

    #[test]
    fn test_remove_stored_token_is_idempotent() {
        let store = SessionStore::in_memory();
        store.store_token("d.u.r", true).unwrap();
        store.store_token("e.p.h", false).unwrap();

        store.remove_stored_token().unwrap();
        assert!(store.get_stored_token().unwrap().is_none());
        store.remove_stored_token().unwrap();
        assert!(store.get_stored_token().unwrap().is_none());
    }

    #[test]
    fn test_discard_token_only_removes_matching_token() {
        let store = SessionStore::in_memory();
        store.store_token("o.l.d", true).unwrap();
        store.store_token("n.e.w", false).unwrap();

        store.discard_token("o.l.d").unwrap();
        assert!(store.scope(StorageScope::Durable).get().unwrap().is_none());
        assert_eq!(store.get_stored_token().unwrap().as_deref(), Some("n.e.w"));

        // Already replaced, nothing to do
        store.discard_token("o.l.d").unwrap();
        assert_eq!(store.get_stored_token().unwrap().as_deref(), Some("n.e.w"));
    }

    #[test]
    fn test_file_scope_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();

        let scope = FileScope::new(dir.path().to_path_buf());
        assert!(scope.get().unwrap().is_none());
        scope.set("a.b.c").unwrap();
        let written = std::fs::read_to_string(dir.path().join("auth_token.json")).unwrap();
        assert!(written.contains("stored_at"));

        let reopened = FileScope::new(dir.path().to_path_buf());
        assert_eq!(reopened.get().unwrap().as_deref(), Some("a.b.c"));

        reopened.remove().unwrap();
        reopened.remove().unwrap();
        assert!(scope.get().unwrap().is_none());
    }

    #[test]
    fn test_file_scope_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("cache").join(APP_NAME);

        let scope = FileScope::new(nested.clone());
        scope.set("a.b.c").unwrap();
        assert!(nested.join("auth_token.json").exists());
    }

    #[test]
    fn test_file_scope_corrupt_file_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("auth_token.json"), "{not json").unwrap();

        let err = FileScope::new(dir.path().to_path_buf()).get().unwrap_err();
        assert!(matches!(err, ApiError::Storage(_)));
    }
}
