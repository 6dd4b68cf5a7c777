//! Credential Storage
//!
//! Provider access tokens live in a durable key-value store, one key per
//! provider under the `a2a_token_` namespace. The store is injected so tests
//! can swap the JSON file for memory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use orchestra_core::tool::is_internal_provider;
use tokio::sync::Mutex;

use crate::error::{ConnectorError, Result};

/// Key prefix for provider tokens
pub const TOKEN_KEY_PREFIX: &str = "a2a_token_";

/// Durable string key-value store
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory store (for development/testing)
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

/// JSON object on disk, rewritten through a temp file and rename on every
/// change. The whole map is kept in memory; the file is read once at open.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open `path`, starting empty if it does not exist yet
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(data) if data.trim().is_empty() => BTreeMap::new(),
            Ok(data) => serde_json::from_str(&data)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(path = %path.display(), keys = entries.len(), "credential file opened");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        let data = serde_json::to_string_pretty(entries)?;
        // Atomic write: write to temp then rename
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, data.as_bytes()).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().await;
        let mut next = entries.clone();
        next.insert(key.to_owned(), value.to_owned());
        self.persist(&next).await?;
        *entries = next;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().await;
        if !entries.contains_key(key) {
            return Ok(());
        }
        let mut next = entries.clone();
        next.remove(key);
        self.persist(&next).await?;
        *entries = next;
        Ok(())
    }
}

/// Provider-token view over a [`CredentialStore`]
#[derive(Clone)]
pub struct CredentialVault {
    store: Arc<dyn CredentialStore>,
}

impl std::fmt::Debug for CredentialVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVault").finish_non_exhaustive()
    }
}

impl CredentialVault {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Vault backed by memory only
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn token_key(provider_id: &str) -> String {
        format!("{TOKEN_KEY_PREFIX}{provider_id}")
    }

    /// Store a token, or clear it with `None`
    pub async fn set_token(&self, provider_id: &str, token: Option<&str>) -> Result<()> {
        let key = Self::token_key(provider_id);
        match token {
            Some("") => Err(ConnectorError::EmptyToken),
            Some(token) => self.store.set(&key, token).await,
            None => self.store.remove(&key).await,
        }
    }

    pub async fn get_token(&self, provider_id: &str) -> Result<Option<String>> {
        self.store.get(&Self::token_key(provider_id)).await
    }

    /// Internal providers are always authorized; others need a stored token
    pub async fn is_authenticated(&self, provider_id: &str) -> Result<bool> {
        if is_internal_provider(provider_id) {
            return Ok(true);
        }
        Ok(self.get_token(provider_id).await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_vault_set_and_clear() {
        let vault = CredentialVault::in_memory();
        assert!(!vault.is_authenticated("jira").await.unwrap());

        vault.set_token("jira", Some("tok-1")).await.unwrap();
        assert_eq!(vault.get_token("jira").await.unwrap().as_deref(), Some("tok-1"));
        assert!(vault.is_authenticated("jira").await.unwrap());

        vault.set_token("jira", None).await.unwrap();
        assert!(!vault.is_authenticated("jira").await.unwrap());
        assert!(vault.set_token("jira", Some("")).await.is_err());
    }

    #[tokio::test]
    async fn test_internal_providers_always_authenticated() {
        let vault = CredentialVault::in_memory();
        assert!(vault.is_authenticated("internal_orchestra").await.unwrap());
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("credentials.json");

        let vault = CredentialVault::new(Arc::new(FileStore::open(&path).await.unwrap()));
        vault.set_token("github", Some("ghp_x")).await.unwrap();
        vault.set_token("slack", Some("xoxb")).await.unwrap();
        vault.set_token("slack", None).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("a2a_token_github"));
        assert!(!path.with_extension("json.tmp").exists());

        let reopened = CredentialVault::new(Arc::new(FileStore::open(&path).await.unwrap()));
        assert_eq!(reopened.get_token("github").await.unwrap().as_deref(), Some("ghp_x"));
        assert!(reopened.get_token("slack").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_write_leaves_state_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        let path = blocker.join("credentials.json");

        let vault = CredentialVault::new(Arc::new(FileStore::open(&path).await.unwrap()));
        vault.set_token("jira", Some("tok-1")).await.unwrap();

        // Replace the directory with a plain file so every write fails
        std::fs::remove_dir_all(&blocker).unwrap();
        std::fs::write(&blocker, "").unwrap();

        assert!(vault.set_token("github", Some("ghp_x")).await.is_err());
        assert!(!vault.is_authenticated("github").await.unwrap());

        assert!(vault.set_token("jira", None).await.is_err());
        assert_eq!(vault.get_token("jira").await.unwrap().as_deref(), Some("tok-1"));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            FileStore::open(&path).await,
            Err(ConnectorError::Serialization(_))
        ));
    }
}
