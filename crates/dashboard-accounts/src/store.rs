//! Key-Value Persistence
//!
//! Everything the dashboard remembers lives under a handful of string keys
//! holding JSON text. Two backends: in-memory for tests and development, and
//! a single JSON file for anything that should survive a restart.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{AccountError, Result};

/// Run store or hashing work on the blocking pool. Async callers go through
/// this for anything that may touch the file store or hash a password.
pub async fn run_blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AccountError::Storage(format!("blocking task failed: {e}")))?
}

/// Well-known storage keys
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreKey {
    Users,
    Session,
    SyncCodes,
    Settings,
    Insights,
    /// Per-user transaction ledger
    Transactions(String),
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Users => f.write_str("ct_users_v1"),
            Self::Session => f.write_str("ct_session_v1"),
            Self::SyncCodes => f.write_str("ct_sync_codes_v1"),
            Self::Settings => f.write_str("ct_settings_v1"),
            Self::Insights => f.write_str("ai-insights-data"),
            Self::Transactions(user) => write!(f, "ct_tx_v1:{user}"),
        }
    }
}

/// Callback for an atomic read-modify-write. Receives the current raw value
/// and returns the value to store; `None` deletes the key.
pub type UpdateFn<'a> = dyn FnMut(Option<String>) -> Result<Option<String>> + 'a;

/// String key-value storage
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: String) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;

    /// Read, transform and write back under one lock. Nothing is written if
    /// the callback fails.
    fn update(&self, key: &str, f: &mut UpdateFn<'_>) -> Result<()>;
}

fn read_lock<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|_| AccountError::Storage("store lock poisoned".into()))
}

fn write_lock<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|_| AccountError::Storage("store lock poisoned".into()))
}

fn apply_update(map: &mut BTreeMap<String, String>, key: &str, f: &mut UpdateFn<'_>) -> Result<()> {
    match f(map.get(key).cloned())? {
        Some(value) => {
            map.insert(key.to_string(), value);
        }
        None => {
            map.remove(key);
        }
    }
    Ok(())
}

/// In-memory store (for development and tests)
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(read_lock(&self.entries)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        write_lock(&self.entries)?.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        write_lock(&self.entries)?.remove(key);
        Ok(())
    }

    fn update(&self, key: &str, f: &mut UpdateFn<'_>) -> Result<()> {
        let mut entries = write_lock(&self.entries)?;
        apply_update(&mut entries, key, f)
    }
}

/// Store persisted as one JSON object on disk, rewritten on every change
pub struct JsonFileStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Open or create the store at `path`. A file that is not a JSON object
    /// of strings is an error rather than being silently replaced.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        tracing::info!(path = %path.display(), keys = entries.len(), "opened store");
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(read_lock(&self.entries)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        let mut entries = write_lock(&self.entries)?;
        entries.insert(key.to_string(), value);
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = write_lock(&self.entries)?;
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }

    fn update(&self, key: &str, f: &mut UpdateFn<'_>) -> Result<()> {
        let mut entries = write_lock(&self.entries)?;
        let mut next = entries.clone();
        apply_update(&mut next, key, f)?;
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }
}

/// Typed JSON access on top of any [`KeyValueStore`]
pub trait StoreExt: KeyValueStore {
    /// Load and decode a value. Missing and undecodable values both read as
    /// `None`; the latter is logged.
    fn load_json<T: DeserializeOwned>(&self, key: &StoreKey) -> Result<Option<T>> {
        let key = key.to_string();
        let Some(raw) = self.get(&key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "discarding unreadable stored value");
                Ok(None)
            }
        }
    }

    fn save_json<T: Serialize>(&self, key: &StoreKey, value: &T) -> Result<()> {
        self.set(&key.to_string(), serde_json::to_string(value)?)
    }

    fn delete(&self, key: &StoreKey) -> Result<()> {
        self.remove(&key.to_string())
    }

    /// Atomically update a decoded value, starting from `T::default()` when
    /// the key is missing or unreadable
    fn update_json<T, R, F>(&self, key: &StoreKey, f: F) -> Result<R>
    where
        T: Serialize + DeserializeOwned + Default,
        F: FnOnce(&mut T) -> Result<R>,
    {
        let mut f = Some(f);
        let mut out = None;
        self.update(&key.to_string(), &mut |raw| {
            let mut value: T = raw
                .as_deref()
                .and_then(|r| serde_json::from_str(r).ok())
                .unwrap_or_default();
            let f = f
                .take()
                .ok_or_else(|| AccountError::Storage("update callback ran twice".into()))?;
            out = Some(f(&mut value)?);
            Ok(Some(serde_json::to_string(&value)?))
        })?;
        out.ok_or_else(|| AccountError::Storage("update callback never ran".into()))
    }
}

impl<S: KeyValueStore + ?Sized> StoreExt for S {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;

    #[test]
    fn test_key_names() {
        assert_eq!(StoreKey::Users.to_string(), "ct_users_v1");
        assert_eq!(StoreKey::Insights.to_string(), "ai-insights-data");
        assert_eq!(StoreKey::Transactions("alice".into()).to_string(), "ct_tx_v1:alice");
    }

    #[test]
    fn test_memory_roundtrip_and_corruption() {
        let store = MemoryStore::new();
        store.save_json(&StoreKey::Settings, &vec![1, 2, 3]).unwrap();
        let back: Option<Vec<i32>> = store.load_json(&StoreKey::Settings).unwrap();
        assert_eq!(back, Some(vec![1, 2, 3]));

        store.set("ct_users_v1", "{not json".into()).unwrap();
        let users: Option<HashMap<String, String>> = store.load_json(&StoreKey::Users).unwrap();
        assert!(users.is_none());
    }

    #[test]
    fn test_update_json_is_all_or_nothing() {
        let store = MemoryStore::new();
        let n: usize = store
            .update_json(&StoreKey::SyncCodes, |v: &mut Vec<u8>| {
                v.push(1);
                Ok(v.len())
            })
            .unwrap();
        assert_eq!(n, 1);

        let failed: Result<()> = store.update_json(&StoreKey::SyncCodes, |v: &mut Vec<u8>| {
            v.push(2);
            Err(AccountError::InvalidInput("nope".into()))
        });
        assert!(failed.is_err());

        let stored: Option<Vec<u8>> = store.load_json(&StoreKey::SyncCodes).unwrap();
        assert_eq!(stored, Some(vec![1]));
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        {
            let store = JsonFileStore::open(&path).unwrap();
            store.save_json(&StoreKey::Session, &"bob").unwrap();
            store.set("scratch", "1".into()).unwrap();
            store.remove("scratch").unwrap();
        }

        let store = JsonFileStore::open(&path).unwrap();
        let session: Option<String> = store.load_json(&StoreKey::Session).unwrap();
        assert_eq!(session.as_deref(), Some("bob"));
        assert!(store.get("scratch").unwrap().is_none());
    }

    #[test]
    fn test_file_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "[1, 2]").unwrap();
        assert!(JsonFileStore::open(&path).is_err());
    }

    #[tokio::test]
    async fn test_run_blocking_writes_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let store = Arc::new(JsonFileStore::open(&path).unwrap());

        let writer = store.clone();
        run_blocking(move || writer.save_json(&StoreKey::Session, &"alice"))
            .await
            .unwrap();

        let reopened = JsonFileStore::open(&path).unwrap();
        let session: Option<String> = reopened.load_json(&StoreKey::Session).unwrap();
        assert_eq!(session.as_deref(), Some("alice"));

        let err = run_blocking(|| -> Result<()> { Err(AccountError::NotLoggedIn) }).await;
        assert!(matches!(err, Err(AccountError::NotLoggedIn)));
    }
}
