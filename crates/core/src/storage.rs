//! Durable key-value storage backing the persisted session.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::StorageError;
use crate::model::Session;

pub const TOKEN_KEY: &str = "token";
pub const EMAIL_KEY: &str = "email";

/// String map that survives restarts. Writes are synchronous.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// JSON object on disk, rewritten in full under a lock on every change.
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = match fs::read(&path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => BTreeMap::new(),
            // An unreadable file is treated as signed out; the next write replaces it.
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|err| {
                tracing::warn!(
                    error = %err,
                    path = %path.display(),
                    "session file is unreadable; starting empty"
                );
                BTreeMap::new()
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StorageError::Io { path, source }),
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let encoded = serde_json::to_vec_pretty(entries)?;
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, encoded).map_err(|source| StorageError::Io {
            path: staging.clone(),
            source,
        })?;
        fs::rename(&staging, &self.path).map_err(|source| StorageError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock();
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock();
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.persist(&entries)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// Reads and writes the credential under its two fixed keys.
#[derive(Clone)]
pub struct SessionStorage {
    store: Arc<dyn KeyValueStore>,
}

impl SessionStorage {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        Ok(Self::new(Arc::new(FileStore::open(path)?)))
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::default()))
    }

    /// A session exists only when both keys are present.
    pub fn load(&self) -> Option<Session> {
        let token = self.store.get(TOKEN_KEY)?;
        let email = self.store.get(EMAIL_KEY)?;
        Some(Session { token, email })
    }

    pub fn token(&self) -> Option<String> {
        self.store.get(TOKEN_KEY)
    }

    pub fn save(&self, session: &Session) -> Result<(), StorageError> {
        self.store.set(TOKEN_KEY, &session.token)?;
        self.store.set(EMAIL_KEY, &session.email)
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        self.store.remove(TOKEN_KEY)?;
        self.store.remove(EMAIL_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use tempfile::TempDir;

    fn session() -> Session {
        Session {
            token: "jwt-abc".into(),
            email: "ana@example.com".into(),
        }
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");

        let storage = SessionStorage::open(&path).unwrap();
        storage.save(&session()).unwrap();

        let reopened = SessionStorage::open(&path).unwrap();
        assert_eq!(reopened.load(), Some(session()));
    }

    #[test]
    fn clear_removes_both_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        let storage = SessionStorage::open(&path).unwrap();
        storage.save(&session()).unwrap();

        storage.clear().unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get(TOKEN_KEY), None);
        assert_eq!(reopened.get(EMAIL_KEY), None);
    }

    #[test]
    fn either_key_missing_means_no_session() {
        let store = Arc::new(MemoryStore::default());
        store.set(TOKEN_KEY, "jwt-abc").unwrap();
        let storage = SessionStorage::new(store.clone());
        assert!(storage.load().is_none());
        assert_eq!(storage.token().as_deref(), Some("jwt-abc"));

        store.set(EMAIL_KEY, "ana@example.com").unwrap();
        assert_eq!(storage.load(), Some(session()));
    }

    #[rstest]
    #[case::truncated("{not json")]
    #[case::wrong_shape("[1, 2, 3]")]
    #[case::non_string_values(r#"{"token": 42}"#)]
    fn corrupt_file_opens_signed_out(#[case] contents: &str) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, contents).unwrap();

        let storage = SessionStorage::open(&path).unwrap();
        assert_eq!(storage.load(), None);

        storage.save(&session()).unwrap();
        let reopened = SessionStorage::open(&path).unwrap();
        assert_eq!(reopened.load(), Some(session()));
    }

    #[test]
    fn corrupt_file_can_be_cleared() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();

        let storage = SessionStorage::open(&path).unwrap();
        storage.clear().unwrap();
        assert_eq!(SessionStorage::open(&path).unwrap().load(), None);
    }

    #[test]
    fn missing_file_opens_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path().join("absent.json")).unwrap();
        assert_eq!(store.get(TOKEN_KEY), None);
    }
}
