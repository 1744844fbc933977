//! Key/value persistence for client state.
//!
//! The playlist is stored as one JSON array under a single key. Reads never
//! fail from the caller's point of view: missing or unreadable data is an
//! empty playlist.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, warn};
use vidrelay_core::config::ClientConfig;

use crate::playlist::{Playlist, PlaylistEntry};

/// Errors raised by key/value stores.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Key cannot be mapped to a storage location.
    #[error("invalid storage key: {key}")]
    InvalidKey { key: String },

    /// Underlying read or write failed.
    #[error("storage I/O failed for {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Value could not be encoded.
    #[error("failed to encode {key}: {reason}")]
    Encode { key: String, reason: String },
}

/// String key/value store.
#[async_trait]
pub trait KeyValueStore: Send + Sync + std::fmt::Debug {
    /// Value under `key`, `None` if never written.
    ///
    /// # Errors
    /// - `StorageError::InvalidKey` - Key not representable by this store
    /// - `StorageError::Io` - Backend read failed
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replaces the value under `key`.
    ///
    /// # Errors
    /// - `StorageError::InvalidKey` - Key not representable by this store
    /// - `StorageError::Io` - Backend write failed
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Process-local store for tests and ephemeral sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One `{key}.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Store rooted at `dir`; the directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(StorageError::InvalidKey {
                key: key.to_string(),
            });
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let io = |source| StorageError::Io {
            key: key.to_string(),
            source,
        };

        tokio::fs::create_dir_all(&self.dir).await.map_err(io)?;
        // Write then rename so a crash never leaves a half-written array.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value).await.map_err(io)?;
        tokio::fs::rename(&tmp, &path).await.map_err(io)?;
        debug!("Wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }
}

/// Loads and saves the playlist under one key.
#[derive(Debug, Clone)]
pub struct PlaylistStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl PlaylistStore {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Store under the configured key.
    pub fn from_config(store: Arc<dyn KeyValueStore>, config: &ClientConfig) -> Self {
        Self::new(store, config.storage_key.clone())
    }

    /// On-disk store in the configured state directory.
    pub fn on_disk(config: &ClientConfig) -> Self {
        Self::from_config(Arc::new(FileStore::new(config.state_dir.clone())), config)
    }

    /// Saved playlist. Unreadable or corrupt data loads as empty; entries
    /// with invalid identifiers are skipped.
    pub async fn load(&self) -> Playlist {
        let raw = match self.store.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Playlist::new(),
            Err(e) => {
                warn!("Failed to read saved playlist: {}", e);
                return Playlist::new();
            }
        };

        let values: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
            Ok(values) => values,
            Err(e) => {
                warn!("Saved playlist is corrupt, starting empty: {}", e);
                return Playlist::new();
            }
        };

        let entries = values.into_iter().filter_map(|value| {
            serde_json::from_value::<PlaylistEntry>(value)
                .inspect_err(|e| warn!("Skipping invalid playlist entry: {}", e))
                .ok()
        });
        Playlist::from_entries(entries)
    }

    /// Persists the playlist in display order.
    ///
    /// # Errors
    /// - `StorageError::Encode` - Serialization failed
    /// - `StorageError::Io` - Backend write failed
    pub async fn save(&self, playlist: &Playlist) -> Result<(), StorageError> {
        let entries: Vec<&PlaylistEntry> = playlist.iter().collect();
        let raw = serde_json::to_string(&entries).map_err(|e| StorageError::Encode {
            key: self.key.clone(),
            reason: e.to_string(),
        })?;
        self.store.set(&self.key, &raw).await
    }
}

#[cfg(test)]
mod tests {
    use vidrelay_core::MediaId;

    use super::*;

    fn playlist() -> Playlist {
        Playlist::from_entries(["aaaaaaaaaaa", "bbbbbbbbbbb", "ccccccccccc"].map(|id| {
            PlaylistEntry::new(MediaId::parse(id).unwrap(), format!("https://youtu.be/{id}"))
        }))
    }

    #[tokio::test]
    async fn test_persist_then_reload_keeps_order() {
        let store = PlaylistStore::new(Arc::new(MemoryStore::new()), "youtube-playlist");
        let original = playlist();

        store.save(&original).await.unwrap();
        let loaded = store.load().await;

        assert_eq!(loaded.ids(), original.ids());
        assert_eq!(
            loaded.iter().collect::<Vec<_>>(),
            original.iter().collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn test_missing_and_corrupt_data_load_empty() {
        let memory = Arc::new(MemoryStore::new());
        let store = PlaylistStore::new(memory.clone(), "youtube-playlist");
        assert!(store.load().await.is_empty());

        memory.set("youtube-playlist", "{not json").await.unwrap();
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_entries_are_skipped() {
        let memory = Arc::new(MemoryStore::new());
        memory
            .set(
                "youtube-playlist",
                r#"[{"id":"bad","url":"x","addedAt":"2024-01-01T00:00:00Z"},
                    {"id":"dQw4w9WgXcQ","url":"y","addedAt":"2024-01-01T00:00:00Z"}]"#,
            )
            .await
            .unwrap();

        let loaded = PlaylistStore::new(memory, "youtube-playlist").load().await;
        assert_eq!(loaded.len(), 1);
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("state"));

        assert_eq!(store.get("youtube-playlist").await.unwrap(), None);
        store.set("youtube-playlist", "[]").await.unwrap();
        assert_eq!(
            store.get("youtube-playlist").await.unwrap().as_deref(),
            Some("[]")
        );
        assert!(dir.path().join("state/youtube-playlist.json").exists());
    }

    #[tokio::test]
    async fn test_on_disk_store_uses_configured_key_and_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig {
            storage_key: "queue".to_string(),
            state_dir: dir.path().join("state"),
            ..ClientConfig::default()
        };

        let store = PlaylistStore::on_disk(&config);
        store.save(&playlist()).await.unwrap();
        assert!(dir.path().join("state/queue.json").exists());

        let reloaded = PlaylistStore::on_disk(&config).load().await;
        assert_eq!(reloaded.ids(), playlist().ids());
    }

    #[tokio::test]
    async fn test_file_store_rejects_path_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        assert!(matches!(
            store.set("../escape", "[]").await,
            Err(StorageError::InvalidKey { .. })
        ));
    }
}
