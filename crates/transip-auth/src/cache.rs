//! Token caches.
//!
//! A cache maps a name to an opaque byte payload. The authenticator stores the
//! current token there so that a new process does not have to spend one of the
//! account's API tokens when a valid one is still around.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;
use tracing::debug;
use transip_core::Error;

/// Named byte store used to keep tokens between runs.
#[cfg_attr(test, mockall::automock)]
pub trait TokenCache: Send + Sync {
    /// Store or overwrite the payload under `key`.
    ///
    /// # Errors
    ///
    /// Returns a cache error if the payload cannot be persisted.
    fn set(&self, key: &str, data: &[u8]) -> Result<()>;

    /// Payload stored under `key`; empty when nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns a cache error if the cache cannot be read.
    fn get(&self, key: &str) -> Result<Vec<u8>>;
}

/// One cache entry as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheItem {
    /// Entry name
    pub key: String,
    /// Opaque payload, base64 encoded in the file
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheFile {
    #[serde(default)]
    items: Vec<CacheItem>,
}

/// Token cache persisted to a single JSON file: `{"items":[{"key":..,"data":..}]}`.
///
/// The whole file is rewritten on every [`set`](TokenCache::set), through a
/// temporary file in the same directory that is renamed over the existing one.
/// Writers within one process are serialized by a mutex; nothing guards
/// against other processes writing the same file.
#[derive(Debug)]
pub struct FileTokenCache {
    path: PathBuf,
    items: Mutex<Vec<CacheItem>>,
}

impl FileTokenCache {
    /// Open the cache at `path`, creating an empty file when none exists.
    ///
    /// # Errors
    ///
    /// Returns a cache error when the file cannot be created or read, or when
    /// existing content is not a valid cache file.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|err| {
                Error::CacheError(format!(
                    "Failed to open token cache {}: {err}",
                    path.display()
                ))
            })?;

        let contents = fs::read_to_string(&path).map_err(|err| {
            Error::CacheError(format!(
                "Failed to read token cache {}: {err}",
                path.display()
            ))
        })?;

        let file = if contents.trim().is_empty() {
            CacheFile::default()
        } else {
            serde_json::from_str::<CacheFile>(&contents).map_err(|err| {
                Error::CacheError(format!(
                    "Failed to decode token cache {}: {err}",
                    path.display()
                ))
            })?
        };

        debug!(path = %path.display(), items = file.items.len(), "opened token cache");

        Ok(Self {
            path,
            items: Mutex::new(file.items),
        })
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_file(&self, items: &[CacheItem]) -> Result<()> {
        let encoded = serde_json::to_vec(&CacheFile {
            items: items.to_vec(),
        })
        .map_err(|err| Error::CacheError(format!("Failed to encode token cache: {err}")))?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let write_err = |err: std::io::Error| {
            Error::CacheError(format!(
                "Failed to write token cache {}: {err}",
                self.path.display()
            ))
        };

        let mut temp = NamedTempFile::new_in(dir).map_err(write_err)?;
        temp.write_all(&encoded).map_err(write_err)?;
        temp.as_file().sync_all().map_err(write_err)?;
        temp.persist(&self.path)
            .map_err(|err| write_err(err.error))?;

        Ok(())
    }
}

impl TokenCache for FileTokenCache {
    fn set(&self, key: &str, data: &[u8]) -> Result<()> {
        let mut items = self
            .items
            .lock()
            .map_err(|_| Error::CacheError("token cache lock poisoned".to_string()))?;

        let mut updated = items.clone();
        match updated.iter_mut().find(|item| item.key == key) {
            Some(item) => item.data = data.to_vec(),
            None => updated.push(CacheItem {
                key: key.to_string(),
                data: data.to_vec(),
            }),
        }

        self.write_file(&updated)?;
        *items = updated;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>> {
        let items = self
            .items
            .lock()
            .map_err(|_| Error::CacheError("token cache lock poisoned".to_string()))?;

        Ok(items
            .iter()
            .find(|item| item.key == key)
            .map(|item| item.data.clone())
            .unwrap_or_default())
    }
}

/// Process-local cache, lost on exit.
#[derive(Debug, Default)]
pub struct InMemoryTokenCache {
    items: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryTokenCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenCache for InMemoryTokenCache {
    fn set(&self, key: &str, data: &[u8]) -> Result<()> {
        self.items
            .lock()
            .map_err(|_| Error::CacheError("token cache lock poisoned".to_string()))?
            .insert(key.to_string(), data.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>> {
        Ok(self
            .items
            .lock()
            .map_err(|_| Error::CacheError("token cache lock poisoned".to_string()))?
            .get(key)
            .cloned()
            .unwrap_or_default())
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(data))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded)
            .map_err(serde::de::Error::custom)
    }
}
