//! Cache manager for persisting lookups to disk
//!
//! Provides a `CacheManager` that stores serializable records as JSON files,
//! each stamped with the time it was written. Freshness is decided by the
//! reader, so the same store backs both the permanent code map and the
//! time-bounded route entries.

use chrono::{DateTime, Duration, Utc};
use directories::ProjectDirs;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when reading or writing the cache
#[derive(Debug, Error)]
pub enum CacheError {
    /// Filesystem access failed
    #[error("Cache I/O error: {0}")]
    Io(#[from] io::Error),

    /// A cache file exists but does not hold a valid record
    #[error("Corrupt cache file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A record could not be serialized for writing
    #[error("Failed to serialize cache record: {0}")]
    Serialize(#[source] serde_json::Error),

    /// A key cannot be used as a cache file name
    #[error("Invalid cache key {0:?}: codes must be ASCII letters or digits")]
    InvalidKey(String),
}

/// A persisted cache record
///
/// `created_at` is stamped when the record is written and never changed
/// afterwards; a newer write for the same key replaces the whole record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// When the record was written
    pub created_at: DateTime<Utc>,
    /// The key the record was written under
    pub key: String,
    /// The cached payload
    pub data: T,
}

impl<T> CacheEntry<T> {
    /// Creates a record for `key` stamped with `now`
    pub fn new(key: impl Into<String>, data: T, now: DateTime<Utc>) -> Self {
        Self {
            created_at: now,
            key: key.into(),
            data,
        }
    }

    /// Age of the record as seen at `now`
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.created_at
    }

    /// Whether the record is still inside `window` at `now`
    ///
    /// A record whose age equals the window is already stale.
    pub fn is_fresh(&self, window: Duration, now: DateTime<Utc>) -> bool {
        self.age(now) < window
    }
}

/// Manages reading and writing cached records to disk
///
/// The cache manager stores records as JSON files in a directory, one file per
/// key. There is no locking: a single sequential process is assumed.
#[derive(Debug, Clone)]
pub struct CacheManager {
    /// Directory where cache files are stored
    cache_dir: PathBuf,
}

impl CacheManager {
    /// Creates a new CacheManager with a custom cache directory
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Returns the path to a cache file for the given key
    pub fn cache_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", key))
    }

    /// Ensures the cache directory exists
    fn ensure_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.cache_dir)
    }

    /// Loads and decodes the raw JSON document stored under `key`
    ///
    /// # Returns
    /// * `Ok(None)` if no file exists for the key
    /// * `Ok(Some(T))` if the file exists and decodes
    /// * `Err(CacheError::Corrupt)` if the file exists but does not decode
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let path = self.cache_path(key);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::Io(e)),
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| CacheError::Corrupt { path, source })
    }

    /// Encodes `value` and stores it under `key`, replacing any existing file
    pub fn store<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        self.ensure_dir()?;

        let json = serde_json::to_string_pretty(value).map_err(CacheError::Serialize)?;
        fs::write(self.cache_path(key), json)?;
        Ok(())
    }

    /// Writes a record for `key`, stamping it with the current time (for testing)
    #[cfg(test)]
    pub fn write<T: Serialize>(&self, key: &str, data: &T) -> Result<(), CacheError> {
        self.write_at(key, data, Utc::now())
    }

    /// Writes a record for `key`, stamping it with `now`
    pub fn write_at<T: Serialize>(
        &self,
        key: &str,
        data: &T,
        now: DateTime<Utc>,
    ) -> Result<(), CacheError> {
        let entry = CacheEntry::new(key, data, now);
        self.store(key, &entry)
    }

    /// Reads the record stored under `key`, regardless of its age
    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<CacheEntry<T>>, CacheError> {
        self.load(key)
    }
}

/// Default cache directory for this application, if one can be determined
pub fn default_cache_dir() -> Option<PathBuf> {
    let project_dirs = ProjectDirs::from("", "", "farewatch")?;
    Some(project_dirs.cache_dir().to_path_buf())
}
