//! On-disk store for API responses
//!
//! Provides a `CacheManager` that stores serializable data to JSON files with
//! expiry timestamps, so a later invocation can reuse or fall back to it.

use chrono::{DateTime, Duration, Utc};
use directories::ProjectDirs;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Envelope written to disk around the cached data
#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry<T> {
    data: T,
    cached_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

/// Result of reading from the store, including metadata about freshness
#[derive(Debug)]
pub struct CachedData<T> {
    /// The cached data
    pub data: T,
    /// When the data was originally cached
    pub cached_at: DateTime<Utc>,
    /// Whether the entry has passed its expiry time
    pub is_expired: bool,
}

/// Reads and writes cached data as JSON files
///
/// Files live in an XDG-compliant cache directory (`~/.cache/coinprice/` on
/// Linux). Expired entries are still returned (with `is_expired = true`) and it
/// is up to the caller to decide whether they are still useful.
#[derive(Debug, Clone)]
pub struct CacheManager {
    cache_dir: PathBuf,
}

impl CacheManager {
    /// Creates a CacheManager using the XDG cache directory
    ///
    /// Returns `None` if the cache directory cannot be determined (e.g. no home
    /// directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "coinprice")?;
        let cache_dir = project_dirs.cache_dir().to_path_buf();
        Some(Self { cache_dir })
    }

    /// Creates a CacheManager rooted at a custom directory
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    fn cache_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", key))
    }

    /// Writes data stamped with the current time
    pub fn write<T: Serialize>(&self, key: &str, data: &T, ttl: Duration) -> std::io::Result<()> {
        self.write_at(key, data, ttl, Utc::now())
    }

    /// Writes data as cached at `cached_at`, expiring `ttl` later
    ///
    /// The directory is created on demand. The file is replaced wholesale.
    pub fn write_at<T: Serialize>(
        &self,
        key: &str,
        data: &T,
        ttl: Duration,
        cached_at: DateTime<Utc>,
    ) -> std::io::Result<()> {
        fs::create_dir_all(&self.cache_dir)?;

        let entry = StoredEntry {
            data,
            cached_at,
            expires_at: cached_at + ttl,
        };

        let json = serde_json::to_string_pretty(&entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        fs::write(self.cache_path(key), json)
    }

    /// Reads data, judging expiry against the current time
    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Option<CachedData<T>> {
        self.read_at(key, Utc::now())
    }

    /// Reads data, judging expiry against `now`
    ///
    /// Returns `None` if the entry doesn't exist or cannot be parsed.
    pub fn read_at<T: DeserializeOwned>(&self, key: &str, now: DateTime<Utc>) -> Option<CachedData<T>> {
        let path = self.cache_path(key);
        let content = fs::read_to_string(&path).ok()?;
        let entry: StoredEntry<T> = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "ignoring unreadable cache file");
                return None;
            }
        };

        Some(CachedData {
            data: entry.data,
            cached_at: entry.cached_at,
            is_expired: now > entry.expires_at,
        })
    }
}
