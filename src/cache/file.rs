// src/cache/file.rs

//! File-backed cache: one `<key>.txt` file per entry

use super::Cache;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// On-disk representation of one cache entry
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    /// Unix seconds after which the entry is stale
    expiration_time: i64,
    value: serde_json::Value,
}

/// Cache storing each entry as a JSON file in one directory
#[derive(Debug, Clone)]
pub struct FileCache {
    directory: PathBuf,
}

impl FileCache {
    /// Use `directory` for cache files, creating it if needed
    pub fn new(directory: impl Into<PathBuf>) -> Result<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory).map_err(|e| {
            Error::CacheError(format!(
                "Failed to create cache directory {}: {}",
                directory.display(),
                e
            ))
        })?;

        Ok(Self { directory })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the file holding `key`
    ///
    /// Characters outside `[A-Za-z0-9._-]` are replaced so a key can never
    /// escape the cache directory.
    fn entry_path(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.directory.join(format!("{}.txt", name))
    }

    /// Read and decode an entry file
    ///
    /// A missing file and a file that does not decode (for example one
    /// caught mid-write) both read as `None`.
    fn read_entry(path: &Path) -> Option<CacheEntry> {
        let content = match fs::read(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Failed to read cache file {}: {}", path.display(), e);
                return None;
            }
        };

        match serde_json::from_slice(&content) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Ignoring corrupt cache file {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Delete every expired or undecodable entry, returning how many were removed
    pub fn purge_expired(&self) -> Result<usize> {
        let now = now();
        let mut removed = 0;

        for dir_entry in fs::read_dir(&self.directory)? {
            let path = dir_entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("txt") {
                continue;
            }

            let stale = match Self::read_entry(&path) {
                Some(entry) => entry.expiration_time <= now,
                None => true,
            };

            if stale && remove_if_exists(&path)? {
                debug!("Purged cache file {}", path.display());
                removed += 1;
            }
        }

        Ok(removed)
    }
}

impl Cache for FileCache {
    fn get(&self, key: &str) -> Option<serde_json::Value> {
        let path = self.entry_path(key);
        let entry = Self::read_entry(&path)?;

        if entry.expiration_time <= now() {
            debug!("Cache entry {} expired", key);
            // Another process may already have replaced or removed it
            if let Err(e) = self.clear(key) {
                warn!("Failed to remove expired cache entry {}: {}", key, e);
            }
            return None;
        }

        Some(entry.value)
    }

    fn set(&self, key: &str, value: &serde_json::Value, ttl_secs: u64) -> Result<()> {
        let ttl = i64::try_from(ttl_secs).unwrap_or(i64::MAX);
        let entry = CacheEntry {
            expiration_time: now().saturating_add(ttl),
            value: value.clone(),
        };
        let body = serde_json::to_vec(&entry)?;

        let path = self.entry_path(key);
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| {
                Error::CacheError(format!("Failed to open {}: {}", path.display(), e))
            })?;

        // Exclusive lock while truncating and writing; readers don't lock and
        // treat a half-written file as a miss
        file.lock()?;
        let written = write_locked(&mut file, &body);
        file.unlock()?;
        written.map_err(|e| {
            Error::CacheError(format!("Failed to write {}: {}", path.display(), e))
        })?;

        debug!("Cached {} ({} bytes, ttl {}s)", key, body.len(), ttl_secs);
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<()> {
        remove_if_exists(&self.entry_path(key))?;
        Ok(())
    }
}

fn write_locked(file: &mut File, body: &[u8]) -> io::Result<()> {
    file.set_len(0)?;
    file.write_all(body)?;
    file.sync_data()
}

fn remove_if_exists(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
