// src/config.rs

//! Server directory layout
//!
//! There is no configuration file: the CLI builds a `Config` from its flags.
//! Package archives live in `<server_dir>/packages` and cache files in
//! `<server_dir>/cache` unless overridden.

use crate::cache::{DEFAULT_CACHE_TTL, FileCache};
use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub server_dir: PathBuf,
    pub package_dir: PathBuf,
    /// `None` disables caching; every request re-parses the archive
    pub cache_dir: Option<PathBuf>,
    /// Seconds cached metadata stays valid
    pub cache_ttl: u64,
}

impl Config {
    pub fn new(server_dir: impl Into<PathBuf>) -> Self {
        let server_dir = server_dir.into();
        Self {
            package_dir: server_dir.join("packages"),
            cache_dir: Some(server_dir.join("cache")),
            cache_ttl: DEFAULT_CACHE_TTL,
            server_dir,
        }
    }

    pub fn with_package_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.package_dir = dir.into();
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    pub fn with_cache_ttl(mut self, ttl_secs: u64) -> Self {
        self.cache_ttl = ttl_secs;
        self
    }

    pub fn without_cache(mut self) -> Self {
        self.cache_dir = None;
        self
    }

    /// Open the configured cache, creating its directory if needed
    pub fn open_cache(&self) -> Result<Option<FileCache>> {
        match &self.cache_dir {
            Some(dir) => {
                debug!("Using metadata cache at {}", dir.display());
                FileCache::new(dir).map(Some)
            }
            None => Ok(None),
        }
    }

    pub fn package_path(&self, file_name: &str) -> PathBuf {
        self.package_dir.join(file_name)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Path::new("."))
    }
}
