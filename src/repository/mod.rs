// src/repository/mod.rs

//! Package repository
//!
//! This module provides functionality for:
//! - Loading package metadata through the fingerprinted cache
//! - Finding package archives by slug in the package directory

use crate::cache::{Cache, FileCache};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::metadata::{Metadata, build_metadata};
use crate::packages::parse_package;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// A plugin or theme archive together with its metadata
#[derive(Debug, Clone)]
pub struct Package {
    pub slug: String,
    filename: PathBuf,
    metadata: Metadata,
}

impl Package {
    /// Create a package from already known metadata
    pub fn new(slug: String, filename: PathBuf, metadata: Metadata) -> Self {
        Self {
            slug,
            filename,
            metadata,
        }
    }

    /// Load a package from a ZIP archive, using `cache` when given
    ///
    /// Without an explicit `slug` the slug detected from the archive is used.
    pub fn from_archive(
        path: impl AsRef<Path>,
        slug: Option<&str>,
        cache: Option<&dyn Cache>,
        ttl_secs: u64,
    ) -> Result<Self> {
        let path = path.as_ref();
        let metadata = load_metadata(path, cache, ttl_secs)?;
        let slug = slug.map_or_else(|| metadata.slug.clone(), str::to_string);

        Ok(Self::new(slug, path.to_path_buf(), metadata))
    }

    pub fn filename(&self) -> &Path {
        &self.filename
    }

    /// Metadata as served for this package's slug
    pub fn metadata(&self) -> Metadata {
        Metadata {
            slug: self.slug.clone(),
            ..self.metadata.clone()
        }
    }

    /// Size of the archive in bytes
    pub fn file_size(&self) -> Result<u64> {
        Ok(fs::metadata(&self.filename)?.len())
    }

    /// Last modification time of the archive
    pub fn last_modified(&self) -> Result<SystemTime> {
        Ok(fs::metadata(&self.filename)?.modified()?)
    }
}

/// Cache key for an archive with the given size and modification time
///
/// Replacing the archive changes its size or mtime, so stale metadata is
/// never found under the new key.
pub fn cache_key(path: &Path, size: u64, modified: SystemTime) -> String {
    let since_epoch = modified.duration_since(UNIX_EPOCH).unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    hasher.update(format!(
        "|{}|{}.{:09}",
        size,
        since_epoch.as_secs(),
        since_epoch.subsec_nanos()
    ));

    format!("metadata-{:x}", hasher.finalize())
}

/// Get metadata for the archive at `path`
///
/// Cached metadata is used when present and decodable; otherwise the
/// archive is parsed and the result stored for `ttl_secs`.
pub fn load_metadata(path: &Path, cache: Option<&dyn Cache>, ttl_secs: u64) -> Result<Metadata> {
    let stat = fs::metadata(path).map_err(|e| Error::unreadable(path, e))?;
    if !stat.is_file() {
        return Err(Error::unreadable(path, "not a regular file"));
    }
    let modified = stat.modified().map_err(|e| Error::unreadable(path, e))?;
    let key = cache_key(path, stat.len(), modified);

    if let Some(cache) = cache {
        if let Some(value) = cache.get(&key) {
            match serde_json::from_value::<Metadata>(value) {
                Ok(metadata) => {
                    debug!("Metadata cache hit for {}", path.display());
                    return Ok(metadata);
                }
                Err(e) => warn!("Discarding undecodable cached metadata {}: {}", key, e),
            }
        }
        debug!("Metadata cache miss for {}", path.display());
    }

    let info = parse_package(path)?;
    let metadata = build_metadata(&info, modified);

    if let Some(cache) = cache {
        let stored = serde_json::to_value(&metadata)
            .map_err(Error::from)
            .and_then(|value| cache.set(&key, &value, ttl_secs));
        if let Err(e) = stored {
            warn!("Failed to cache metadata for {}: {}", path.display(), e);
        }
    }

    Ok(metadata)
}

/// Package archives stored as `<package_dir>/<slug>.zip`
pub struct PackageRepository {
    config: Config,
    cache: Option<FileCache>,
}

impl PackageRepository {
    /// Open the repository described by `config`
    pub fn new(config: Config) -> Result<Self> {
        let cache = config.open_cache()?;
        Ok(Self { config, cache })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> Option<&FileCache> {
        self.cache.as_ref()
    }

    /// Find a plugin or theme by slug
    ///
    /// Returns `Ok(None)` when no readable archive exists for the slug, and
    /// `Err(Error::InvalidPackage)` when the archive is not a plugin or theme.
    pub fn find_package(&self, slug: &str) -> Result<Option<Package>> {
        let safe_slug = sanitize_slug(slug);
        if safe_slug.is_empty() {
            return Ok(None);
        }

        let path = self.config.package_path(&format!("{}.zip", safe_slug));
        if !path.is_file() {
            debug!("No package archive at {}", path.display());
            return Ok(None);
        }

        let cache = self.cache.as_ref().map(|c| c as &dyn Cache);
        match Package::from_archive(&path, Some(slug), cache, self.config.cache_ttl) {
            Ok(package) => {
                info!("Loaded package {} from {}", slug, path.display());
                Ok(Some(package))
            }
            Err(e @ Error::ArchiveUnreadable { .. }) => {
                debug!("Treating unreadable archive as missing: {}", e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Like `find_package`, but a missing package is an error
    pub fn require_package(&self, slug: &str) -> Result<Package> {
        self.find_package(slug)?
            .ok_or_else(|| Error::PackageNotFound(slug.to_string()))
    }
}

/// Keep only characters allowed in package file names
pub fn sanitize_slug(slug: &str) -> String {
    slug.chars()
        .filter(|c| {
            c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ',' | '+' | '!')
        })
        .collect()
}
