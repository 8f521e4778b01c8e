// src/cache/mod.rs

//! Metadata cache
//!
//! Values are stored as JSON with an absolute expiration time. Keys are
//! produced by the caller; for package metadata they are content
//! fingerprints, so replacing an archive never requires explicit
//! invalidation.

mod file;

pub use file::FileCache;

use crate::error::Result;

/// How long package metadata stays cached: one week
pub const DEFAULT_CACHE_TTL: u64 = 7 * 24 * 60 * 60;

/// A basic expiring key/value store
pub trait Cache {
    /// Get a cached value, or `None` when missing, expired or unreadable
    fn get(&self, key: &str) -> Option<serde_json::Value>;

    /// Store a value for `ttl_secs` seconds; zero expires immediately
    fn set(&self, key: &str, value: &serde_json::Value, ttl_secs: u64) -> Result<()>;

    /// Remove a cached value
    fn clear(&self, key: &str) -> Result<()>;
}
