// src/lib.rs

//! wpup: update metadata for self-hosted WordPress plugins and themes
//!
//! Reads plugin/theme ZIP archives, extracts the header block and readme.txt,
//! and produces the JSON metadata record the WordPress update checker expects.
//!
//! # Architecture
//!
//! - Packages: archive access, header and readme parsing, package detection
//! - Metadata: mapping of parsed package data onto the public record
//! - Cache: file-backed, expiring store keyed by archive fingerprint
//! - Repository: slug lookup in the package directory, cached loading

pub mod cache;
pub mod config;
mod error;
pub mod metadata;
pub mod packages;
pub mod repository;

pub use config::Config;
pub use error::{Error, Result};
pub use metadata::Metadata;
pub use repository::{Package, PackageRepository};
