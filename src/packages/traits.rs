// src/packages/traits.rs

//! Common traits for package archive readers

use crate::error::Result;

/// An entry listed in a package archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Entry name exactly as stored in the archive
    pub name: String,
    /// Uncompressed size in bytes
    pub size: u64,
    pub is_dir: bool,
    /// Position of the entry inside the archive
    pub index: usize,
}

/// Read access to the contents of a package archive
///
/// Implementations own whatever handle backs the archive; dropping the
/// reader releases it.
pub trait ArchiveReader {
    /// List entries in archive order
    fn entries(&self) -> &[ArchiveEntry];

    /// Read the raw bytes of one entry
    ///
    /// When `limit` is set, at most that many leading bytes are returned.
    fn read_entry(&mut self, entry: &ArchiveEntry, limit: Option<u64>) -> Result<Vec<u8>>;
}
