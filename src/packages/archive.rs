// src/packages/archive.rs

//! ZIP-backed package archive reader

use crate::error::{Error, Result};
use crate::packages::traits::{ArchiveEntry, ArchiveReader};
use std::fs::File;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::ZipArchive;

/// A plugin or theme package stored as a ZIP archive
pub struct ZipPackage<R: Read + Seek = File> {
    path: PathBuf,
    archive: ZipArchive<R>,
    entries: Vec<ArchiveEntry>,
}

impl ZipPackage<File> {
    /// Open a ZIP archive on disk
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Opening package archive: {}", path.display());

        let file = File::open(path).map_err(|e| Error::unreadable(path, e))?;
        Self::from_reader(path, file)
    }
}

impl<R: Read + Seek> ZipPackage<R> {
    /// Wrap any seekable reader holding ZIP data
    ///
    /// `path` is only used for error messages.
    pub fn from_reader(path: impl Into<PathBuf>, reader: R) -> Result<Self> {
        let path = path.into();
        let mut archive = ZipArchive::new(reader).map_err(|e| Error::unreadable(&path, e))?;

        let mut entries = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let file = archive
                .by_index(index)
                .map_err(|e| {
                    Error::unreadable(&path, format!("entry {}: {}", index, e))
                })?;

            entries.push(ArchiveEntry {
                name: file.name().to_string(),
                size: file.size(),
                is_dir: file.is_dir(),
                index,
            });
        }

        debug!("Archive {} has {} entries", path.display(), entries.len());

        Ok(Self {
            path,
            archive,
            entries,
        })
    }

    /// Path the archive was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<R: Read + Seek> ArchiveReader for ZipPackage<R> {
    fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    fn read_entry(&mut self, entry: &ArchiveEntry, limit: Option<u64>) -> Result<Vec<u8>> {
        let mut file = self.archive.by_index(entry.index).map_err(|e| {
            Error::unreadable(&self.path, format!("entry {}: {}", entry.name, e))
        })?;

        let mut content = Vec::new();
        let read = match limit {
            Some(limit) => (&mut file).take(limit).read_to_end(&mut content),
            None => file.read_to_end(&mut content),
        };
        read.map_err(|e| {
            Error::unreadable(&self.path, format!("entry {}: {}", entry.name, e))
        })?;

        Ok(content)
    }
}
