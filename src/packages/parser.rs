// src/packages/parser.rs

//! Plugin/theme package detection
//!
//! Scans a package archive for the file carrying the plugin or theme header
//! and for an optional readme.txt. Packages are expected to follow the
//! `slug/files...` layout, so nothing nested deeper than one directory is
//! considered.

use crate::error::{Error, Result};
use crate::packages::archive::ZipPackage;
use crate::packages::headers::{self, HEADER_SCAN_LIMIT, Headers};
use crate::packages::readme::{self, ReadmeDocument};
use crate::packages::traits::{ArchiveEntry, ArchiveReader};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Entries deeper than this many directories are skipped
const MAX_ENTRY_DEPTH: usize = 1;

/// Kind of WordPress package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageType {
    Plugin,
    Theme,
}

/// Result of scanning a package archive
#[derive(Debug, Clone, Serialize)]
pub struct PackageInfo {
    pub package_type: PackageType,
    /// Header fields from the main file
    pub header: Headers,
    pub readme: Option<ReadmeDocument>,
    /// Path of the plugin file or stylesheet, relative to the archive root
    pub main_file: String,
    /// Archive the package was read from
    pub source: PathBuf,
}

impl PackageInfo {
    /// Non-empty header value
    pub fn header(&self, key: &str) -> Option<&str> {
        self.header
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Theme tags from the stylesheet header
    pub fn tags(&self) -> Vec<String> {
        self.header("Tags")
            .map(|tags| headers::split_list(&strip_tags(tags)))
            .unwrap_or_default()
    }

    /// Whether a plugin declares itself network-only
    pub fn is_network(&self) -> bool {
        self.header("Network")
            .is_some_and(|value| value.eq_ignore_ascii_case("true"))
    }
}

/// Parse the package archive at `path`
pub fn parse_package(path: impl AsRef<Path>) -> Result<PackageInfo> {
    let path = path.as_ref();
    debug!("Parsing package: {}", path.display());

    let mut archive = ZipPackage::open(path)?;
    parse_archive(&mut archive, path)
}

/// Parse an already opened package archive
pub fn parse_archive<A: ArchiveReader>(archive: &mut A, source: &Path) -> Result<PackageInfo> {
    let entries: Vec<ArchiveEntry> = archive.entries().to_vec();

    let mut found: Option<(PackageType, Headers, String)> = None;
    let mut readme: Option<ReadmeDocument> = None;

    for entry in &entries {
        let is_theme = matches!(found, Some((PackageType::Theme, _, _)));
        if readme.is_some() && is_theme {
            break;
        }

        let name = normalize_entry_name(&entry.name);
        if entry.is_dir || entry_depth(&name) > MAX_ENTRY_DEPTH {
            continue;
        }

        let base = base_name(&name).to_ascii_lowercase();

        if readme.is_none() && base == "readme.txt" {
            if let Some(content) = read_or_skip(archive, entry, None) {
                readme = readme::parse_readme(&String::from_utf8_lossy(&content));
            }
        }

        if is_theme {
            continue;
        }

        if base == "style.css" {
            let header = read_or_skip(archive, entry, Some(HEADER_SCAN_LIMIT as u64))
                .and_then(|content| headers::theme_headers(&content));
            if let Some(header) = header {
                debug!("Found theme stylesheet: {}", name);
                found = Some((PackageType::Theme, header, name));
                continue;
            }
        }

        if found.is_none() && has_php_extension(&name) {
            let header = read_or_skip(archive, entry, Some(HEADER_SCAN_LIMIT as u64))
                .and_then(|content| headers::plugin_headers(&content));
            if let Some(header) = header {
                debug!("Found plugin file: {}", name);
                found = Some((PackageType::Plugin, header, name));
            }
        }
    }

    let (package_type, header, main_file) =
        found.ok_or_else(|| Error::InvalidPackage(source.to_path_buf()))?;

    info!(
        "Parsed {:?} package {} (main file {}, readme: {})",
        package_type,
        source.display(),
        main_file,
        readme.is_some()
    );

    Ok(PackageInfo {
        package_type,
        header,
        readme,
        main_file,
        source: source.to_path_buf(),
    })
}

/// Read one entry, treating a failed read as if the entry were absent
///
/// A corrupt or unsupported entry must not hide a valid header elsewhere in
/// the archive.
fn read_or_skip<A: ArchiveReader>(
    archive: &mut A,
    entry: &ArchiveEntry,
    limit: Option<u64>,
) -> Option<Vec<u8>> {
    match archive.read_entry(entry, limit) {
        Ok(content) => Some(content),
        Err(e) => {
            warn!("Skipping unreadable archive entry {}: {}", entry.name, e);
            None
        }
    }
}

/// Convert backslashes to slashes and drop leading/trailing slashes
fn normalize_entry_name(name: &str) -> String {
    name.replace('\\', "/").trim_matches('/').to_string()
}

/// Number of directories above an entry
fn entry_depth(name: &str) -> usize {
    name.matches('/').count()
}

fn base_name(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

fn has_php_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("php"))
}

/// Remove anything that looks like an HTML tag
pub(crate) fn strip_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}
