// src/packages/mod.rs

//! WordPress package support for wpup
//!
//! This module reads plugin and theme ZIP archives: header blocks from the
//! main plugin file or `style.css`, and the optional readme.txt. Archive
//! access goes through the `ArchiveReader` trait.

pub mod archive;
pub mod headers;
pub mod parser;
pub mod readme;
pub mod traits;

pub use archive::ZipPackage;
pub use parser::{PackageInfo, PackageType, parse_archive, parse_package};
pub use readme::{ReadmeDocument, Sections, parse_readme};
pub use traits::{ArchiveEntry, ArchiveReader};
