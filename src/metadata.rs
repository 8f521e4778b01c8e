// src/metadata.rs

//! Public package metadata
//!
//! Maps a parsed package onto the record the update checker consumes. The
//! record is what gets cached; it never changes once built.

use crate::packages::headers::split_list;
use crate::packages::parser::{PackageInfo, PackageType, strip_tags};
use crate::packages::readme::Sections;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::SystemTime;
use tracing::debug;

/// Format of `last_updated`
const LAST_UPDATED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const PLUGIN_URI: &str = "PluginURI";
const THEME_URI: &str = "ThemeURI";

/// Metadata for one plugin or theme release
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_homepage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provides: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tested: Option<String>,
    #[serde(default, skip_serializing_if = "Sections::is_empty")]
    pub sections: Sections,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upgrade_notice: Option<String>,
    pub last_updated: String,
    pub slug: String,
}

/// Build the metadata record for a parsed package
pub fn build_metadata(info: &PackageInfo, modified: SystemTime) -> Metadata {
    let text = |key: &str| info.header(key).map(str::to_string);
    let list = |key: &str| {
        info.header(key)
            .map(split_list)
            .filter(|items| !items.is_empty())
    };

    let homepage = match info.package_type {
        PackageType::Plugin => text(PLUGIN_URI),
        PackageType::Theme => text(THEME_URI),
    };

    let mut meta = Metadata {
        name: text("Name").unwrap_or_default(),
        version: text("Version"),
        homepage,
        author: text("Author"),
        author_homepage: text("AuthorURI"),
        details_url: text("DetailsURI"),
        depends: list("Depends"),
        provides: list("Provides"),
        ..Default::default()
    };

    // Themes link "View version details" to the theme homepage by default
    if info.package_type == PackageType::Theme && meta.details_url.is_none() {
        meta.details_url = meta.homepage.clone();
    }

    if let Some(readme) = &info.readme {
        meta.requires = Some(readme.requires.clone()).filter(|v| !v.is_empty());
        meta.tested = Some(readme.tested.clone()).filter(|v| !v.is_empty());

        for (title, content) in readme.sections.iter() {
            meta.sections.insert(section_key(title), content);
        }

        if let (Some(notices), Some(version)) =
            (meta.sections.get("upgrade_notice"), meta.version.as_deref())
        {
            meta.upgrade_notice = find_upgrade_notice(notices, version);
        }
    }

    meta.last_updated = format_timestamp(modified);
    meta.slug = derive_slug(&info.main_file, &info.source);

    debug!(
        "Built metadata for {} ({})",
        meta.slug,
        meta.version.as_deref().unwrap_or("no version")
    );

    meta
}

/// "Frequently Asked Questions" -> "frequently_asked_questions"
fn section_key(title: &str) -> String {
    title.to_lowercase().replace(' ', "_")
}

/// Find the upgrade notice written for `version`
///
/// Rendered readmes use `<h4>1.2.3</h4><p>notice</p>`. Raw readme text uses a
/// `= 1.2.3 =` sub-heading followed by a paragraph; that form is only tried
/// when the HTML form is absent.
pub fn find_upgrade_notice(notices: &str, version: &str) -> Option<String> {
    let version = regex::escape(version);

    let html = Regex::new(&format!(
        r"(?i)<h4>\s*{}\s*</h4>[^<>]*?<p>(.+?)</p>",
        version
    ))
    .ok()?;
    if let Some(caps) = html.captures(notices) {
        let notice = strip_tags(&caps[1]).trim().to_string();
        return Some(notice).filter(|n| !n.is_empty());
    }

    let heading = Regex::new(&format!(r"(?m)^\s*=\s*{}\s*=\s*$", version)).ok()?;
    let found = heading.find(notices)?;

    let paragraph: Vec<&str> = notices[found.end()..]
        .lines()
        .map(str::trim)
        .skip_while(|line| line.is_empty())
        .take_while(|line| !line.is_empty() && !line.starts_with('='))
        .collect();

    let notice = strip_tags(&paragraph.join(" ")).trim().to_string();
    Some(notice).filter(|n| !n.is_empty())
}

/// Lower-cased name of the directory holding the main file
///
/// Falls back to the archive's file stem when the main file sits at the
/// archive root.
fn derive_slug(main_file: &str, source: &Path) -> String {
    let main_file = main_file.to_lowercase();
    if let Some((dir, _)) = main_file.rsplit_once('/') {
        let parent = dir.rsplit('/').next().unwrap_or(dir);
        if !parent.is_empty() {
            return parent.to_string();
        }
    }

    source
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

fn format_timestamp(time: SystemTime) -> String {
    DateTime::<Utc>::from(time)
        .format(LAST_UPDATED_FORMAT)
        .to_string()
}
