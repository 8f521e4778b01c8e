// src/packages/headers.rs

//! Plugin and theme file header parser
//!
//! WordPress stores package metadata as `Tag: value` lines inside the leading
//! comment block of the main plugin file or the theme's `style.css`:
//!
//! ```text
//! <?php
//! /*
//!  * Plugin Name: Hello World
//!  * Version: 1.2.3
//!  */
//! ```

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Only this many leading bytes of a file are searched for headers
pub const HEADER_SCAN_LIMIT: usize = 8 * 1024;

/// Parsed header block, keyed by internal field name
pub type Headers = BTreeMap<String, String>;

/// Internal field name paired with the tag searched for in the file
pub type HeaderField = (&'static str, &'static str);

/// Tags recognized in a plugin's main PHP file
pub const PLUGIN_HEADERS: &[HeaderField] = &[
    ("Name", "Plugin Name"),
    ("PluginURI", "Plugin URI"),
    ("Version", "Version"),
    ("Description", "Description"),
    ("Author", "Author"),
    ("AuthorURI", "Author URI"),
    ("TextDomain", "Text Domain"),
    ("DomainPath", "Domain Path"),
    ("Network", "Network"),
    ("Depends", "Depends"),
    ("Provides", "Provides"),
    // Deprecated spelling of Network
    (SITE_WIDE_ONLY, "Site Wide Only"),
];

/// Tags recognized in a theme's style.css
pub const THEME_HEADERS: &[HeaderField] = &[
    ("Name", "Theme Name"),
    ("ThemeURI", "Theme URI"),
    ("Description", "Description"),
    ("Author", "Author"),
    ("AuthorURI", "Author URI"),
    ("Version", "Version"),
    ("Template", "Template"),
    ("Status", "Status"),
    ("Tags", "Tags"),
    ("TextDomain", "Text Domain"),
    ("DomainPath", "Domain Path"),
    ("DetailsURI", "Details URI"),
];

const SITE_WIDE_ONLY: &str = "SiteWideOnly";

/// Comment terminators and closing PHP tags, plus everything after them
static TRAILING_MARKERS: LazyLock<Regex> =
    LazyLock::new(|| {
        Regex::new(r"\s*(?:\*/|\?>).*").expect("valid trailing marker regex")
    });

/// Extract a header block from the leading bytes of a source file
///
/// Every field in `fields` appears in the result. Tags that are not present,
/// or that have no value, map to an empty string.
pub fn extract_headers(content: &[u8], fields: &[HeaderField]) -> Headers {
    let prefix = &content[..content.len().min(HEADER_SCAN_LIMIT)];
    // Old Mac files use a bare CR as line ending
    let text = String::from_utf8_lossy(prefix).replace('\r', "\n");

    fields
        .iter()
        .map(|(key, tag)| (key.to_string(), find_tag(&text, tag).unwrap_or_default()))
        .collect()
}

/// Find the first `<comment markers><tag>:<value>` line, case-insensitively
fn find_tag(text: &str, tag: &str) -> Option<String> {
    let pattern = format!(r"(?mi)^[ \t/*#@]*{}:(.*)$", regex::escape(tag));
    let re = Regex::new(&pattern).ok()?;

    let raw = re.captures(text)?.get(1)?.as_str();
    if raw.is_empty() {
        return None;
    }

    Some(TRAILING_MARKERS.replace(raw, "").trim().to_string())
}

/// Parse plugin headers, returning `None` when the file has no plugin name
pub fn plugin_headers(content: &[u8]) -> Option<Headers> {
    let mut headers = extract_headers(content, PLUGIN_HEADERS);

    let legacy_network = headers.remove(SITE_WIDE_ONLY).unwrap_or_default();
    if headers.get("Network").is_none_or(|v| v.is_empty()) && !legacy_network.is_empty() {
        headers.insert("Network".to_string(), legacy_network);
    }

    let name = headers.get("Name").cloned().unwrap_or_default();
    if name.is_empty() {
        return None;
    }
    headers.insert("Title".to_string(), name);

    Some(headers)
}

/// Parse theme headers, returning `None` when the stylesheet has no theme name
pub fn theme_headers(content: &[u8]) -> Option<Headers> {
    let headers = extract_headers(content, THEME_HEADERS);

    if headers.get("Name").is_none_or(|v| v.is_empty()) {
        return None;
    }

    Some(headers)
}

/// Split a comma-separated header value, dropping empty items
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}
