// src/packages/readme.rs

//! WordPress readme.txt parser
//!
//! A readme starts with a `=== Plugin Name ===` title, followed by
//! `Key: value` meta lines, a blank line, a one-line short description and
//! any number of `== Section ==` blocks.

use regex::Regex;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;
use tracing::debug;

static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"===\s*(.+?)\s*===").expect("valid readme title regex"));

static SECTION_HEADER: LazyLock<Regex> =
    LazyLock::new(|| {
        Regex::new(r"^\s*==\s+(.+?)\s+==\s*$").expect("valid section regex")
    });

/// Named text sections, kept in document order
///
/// Inserting an existing title replaces its content but keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sections(Vec<(String, String)>);

impl Sections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, title: impl Into<String>, content: impl Into<String>) {
        let title = title.into();
        let content = content.into();
        match self.0.iter_mut().find(|(t, _)| *t == title) {
            Some((_, existing)) => *existing = content,
            None => self.0.push((title, content)),
        }
    }

    pub fn get(&self, title: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(t, _)| t == title)
            .map(|(_, content)| content.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(t, c)| (t.as_str(), c.as_str()))
    }

    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(t, _)| t.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Sections {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (title, content) in &self.0 {
            map.serialize_entry(title, content)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Sections {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SectionsVisitor;

        impl<'de> Visitor<'de> for SectionsVisitor {
            type Value = Sections;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of section titles to section text")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Sections, A::Error> {
                let mut sections = Sections::new();
                while let Some((title, content)) = access.next_entry::<String, String>()? {
                    sections.insert(title, content);
                }
                Ok(sections)
            }
        }

        deserializer.deserialize_map(SectionsVisitor)
    }
}

/// Parsed readme.txt
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReadmeDocument {
    pub name: String,
    pub contributors: Vec<String>,
    pub donate_link: String,
    pub tags: Vec<String>,
    pub requires: String,
    pub tested: String,
    pub stable_tag: String,
    pub short_description: String,
    pub sections: Sections,
}

/// Parse readme.txt content
///
/// Returns `None` when the first line is not a `=== Title ===` marker.
pub fn parse_readme(text: &str) -> Option<ReadmeDocument> {
    let text = text.replace("\r\n", "\n");
    let text = text.trim_matches(|c| matches!(c, ' ' | '\t' | '\n' | '\r'));
    let mut lines = text.split('\n');

    let name = match TITLE.captures(lines.next()?) {
        Some(caps) => caps[1].to_string(),
        None => {
            debug!("readme.txt has no === title === line, ignoring it");
            return None;
        }
    };

    let mut readme = ReadmeDocument {
        name,
        ..Default::default()
    };

    // Meta block runs until the first blank line
    for line in lines.by_ref() {
        let (key, value) = match line.split_once(':') {
            Some((key, value)) => (key.trim(), value.trim()),
            None => (line.trim(), ""),
        };
        if key.is_empty() {
            break;
        }

        match key {
            "Contributors" => readme.contributors = split_comma_list(value),
            "Donate link" => readme.donate_link = value.to_string(),
            "Tags" => readme.tags = split_comma_list(value),
            "Requires at least" => readme.requires = value.to_string(),
            "Tested up to" => readme.tested = value.to_string(),
            "Stable tag" => readme.stable_tag = value.to_string(),
            _ => {} // Ignore unknown keys
        }
    }

    readme.short_description = lines.next().unwrap_or_default().to_string();

    let mut current: Option<String> = None;
    let mut buffer: Vec<&str> = Vec::new();
    for line in lines {
        if let Some(caps) = SECTION_HEADER.captures(line) {
            if let Some(title) = current.take() {
                readme.sections.insert(title, buffer.join("\n").trim());
            }
            current = Some(caps[1].to_string());
            buffer.clear();
        } else {
            buffer.push(line);
        }
    }
    if let Some(title) = current {
        readme.sections.insert(title, buffer.join("\n").trim());
    }

    debug!(
        "Parsed readme for {} ({} sections)",
        readme.name,
        readme.sections.len()
    );

    Some(readme)
}

fn split_comma_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}
