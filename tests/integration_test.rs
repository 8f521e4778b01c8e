// tests/integration_test.rs

//! Integration tests for wpup
//!
//! These tests build real ZIP archives and run them through the whole
//! parse → map → cache pipeline.

use std::fs::{self, File};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, UNIX_EPOCH};
use tempfile::tempdir;
use wpup::cache::{Cache, FileCache};
use wpup::metadata::build_metadata;
use wpup::packages::{PackageType, parse_package};
use wpup::repository::{cache_key, load_metadata};
use wpup::{Config, Error, PackageRepository};
use zip::write::SimpleFileOptions;

const HELLO_PHP: &str = "<?php\n\
/*\n\
Plugin Name: Hello World\n\
Version: 1.2.3\n\
Author: Jane Doe\n\
*/\n";

const HELLO_README: &str = "=== Hello World ===\n\
Stable tag: 1.2.3\n\
\n\
Says hello.\n\
\n\
== Changelog ==\n\
1.2.3 - initial release\n";

fn write_zip(path: &Path, files: &[(&str, &str)]) {
    let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
    for (name, content) in files {
        if name.ends_with('/') {
            writer.add_directory(*name, SimpleFileOptions::default()).unwrap();
        } else {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
    }
    writer.finish().unwrap();
}

fn set_mtime(path: &Path, secs: u64) {
    let file = File::options().write(true).open(path).unwrap();
    file.set_modified(UNIX_EPOCH + Duration::from_secs(secs)).unwrap();
}

fn hello_zip(dir: &Path) -> PathBuf {
    let path = dir.join("hello.zip");
    write_zip(
        &path,
        &[
            ("hello/", ""),
            ("hello/hello.php", HELLO_PHP),
            ("hello/readme.txt", HELLO_README),
        ],
    );
    set_mtime(&path, 1_700_000_000);
    path
}

#[test]
fn test_hello_world_metadata() {
    let dir = tempdir().unwrap();
    let path = hello_zip(dir.path());

    let meta = load_metadata(&path, None, 60).unwrap();
    assert_eq!(meta.name, "Hello World");
    assert_eq!(meta.version.as_deref(), Some("1.2.3"));
    assert_eq!(meta.author.as_deref(), Some("Jane Doe"));
    assert_eq!(meta.slug, "hello");
    assert_eq!(meta.last_updated, "2023-11-14 22:13:20");
    assert_eq!(meta.sections.len(), 1);
    assert_eq!(meta.sections.get("changelog"), Some("1.2.3 - initial release"));
    assert_eq!(meta.upgrade_notice, None);

    let info = parse_package(&path).unwrap();
    assert_eq!(info.package_type, PackageType::Plugin);
    assert_eq!(info.main_file, "hello/hello.php");
    let readme = info.readme.unwrap();
    assert_eq!(readme.stable_tag, "1.2.3");
    assert_eq!(readme.short_description, "Says hello.");
}

#[test]
fn test_metadata_is_deterministic() {
    let dir = tempdir().unwrap();
    let path = hello_zip(dir.path());
    let modified = fs::metadata(&path).unwrap().modified().unwrap();

    let first = build_metadata(&parse_package(&path).unwrap(), modified);
    let second = build_metadata(&parse_package(&path).unwrap(), modified);

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_vec(&first).unwrap(),
        serde_json::to_vec(&second).unwrap()
    );
}

#[test]
fn test_upgrade_notice_from_archive() {
    let dir = tempdir().unwrap();
    let readme = "=== Hello World ===\n\nShort.\n\n== Upgrade Notice ==\n\
                  <h4>1.2.3</h4><p>Fixes a crash.</p>";

    let path = dir.path().join("hello.zip");
    write_zip(&path, &[("hello/hello.php", HELLO_PHP), ("hello/readme.txt", readme)]);
    let meta = load_metadata(&path, None, 60).unwrap();
    assert_eq!(meta.upgrade_notice.as_deref(), Some("Fixes a crash."));

    let readme = readme.replace("1.2.3", "1.2.4");
    write_zip(&path, &[("hello/hello.php", HELLO_PHP), ("hello/readme.txt", &readme)]);
    let meta = load_metadata(&path, None, 60).unwrap();
    assert_eq!(meta.upgrade_notice, None);
    let json = serde_json::to_value(&meta).unwrap();
    assert!(json.get("upgrade_notice").is_none());
}

#[test]
fn test_theme_wins_over_plugin_in_archive() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("shiny.zip");
    write_zip(
        &path,
        &[
            ("shiny/functions.php", HELLO_PHP),
            (
                "shiny/style.css",
                "/*\nTheme Name: Shiny\nTheme URI: https://example.com/shiny\nVersion: 2.0\n*/",
            ),
        ],
    );

    let info = parse_package(&path).unwrap();
    assert_eq!(info.package_type, PackageType::Theme);

    let meta = load_metadata(&path, None, 60).unwrap();
    assert_eq!(meta.name, "Shiny");
    assert_eq!(meta.slug, "shiny");
    assert_eq!(meta.details_url.as_deref(), Some("https://example.com/shiny"));
}

#[test]
fn test_deep_header_source_is_ignored() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("deep.zip");
    write_zip(&path, &[("slug/subdir/more/file.php", HELLO_PHP)]);

    assert!(matches!(parse_package(&path), Err(Error::InvalidPackage(_))));
}

#[test]
fn test_not_a_zip_is_unreadable() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("fake.zip");
    fs::write(&path, b"this is not an archive").unwrap();

    let err = load_metadata(&path, None, 60).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_corrupt_readme_entry_does_not_hide_plugin() {
    let dir = tempdir().unwrap();
    let stored =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer.start_file("hello/hello.php", stored).unwrap();
    writer.write_all(HELLO_PHP.as_bytes()).unwrap();
    writer.start_file("hello/readme.txt", stored).unwrap();
    writer.write_all(HELLO_README.as_bytes()).unwrap();
    let mut bytes = writer.finish().unwrap().into_inner();

    // Damage the stored readme payload so its CRC no longer matches
    let needle = b"Says hello.";
    let offset = bytes
        .windows(needle.len())
        .position(|window| window == needle)
        .unwrap();
    bytes[offset] = b'X';

    let path = dir.path().join("hello.zip");
    fs::write(&path, &bytes).unwrap();

    let info = parse_package(&path).unwrap();
    assert_eq!(info.package_type, PackageType::Plugin);
    assert!(info.readme.is_none());

    let meta = load_metadata(&path, None, 60).unwrap();
    assert_eq!(meta.name, "Hello World");
    assert_eq!(meta.slug, "hello");
    assert!(meta.sections.is_empty());
}

#[test]
fn test_cached_metadata_is_reused() {
    let dir = tempdir().unwrap();
    let path = hello_zip(dir.path());
    let cache = FileCache::new(dir.path().join("cache")).unwrap();

    let first = load_metadata(&path, Some(&cache), 3600).unwrap();

    let stat = fs::metadata(&path).unwrap();
    let key = cache_key(&path, stat.len(), stat.modified().unwrap());
    let cached = cache.get(&key).expect("metadata should be cached");
    assert_eq!(cached["name"], "Hello World");

    // Tamper with the cached record to prove the archive is not re-read
    let mut tampered = cached.clone();
    tampered["name"] = serde_json::json!("From Cache");
    cache.set(&key, &tampered, 3600).unwrap();

    let second = load_metadata(&path, Some(&cache), 3600).unwrap();
    assert_eq!(second.name, "From Cache");
    assert_eq!(second.slug, first.slug);
}

#[test]
fn test_corrupt_cache_entry_is_recomputed() {
    let dir = tempdir().unwrap();
    let path = hello_zip(dir.path());
    let cache = FileCache::new(dir.path().join("cache")).unwrap();

    let stat = fs::metadata(&path).unwrap();
    let key = cache_key(&path, stat.len(), stat.modified().unwrap());
    cache.set(&key, &serde_json::json!({"unexpected": true}), 3600).unwrap();

    let meta = load_metadata(&path, Some(&cache), 3600).unwrap();
    assert_eq!(meta.name, "Hello World");
    assert_eq!(cache.get(&key).unwrap()["name"], "Hello World");
}

#[test]
fn test_replaced_archive_gets_fresh_metadata() {
    let dir = tempdir().unwrap();
    let path = hello_zip(dir.path());
    let cache = FileCache::new(dir.path().join("cache")).unwrap();

    let old = load_metadata(&path, Some(&cache), 3600).unwrap();
    assert_eq!(old.version.as_deref(), Some("1.2.3"));

    let updated = HELLO_PHP.replace("1.2.3", "1.3.0");
    write_zip(
        &path,
        &[("hello/hello.php", &updated), ("hello/readme.txt", HELLO_README)],
    );
    set_mtime(&path, 1_700_000_100);

    let new = load_metadata(&path, Some(&cache), 3600).unwrap();
    assert_eq!(new.version.as_deref(), Some("1.3.0"));
    assert_eq!(new.last_updated, "2023-11-14 22:15:00");
}

#[test]
fn test_repository_find_package() {
    let dir = tempdir().unwrap();
    let config = Config::new(dir.path());
    fs::create_dir_all(&config.package_dir).unwrap();

    hello_zip(&config.package_dir);
    fs::write(config.package_path("broken.zip"), b"garbage").unwrap();
    write_zip(
        &config.package_path("notes.zip"),
        &[("notes/readme.txt", HELLO_README)],
    );

    let repository = PackageRepository::new(config).unwrap();

    let package = repository.find_package("hello").unwrap().unwrap();
    assert_eq!(package.slug, "hello");
    assert_eq!(package.metadata().name, "Hello World");
    assert_eq!(package.filename(), repository.config().package_path("hello.zip"));
    assert!(package.file_size().unwrap() > 0);
    assert!(repository.cache().is_some());

    assert!(repository.find_package("missing").unwrap().is_none());
    assert!(repository.find_package("broken").unwrap().is_none());
    assert!(repository.find_package("../hello").unwrap().is_none());
    assert!(matches!(
        repository.find_package("notes"),
        Err(Error::InvalidPackage(_))
    ));
    assert!(matches!(
        repository.require_package("missing"),
        Err(Error::PackageNotFound(_))
    ));
}

#[test]
fn test_repository_without_cache() {
    let dir = tempdir().unwrap();
    let config = Config::new(dir.path()).without_cache();
    fs::create_dir_all(&config.package_dir).unwrap();
    hello_zip(&config.package_dir);

    let repository = PackageRepository::new(config).unwrap();
    let package = repository.find_package("hello").unwrap().unwrap();

    assert_eq!(package.metadata().version.as_deref(), Some("1.2.3"));
    assert!(!dir.path().join("cache").exists());
}
