// src/main.rs

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::info;
use wpup::cache::{Cache, DEFAULT_CACHE_TTL};
use wpup::packages::headers::{self, PLUGIN_HEADERS, THEME_HEADERS};
use wpup::packages::parse_readme;
use wpup::{Config, Package, PackageRepository};

#[derive(Parser)]
#[command(name = "wpup")]
#[command(author, version, about = "Update metadata for self-hosted WordPress plugins and themes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Server directory and cache options shared by several commands
#[derive(Args, Debug, Clone)]
struct ServerArgs {
    /// Server directory holding packages/ and cache/
    #[arg(short, long, default_value = ".")]
    server_dir: PathBuf,
    /// Cache directory (default: <server-dir>/cache)
    #[arg(long)]
    cache_dir: Option<PathBuf>,
    /// Seconds to keep metadata cached
    #[arg(long, default_value_t = DEFAULT_CACHE_TTL)]
    ttl: u64,
    /// Always re-parse the archive
    #[arg(long)]
    no_cache: bool,
}

impl ServerArgs {
    fn config(&self) -> Config {
        let mut config = Config::new(&self.server_dir).with_cache_ttl(self.ttl);
        if let Some(dir) = &self.cache_dir {
            config = config.with_cache_dir(dir);
        }
        if self.no_cache {
            config = config.without_cache();
        }
        config
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Extract metadata from a plugin or theme ZIP archive
    Metadata {
        /// Path to the package archive
        archive: PathBuf,
        #[command(flatten)]
        server: ServerArgs,
    },
    /// Find a package by slug in the server's package directory
    Find {
        /// Plugin or theme slug
        slug: String,
        #[command(flatten)]
        server: ServerArgs,
    },
    /// Parse a readme.txt file
    Readme {
        /// Path to the readme file
        file: PathBuf,
    },
    /// Show the header block of a plugin file or theme stylesheet
    Headers {
        /// Path to the PHP file or style.css
        file: PathBuf,
        /// Use theme header tags instead of plugin tags
        #[arg(long)]
        theme: bool,
    },
    /// Remove one cached entry
    CacheClear {
        /// Cache key
        key: String,
        #[command(flatten)]
        server: ServerArgs,
    },
    /// Remove all expired cache entries
    CachePurge {
        #[command(flatten)]
        server: ServerArgs,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type
        shell: Shell,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    // Logs go to stderr so JSON output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Metadata { archive, server }) => {
            info!("Reading package metadata from: {}", archive.display());

            let config = server.config();
            let cache = config.open_cache()?;
            let package = Package::from_archive(
                &archive,
                None,
                cache.as_ref().map(|c| c as &dyn Cache),
                config.cache_ttl,
            )?;

            print_json(&package.metadata())
        }
        Some(Commands::Find { slug, server }) => {
            let repository = PackageRepository::new(server.config())?;
            let package = repository.require_package(&slug)?;

            print_json(&package.metadata())
        }
        Some(Commands::Readme { file }) => {
            let content = fs::read(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let readme = parse_readme(&String::from_utf8_lossy(&content)).ok_or_else(|| {
                anyhow::anyhow!(
                    "{} is not a valid readme.txt (missing === Title ===)",
                    file.display()
                )
            })?;

            print_json(&readme)
        }
        Some(Commands::Headers { file, theme }) => {
            let content = fs::read(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let fields = if theme { THEME_HEADERS } else { PLUGIN_HEADERS };

            print_json(&headers::extract_headers(&content, fields))
        }
        Some(Commands::CacheClear { key, server }) => {
            match server.config().open_cache()? {
                Some(cache) => {
                    cache.clear(&key)?;
                    println!("Cleared cache entry: {}", key);
                }
                None => println!("Caching is disabled, nothing to clear"),
            }
            Ok(())
        }
        Some(Commands::CachePurge { server }) => {
            match server.config().open_cache()? {
                Some(cache) => {
                    let removed = cache.purge_expired()?;
                    let noun = if removed == 1 { "entry" } else { "entries" };
                    println!("Removed {} expired cache {}", removed, noun);
                }
                None => println!("Caching is disabled, nothing to purge"),
            }
            Ok(())
        }
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "wpup",
                &mut std::io::stdout(),
            );
            Ok(())
        }
        None => {
            // No command provided, show help
            println!("wpup v{}", env!("CARGO_PKG_VERSION"));
            println!("Run 'wpup --help' for usage information");
            Ok(())
        }
    }
}
