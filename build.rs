// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn server_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("server_dir")
            .short('s')
            .long("server-dir")
            .value_name("DIR")
            .default_value(".")
            .help("Server directory holding packages/ and cache/"),
    )
    .arg(
        Arg::new("cache_dir")
            .long("cache-dir")
            .value_name("DIR")
            .help("Cache directory (default: <server-dir>/cache)"),
    )
    .arg(
        Arg::new("ttl")
            .long("ttl")
            .value_name("SECS")
            .default_value("604800")
            .help("Seconds to keep metadata cached"),
    )
    .arg(
        Arg::new("no_cache")
            .long("no-cache")
            .action(ArgAction::SetTrue)
            .help("Always re-parse the archive"),
    )
}

fn build_cli() -> Command {
    Command::new("wpup")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Wpup Contributors")
        .about("Update metadata for self-hosted WordPress plugins and themes")
        .subcommand_required(false)
        .subcommand(server_args(
            Command::new("metadata")
                .about("Extract metadata from a plugin or theme ZIP archive")
                .arg(Arg::new("archive").required(true).help("Path to the package archive")),
        ))
        .subcommand(server_args(
            Command::new("find")
                .about("Find a package by slug in the server's package directory")
                .arg(Arg::new("slug").required(true).help("Plugin or theme slug")),
        ))
        .subcommand(
            Command::new("readme")
                .about("Parse a readme.txt file")
                .arg(Arg::new("file").required(true).help("Path to the readme file")),
        )
        .subcommand(
            Command::new("headers")
                .about("Show the header block of a plugin file or theme stylesheet")
                .arg(Arg::new("file").required(true).help("Path to the PHP file or style.css"))
                .arg(
                    Arg::new("theme")
                        .long("theme")
                        .action(ArgAction::SetTrue)
                        .help("Use theme header tags instead of plugin tags"),
                ),
        )
        .subcommand(server_args(
            Command::new("cache-clear")
                .about("Remove one cached entry")
                .arg(Arg::new("key").required(true).help("Cache key")),
        ))
        .subcommand(server_args(
            Command::new("cache-purge").about("Remove all expired cache entries"),
        ))
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(["bash", "elvish", "fish", "powershell", "zsh"])
                        .help("Shell type"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Create man directory
    let out_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).expect("Failed to create man directory");

    // Generate main man page
    let man = Man::new(build_cli());
    let mut buffer = Vec::new();
    man.render(&mut buffer).expect("Failed to render man page");

    let man_path = man_dir.join("wpup.1");
    fs::write(&man_path, buffer).expect("Failed to write man page");
}
