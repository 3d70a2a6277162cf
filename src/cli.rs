//! Command-line interface definitions for dupsweep.
//!
//! Global options (verbosity, color, config file) come before the
//! subcommand; everything about a run lives on `scan`.
//!
//! # Example
//!
//! ```bash
//! # Report duplicates under two directories
//! dupsweep scan ~/Pictures /media/backup/Pictures
//!
//! # Machine-readable report, MD5 fingerprints, only large files
//! dupsweep scan ~/Downloads --output json --algorithm md5 --min-size 1MB
//!
//! # Show what would be removed, keeping the copy with the shortest name
//! dupsweep scan ~/Downloads --delete-duplicates --keep-strategy shortest_name --dry-run
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::actions::KeepStrategy;
use crate::scanner::HashAlgorithm;

/// Duplicate file finder with safe, reversible resolution.
///
/// dupsweep groups files by size, fingerprints only the candidates that
/// share a size, and can move all but one copy of each group to the trash.
#[derive(Debug, Parser)]
#[command(name = "dupsweep")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print fatal errors as a JSON object on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan paths for duplicate files
    Scan(ScanArgs),
    /// Print the effective configuration as TOML
    Config(ConfigArgs),
}

/// Arguments for the config subcommand.
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Write the configuration to the config file instead of printing it
    ///
    /// Uses `--config PATH` when given, else the platform config path.
    /// An existing file is never overwritten.
    #[arg(long)]
    pub init: bool,
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Files or directories to scan
    #[arg(value_name = "PATH", required = true, num_args = 1..)]
    pub paths: Vec<PathBuf>,

    /// Fingerprint algorithm: md5, sha1, sha256, sha512
    #[arg(short, long, value_name = "NAME")]
    pub algorithm: Option<HashAlgorithm>,

    /// Minimum file size to consider (e.g., 1KB, 1MB, 1GB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub min_size: Option<u64>,

    /// Maximum file size to consider (e.g., 1KB, 1MB, 1GB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub max_size: Option<u64>,

    /// Only consider these extensions (comma-separated, e.g. jpg,png)
    #[arg(short, long, value_name = "EXT", value_delimiter = ',')]
    pub extensions: Vec<String>,

    /// Ignore these extensions (comma-separated)
    #[arg(long, value_name = "EXT", value_delimiter = ',')]
    pub exclude_extensions: Vec<String>,

    /// Follow symbolic links during scan
    #[arg(long, overrides_with = "no_follow_symlinks")]
    pub follow_symlinks: bool,

    /// Do not follow symbolic links, even if the config file enables it
    #[arg(long, overrides_with = "follow_symlinks")]
    pub no_follow_symlinks: bool,

    /// Skip hidden files and directories (starting with .)
    #[arg(long, overrides_with = "no_skip_hidden")]
    pub skip_hidden: bool,

    /// Scan hidden files, even if the config file skips them
    #[arg(long, overrides_with = "skip_hidden")]
    pub no_skip_hidden: bool,

    /// Ignore zero-byte files instead of grouping them together
    #[arg(long, overrides_with = "no_skip_empty")]
    pub skip_empty: bool,

    /// Group zero-byte files, even if the config file skips them
    #[arg(long, overrides_with = "skip_empty")]
    pub no_skip_empty: bool,

    /// Number of I/O threads for hashing (default: 4)
    ///
    /// Lower values reduce disk thrashing on HDDs.
    #[arg(long, value_name = "N")]
    pub io_threads: Option<usize>,

    /// Report format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Remove all but one copy of each duplicate group
    #[arg(short, long)]
    pub delete_duplicates: bool,

    /// Which copy to keep: first, last, shortest_name, longest_name
    #[arg(short, long, value_name = "STRATEGY")]
    pub keep_strategy: Option<KeepStrategy>,

    /// Show what would be deleted without touching any file
    #[arg(short = 'n', long, requires = "delete_duplicates")]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Delete permanently instead of moving to trash
    ///
    /// Warning: Files cannot be recovered after permanent deletion.
    #[arg(long)]
    pub permanent: bool,

    /// Delete permanently when the trash is unavailable or fails
    #[arg(long, conflicts_with = "permanent")]
    pub permanent_fallback: bool,
}

impl ScanArgs {
    /// `Some` when a flag pair was given on the command line.
    #[must_use]
    pub fn follow_symlinks_flag(&self) -> Option<bool> {
        toggle(self.follow_symlinks, self.no_follow_symlinks)
    }

    /// See [`ScanArgs::follow_symlinks_flag`].
    #[must_use]
    pub fn skip_hidden_flag(&self) -> Option<bool> {
        toggle(self.skip_hidden, self.no_skip_hidden)
    }

    /// See [`ScanArgs::follow_symlinks_flag`].
    #[must_use]
    pub fn skip_empty_flag(&self) -> Option<bool> {
        toggle(self.skip_empty, self.no_skip_empty)
    }
}

fn toggle(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    }
}

/// Report format for scan results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable listing
    #[default]
    Text,
    /// JSON for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// # Examples
///
/// ```
/// use dupsweep::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1KB").unwrap(), 1000);
/// assert_eq!(parse_size("500KiB").unwrap(), 512_000);
/// assert_eq!(parse_size("1MiB").unwrap(), 1_048_576);
/// ```
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// a negative number, or an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }
    if s.starts_with('-') {
        return Err("Size cannot be negative".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1_099_511_627_776,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}
