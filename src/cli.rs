//! Command-line interface definitions for dupetree.
//!
//! Arguments are declared with the clap derive API. Values that need
//! validation (sizes, criteria, conflicting modes) are kept raw here and
//! checked in [`crate::config`], so every bad value becomes a configuration
//! error with its own exit code.
//!
//! # Example
//!
//! ```bash
//! # Report duplicate directories and files under two trees
//! dupetree ~/photos /mnt/backup/photos
//!
//! # Compare names and content only, ignore timestamps and counts
//! dupetree --check name,bytes,hash ~/src
//!
//! # Replace duplicate files with hard links, showing what would happen first
//! dupetree --files-only --hardlink --dry-run ~/Downloads
//! ```

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Find duplicate files and whole duplicate directory trees.
///
/// Candidates are eliminated in stages (metadata, first bytes, last bytes,
/// full hash) and directories are compared by a fingerprint built from
/// everything they contain.
#[derive(Debug, Parser)]
#[command(name = "dupetree")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directories to scan (default: current directory)
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file (default: platform config dir/dupetree/config.toml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Criteria or presets to compare by, comma-separated
    ///
    /// Presets: epic, full, data, fast, tree, name, bytes, count.
    /// Criteria: filename, size, date, firstbytes, lastbytes, hash,
    /// dirname, dircount, filecount. Default: data.
    #[arg(short, long, value_name = "LIST")]
    pub check: Option<String>,

    /// Criteria or presets to leave out, comma-separated
    #[arg(short, long, value_name = "LIST")]
    pub ignore: Option<String>,

    /// Chunk size in bytes for first/last bytes comparison (default: 65536)
    #[arg(long, value_name = "BYTES")]
    pub chunk: Option<u64>,

    /// Number of threads used for hashing (default: 4)
    #[arg(long, value_name = "N")]
    pub io_threads: Option<usize>,

    /// Search only for duplicate directories
    #[arg(long)]
    pub dirs_only: bool,

    /// Search only for duplicate files and skip directories
    #[arg(long)]
    pub files_only: bool,

    /// Skip directories for output and actions
    #[arg(long)]
    pub no_dirs: bool,

    /// Skip files for output and actions
    #[arg(long)]
    pub no_files: bool,

    /// Minimum size for files and directories (e.g. 10KB, 1.5MiB);
    /// overrides --min-file-size and --min-dir-size
    #[arg(long, value_name = "SIZE")]
    pub min_size: Option<String>,

    /// Maximum size for files and directories; overrides --max-file-size
    /// and --max-dir-size
    #[arg(long, value_name = "SIZE")]
    pub max_size: Option<String>,

    /// Minimum size for directories
    #[arg(long, value_name = "SIZE")]
    pub min_dir_size: Option<String>,

    /// Maximum size for directories
    #[arg(long, value_name = "SIZE")]
    pub max_dir_size: Option<String>,

    /// Minimum size for files
    #[arg(long, value_name = "SIZE")]
    pub min_file_size: Option<String>,

    /// Maximum size for files
    #[arg(long, value_name = "SIZE")]
    pub max_file_size: Option<String>,

    /// Process empty directories and files
    #[arg(long)]
    pub include_empty: bool,

    /// Process empty directories
    #[arg(long)]
    pub include_empty_dirs: bool,

    /// Process empty files
    #[arg(long)]
    pub include_empty_files: bool,

    /// Minimum number of duplicates in a group; overrides --dups-files-count
    /// and --dups-dirs-count
    #[arg(long, value_name = "N")]
    pub dups_count: Option<usize>,

    /// Minimum number of duplicates in a directory group
    #[arg(long, value_name = "N")]
    pub dups_dirs_count: Option<usize>,

    /// Minimum number of duplicates in a file group
    #[arg(long, value_name = "N")]
    pub dups_files_count: Option<usize>,

    /// Exclude directories and files matching a glob (repeatable)
    #[arg(long, value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// Exclude directories matching a glob (repeatable)
    #[arg(long, value_name = "PATTERN")]
    pub exclude_dirs: Vec<String>,

    /// Exclude files matching a glob (repeatable)
    #[arg(long, value_name = "PATTERN")]
    pub exclude_files: Vec<String>,

    /// Report all duplicate directories and files without compacting
    #[arg(long)]
    pub no_combine: bool,

    /// Report nested duplicate directories separately
    #[arg(long)]
    pub no_combine_dirs: bool,

    /// Report files even when they sit in duplicate directories
    #[arg(long)]
    pub no_combine_files: bool,

    /// Follow symbolic links during traversal
    #[arg(long)]
    pub follow_links: bool,

    /// Replace duplicates with symbolic links to the kept copy
    #[arg(long)]
    pub symlink: bool,

    /// Replace duplicates with hard links to the kept copy
    #[arg(long)]
    pub hardlink: bool,

    /// Delete duplicates
    #[arg(short = 'D', long)]
    pub delete: bool,

    /// Move removed duplicates to the system trash instead of unlinking
    #[arg(long)]
    pub trash: bool,

    /// Log the actions that would be taken without touching the disk
    #[arg(long)]
    pub dry_run: bool,

    /// Print the summary only, without the report or any action
    #[arg(long)]
    pub brief: bool,

    /// Show paths relative to their scan root
    #[arg(long, visible_alias = "rel")]
    pub relative_paths: bool,

    /// Report format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Print errors as JSON objects
    #[arg(long)]
    pub json_errors: bool,

    /// Path to the hash cache database
    #[arg(long, value_name = "PATH")]
    pub cache: Option<PathBuf>,

    /// Disable hash caching
    #[arg(long, conflicts_with = "cache")]
    pub no_cache: bool,

    /// Clear the hash cache before scanning
    #[arg(long)]
    pub reset_cache: bool,

    /// Hide progress bars
    #[arg(long)]
    pub no_progress: bool,
}

/// Report format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable report
    Text,
    /// JSON report for scripting
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
/// Supports suffixes: B, K, KB, KiB, M, MB, MiB, G, GB, GiB, T, TB, TiB.
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// # Examples
///
/// ```
/// use dupetree::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1KB").unwrap(), 1000);
/// assert_eq!(parse_size("1KiB").unwrap(), 1024);
/// assert_eq!(parse_size("2.5MB").unwrap(), 2_500_000);
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

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "K" | "KB" => 1_000,
        "KI" | "KIB" => 1 << 10,
        "M" | "MB" => 1_000_000,
        "MI" | "MIB" => 1 << 20,
        "G" | "GB" => 1_000_000_000,
        "GI" | "GIB" => 1 << 30,
        "T" | "TB" => 1_000_000_000_000,
        "TI" | "TIB" => 1 << 40,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}
