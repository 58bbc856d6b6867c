//! Run configuration.
//!
//! [`Settings`] is the single immutable configuration value handed to the
//! duplicate finder. It is assembled from three layers, highest first:
//!
//! 1. command-line arguments
//! 2. `DUPETREE_*` environment variables
//! 3. the TOML config file (`<config dir>/dupetree/config.toml` or `--config`)
//!
//! Everything is validated here, before any filesystem I/O happens.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use directories::ProjectDirs;
use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::{parse_size, Cli};

/// Default chunk size for prefix and suffix hashing.
pub const DEFAULT_CHUNK: u64 = 65_536;

/// Default number of hashing threads.
pub const DEFAULT_IO_THREADS: usize = 4;

/// Keys longer than this are replaced by their digest.
pub const KEY_COMPACT_THRESHOLD: usize = 1000;

/// Configuration problems. Always fatal, always raised before any I/O.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A size string could not be parsed.
    #[error("invalid size '{value}': {reason}")]
    InvalidSize {
        /// The offending input
        value: String,
        /// Parser message
        reason: String,
    },

    /// A comparison criterion or preset name is not known.
    #[error("unknown comparison criterion '{0}'")]
    UnknownCriterion(String),

    /// After expansion and ignores, no file comparison stage is left.
    #[error("no file comparison criteria left (need one of filename, size, date, firstbytes, lastbytes, hash)")]
    NoCriteria,

    /// Two mutually exclusive options were given.
    #[error("{0} and {1} cannot be used together")]
    Conflict(&'static str, &'static str),

    /// The chunk size must be positive.
    #[error("chunk size must be greater than zero")]
    InvalidChunk,

    /// An exclude glob does not compile.
    #[error("invalid exclude pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The offending pattern
        pattern: String,
        /// Compiler message
        reason: String,
    },

    /// The config file or environment could not be read.
    #[error("invalid configuration: {0}")]
    File(#[from] Box<figment::Error>),
}

/// A single comparison criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    /// File name (metadata stage)
    FileName,
    /// File size (metadata stage)
    Size,
    /// Modification time (metadata stage)
    Date,
    /// Digest of the first chunk
    FirstBytes,
    /// Digest of the last chunk
    LastBytes,
    /// Digest of the whole file
    Hash,
    /// Directory name
    DirName,
    /// Number of direct child directories
    DirCount,
    /// Number of direct child files
    FileCount,
}

impl Criterion {
    /// Every leaf criterion.
    pub const ALL: [Criterion; 9] = [
        Self::FileName,
        Self::Size,
        Self::Date,
        Self::FirstBytes,
        Self::LastBytes,
        Self::Hash,
        Self::DirName,
        Self::DirCount,
        Self::FileCount,
    ];

    /// Name used on the command line.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::FileName => "filename",
            Self::Size => "size",
            Self::Date => "date",
            Self::FirstBytes => "firstbytes",
            Self::LastBytes => "lastbytes",
            Self::Hash => "hash",
            Self::DirName => "dirname",
            Self::DirCount => "dircount",
            Self::FileCount => "filecount",
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Criterion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| ConfigError::UnknownCriterion(s.to_string()))
    }
}

/// Preset names and what each expands to, applied in this order.
const PRESETS: [(&str, &[&str]); 8] = [
    ("epic", &["date", "full"]),
    ("full", &["name", "data"]),
    ("data", &["size", "bytes", "count", "hash"]),
    ("fast", &["size", "tree"]),
    ("tree", &["name", "count"]),
    ("name", &["dirname", "filename"]),
    ("bytes", &["firstbytes", "lastbytes"]),
    ("count", &["dircount", "filecount"]),
];

/// Presets whose expansion is also removed when the preset is ignored.
const IGNORABLE_PRESETS: [&str; 3] = ["name", "bytes", "count"];

/// The resolved set of comparison criteria.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Criteria(BTreeSet<Criterion>);

impl Criteria {
    /// Expand `check` presets, then drop everything named in `ignore`.
    ///
    /// Both inputs are comma-separated and case-insensitive.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownCriterion`] for a name that is neither
    /// a preset nor a leaf criterion.
    pub fn resolve(check: &str, ignore: Option<&str>) -> Result<Self, ConfigError> {
        let mut names = split_names(check)?;

        for (preset, expansion) in PRESETS {
            if names.contains(preset) {
                names.extend(expansion.iter().map(|s| (*s).to_string()));
            }
        }

        if let Some(ignore) = ignore {
            let ignored = split_names(ignore)?;
            for (preset, expansion) in PRESETS {
                if IGNORABLE_PRESETS.contains(&preset) && ignored.contains(preset) {
                    for name in expansion {
                        names.remove(*name);
                    }
                }
            }
            names.retain(|n| !ignored.contains(n));
        }

        let criteria = names
            .iter()
            .filter(|n| !PRESETS.iter().any(|(p, _)| p == &n.as_str()))
            .map(|n| n.parse())
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self(criteria))
    }

    /// Build directly from leaf criteria.
    #[must_use]
    pub fn from_leaves(leaves: &[Criterion]) -> Self {
        Self(leaves.iter().copied().collect())
    }

    /// Whether `criterion` is selected.
    #[must_use]
    pub fn has(&self, criterion: Criterion) -> bool {
        self.0.contains(&criterion)
    }

    /// Metadata stage runs iff any of filename, size, date.
    #[must_use]
    pub fn metadata_stage(&self) -> bool {
        self.has(Criterion::FileName) || self.has(Criterion::Size) || self.has(Criterion::Date)
    }

    /// Whether at least one file stage is enabled.
    #[must_use]
    pub fn has_file_stage(&self) -> bool {
        self.metadata_stage()
            || self.has(Criterion::FirstBytes)
            || self.has(Criterion::LastBytes)
            || self.has(Criterion::Hash)
    }

    /// Iterate the selected criteria in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = Criterion> + '_ {
        self.0.iter().copied()
    }
}

impl fmt::Display for Criteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(Criterion::name).collect();
        f.write_str(&names.join(","))
    }
}

fn split_names(list: &str) -> Result<BTreeSet<String>, ConfigError> {
    let mut names = BTreeSet::new();
    for raw in list.split(',') {
        let name = raw.trim().to_lowercase();
        if name.is_empty() {
            continue;
        }
        let known = PRESETS.iter().any(|(p, _)| *p == name)
            || Criterion::ALL.iter().any(|c| c.name() == name);
        if !known {
            return Err(ConfigError::UnknownCriterion(name));
        }
        names.insert(name);
    }
    Ok(names)
}

/// Values read from the config file and environment.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct FileConfig {
    /// Comparison criteria, comma-separated
    pub check: Option<String>,
    /// Criteria to ignore, comma-separated
    pub ignore: Option<String>,
    /// Chunk size in bytes
    pub chunk: Option<u64>,
    /// Hashing threads
    pub io_threads: Option<usize>,
    /// Hash cache location
    pub cache_path: Option<PathBuf>,
    /// Minimum size for files and directories
    pub min_size: Option<String>,
    /// Maximum size for files and directories
    pub max_size: Option<String>,
    /// Exclude globs for files and directories
    pub exclude: Option<Vec<String>>,
}

impl FileConfig {
    /// Load the config file (explicit or default location) and environment.
    ///
    /// A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::File`] if a present file or variable is malformed.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::new();
        if let Some(path) = explicit.map(Path::to_path_buf).or_else(default_config_path) {
            log::debug!("Reading configuration from {}", path.display());
            figment = figment.merge(Toml::file(path));
        }
        Self::extract(figment.merge(Env::prefixed("DUPETREE_")))
    }

    /// Extract from an already assembled figment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::File`] if a value has the wrong type.
    pub fn extract(figment: Figment) -> Result<Self, ConfigError> {
        figment.extract().map_err(|e| ConfigError::File(Box::new(e)))
    }
}

/// Default config file location.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "dupetree").map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Default hash cache location.
#[must_use]
pub fn default_cache_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "dupetree").map(|dirs| dirs.cache_dir().join("hashes.db"))
}

/// Inclusive size bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SizeRange {
    /// Lower bound
    pub min: Option<u64>,
    /// Upper bound
    pub max: Option<u64>,
}

impl SizeRange {
    /// Whether `size` falls inside the bounds.
    #[must_use]
    pub fn contains(&self, size: u64) -> bool {
        self.min.map_or(true, |min| size >= min) && self.max.map_or(true, |max| size <= max)
    }

    /// Whether any bound is set.
    #[must_use]
    pub fn is_bounded(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }
}

/// Hash cache settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheSettings {
    /// Whether digests are cached at all
    pub enabled: bool,
    /// Backing file, `None` for the default location
    pub path: Option<PathBuf>,
    /// Clear the cache before the run
    pub reset: bool,
}

/// Immutable configuration for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Scan roots in argument order
    pub roots: Vec<PathBuf>,
    /// Comparison criteria
    pub criteria: Criteria,
    /// Chunk size for prefix and suffix hashing
    pub chunk: u64,
    /// Threads used for hashing within a stage
    pub io_threads: usize,
    /// Search for duplicate directories only
    pub dirs_only: bool,
    /// Search for duplicate files only
    pub files_only: bool,
    /// Keep directories whose cumulative size is zero
    pub include_empty_dirs: bool,
    /// Keep zero-byte files
    pub include_empty_files: bool,
    /// Size bounds for file groups
    pub file_size: SizeRange,
    /// Size bounds for directory groups
    pub dir_size: SizeRange,
    /// Minimum members in a file group
    pub dups_files_count: Option<usize>,
    /// Minimum members in a directory group
    pub dups_dirs_count: Option<usize>,
    /// Exclude globs for directories
    pub exclude_dirs: Vec<glob::Pattern>,
    /// Exclude globs for files
    pub exclude_files: Vec<glob::Pattern>,
    /// Report nested directory groups as well
    pub no_combine_dirs: bool,
    /// Report file groups already covered by directory groups
    pub no_combine_files: bool,
    /// Follow symbolic links while walking
    pub follow_links: bool,
    /// Hash cache settings
    pub cache: CacheSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            criteria: Criteria::resolve("data", None).unwrap_or_default(),
            chunk: DEFAULT_CHUNK,
            io_threads: DEFAULT_IO_THREADS,
            dirs_only: false,
            files_only: false,
            include_empty_dirs: false,
            include_empty_files: false,
            file_size: SizeRange::default(),
            dir_size: SizeRange::default(),
            dups_files_count: None,
            dups_dirs_count: None,
            exclude_dirs: Vec::new(),
            exclude_files: Vec::new(),
            no_combine_dirs: false,
            no_combine_files: false,
            follow_links: false,
            cache: CacheSettings::default(),
        }
    }
}

impl Settings {
    /// Combine CLI arguments with the file/environment layer.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for any invalid or conflicting value.
    pub fn from_layers(cli: &Cli, file: &FileConfig) -> Result<Self, ConfigError> {
        if cli.dirs_only && cli.files_only {
            return Err(ConfigError::Conflict("--dirs-only", "--files-only"));
        }
        if cli.symlink && cli.hardlink {
            return Err(ConfigError::Conflict("--symlink", "--hardlink"));
        }

        let check = cli
            .check
            .as_deref()
            .or(file.check.as_deref())
            .unwrap_or("data");
        let ignore = cli.ignore.as_deref().or(file.ignore.as_deref());
        let criteria = Criteria::resolve(check, ignore)?;
        if !criteria.has_file_stage() {
            return Err(ConfigError::NoCriteria);
        }

        let chunk = cli.chunk.or(file.chunk).unwrap_or(DEFAULT_CHUNK);
        if chunk == 0 {
            return Err(ConfigError::InvalidChunk);
        }
        let io_threads = cli
            .io_threads
            .or(file.io_threads)
            .unwrap_or(DEFAULT_IO_THREADS)
            .max(1);

        let min_size = parse_opt_size(cli.min_size.as_deref())?;
        let max_size = parse_opt_size(cli.max_size.as_deref())?;
        let file_min_size = parse_opt_size(file.min_size.as_deref())?;
        let file_max_size = parse_opt_size(file.max_size.as_deref())?;
        let file_size = SizeRange {
            min: layered_bound(min_size, cli.min_file_size.as_deref(), file_min_size)?,
            max: layered_bound(max_size, cli.max_file_size.as_deref(), file_max_size)?,
        };
        let dir_size = SizeRange {
            min: layered_bound(min_size, cli.min_dir_size.as_deref(), file_min_size)?,
            max: layered_bound(max_size, cli.max_dir_size.as_deref(), file_max_size)?,
        };

        let shared_exclude: Vec<String> = if cli.exclude.is_empty() {
            file.exclude.clone().unwrap_or_default()
        } else {
            cli.exclude.clone()
        };
        let exclude_dirs = compile_patterns(cli.exclude_dirs.iter().chain(&shared_exclude))?;
        let exclude_files = compile_patterns(cli.exclude_files.iter().chain(&shared_exclude))?;

        Ok(Self {
            roots: if cli.paths.is_empty() {
                vec![PathBuf::from(".")]
            } else {
                cli.paths.clone()
            },
            criteria,
            chunk,
            io_threads,
            dirs_only: cli.dirs_only,
            files_only: cli.files_only,
            include_empty_dirs: cli.include_empty || cli.include_empty_dirs,
            include_empty_files: cli.include_empty || cli.include_empty_files,
            file_size,
            dir_size,
            dups_files_count: cli.dups_count.or(cli.dups_files_count),
            dups_dirs_count: cli.dups_count.or(cli.dups_dirs_count),
            exclude_dirs,
            exclude_files,
            no_combine_dirs: cli.no_combine || cli.no_combine_dirs,
            no_combine_files: cli.no_combine || cli.no_combine_files,
            follow_links: cli.follow_links,
            cache: CacheSettings {
                enabled: !cli.no_cache,
                path: cli.cache.clone().or_else(|| file.cache_path.clone()),
                reset: cli.reset_cache,
            },
        })
    }

    /// Load the file/environment layer and combine it with `cli`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for any invalid or conflicting value.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let file = FileConfig::load(cli.config.as_deref())?;
        Self::from_layers(cli, &file)
    }

    /// Whether file groups already inside a reported directory are dropped.
    #[must_use]
    pub fn combine_files(&self) -> bool {
        !(self.no_combine_files || self.files_only)
    }
}

fn parse_opt_size(value: Option<&str>) -> Result<Option<u64>, ConfigError> {
    value
        .map(|v| {
            parse_size(v).map_err(|reason| ConfigError::InvalidSize {
                value: v.to_string(),
                reason,
            })
        })
        .transpose()
}

/// A command-line shorthand overrides the kind-specific option; the config
/// file shorthand only fills a bound the command line left open.
fn layered_bound(
    shorthand: Option<u64>,
    specific: Option<&str>,
    file: Option<u64>,
) -> Result<Option<u64>, ConfigError> {
    let specific = parse_opt_size(specific)?;
    Ok(shorthand.or(specific).or(file))
}

fn compile_patterns<'a>(
    patterns: impl Iterator<Item = &'a String>,
) -> Result<Vec<glob::Pattern>, ConfigError> {
    patterns
        .map(|p| {
            glob::Pattern::new(p).map_err(|e| ConfigError::InvalidPattern {
                pattern: p.clone(),
                reason: e.to_string(),
            })
        })
        .collect()
}
