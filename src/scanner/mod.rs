//! Scanner module: the entry catalog and content hashing.
//!
//! This module provides functionality for:
//! - Sorted, deterministic directory walking using walkdir
//! - Stable node identities (device + inode on Unix)
//! - Content digests with BLAKE3 over whole files or byte windows
//!
//! # Architecture
//!
//! - [`catalog`]: walks the scan roots into [`FileRecord`]s and [`DirRecord`]s
//! - [`identity`]: derives a [`NodeId`] from file metadata
//! - [`hasher`]: BLAKE3 digests plus the cache-backed [`HashProvider`]
//!
//! # Example
//!
//! ```no_run
//! use dupetree::scanner::Catalog;
//! use std::path::PathBuf;
//!
//! let catalog = Catalog::collect(&[PathBuf::from(".")], false).unwrap();
//! println!(
//!     "{} directories, {} files",
//!     catalog.dirs.len(),
//!     catalog.files.len()
//! );
//! ```

pub mod catalog;
pub mod hasher;
pub mod identity;

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use catalog::Catalog;
pub use hasher::{HashProvider, Hasher};

/// Opaque identity of an underlying file, stable across repeated stats.
///
/// Two hardlinked paths share one identity. Used as the hash cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Wrap an already formatted identity.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The identity as stored in the cache.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One regular file found during the catalog walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Absolute path to the file
    pub path: PathBuf,
    /// Directory that directly contains the file
    pub parent: PathBuf,
    /// Final path component
    pub name: String,
    /// File size in bytes
    pub size: u64,
    /// Modification time in whole seconds since the Unix epoch
    pub modified: i64,
    /// Underlying node identity
    pub node: NodeId,
    /// Scan root this file was found under
    pub root: PathBuf,
    /// Catalog ordinal, defines insertion order
    pub seq: usize,
    /// Accumulated classification key
    pub key: String,
}

/// One directory found during the catalog walk.
///
/// `size`, `dir_count` and `file_count` are fixed at catalog time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirRecord {
    /// Absolute path to the directory
    pub path: PathBuf,
    /// Containing directory, `None` for a scan root
    pub parent: Option<PathBuf>,
    /// Final path component
    pub name: String,
    /// Sum of all descendant file sizes
    pub size: u64,
    /// Number of direct child directories
    pub dir_count: usize,
    /// Number of direct child files
    pub file_count: usize,
    /// Scan root this directory belongs to
    pub root: PathBuf,
    /// Modification time in whole seconds since the Unix epoch
    pub modified: i64,
    /// Underlying node identity
    pub node: NodeId,
    /// Catalog ordinal, defines insertion order
    pub seq: usize,
    /// Accumulated classification key
    pub key: String,
}

/// Errors that can occur while cataloguing or hashing.
///
/// Apart from a bad scan root these are never fatal: the affected record
/// is dropped and the error is reported in the run summary.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A content digest could not be computed.
    #[error(transparent)]
    Hash(#[from] HashError),
}

impl ScanError {
    /// Classify an I/O error raised for `path`.
    #[must_use]
    pub fn from_io(path: PathBuf, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            _ => Self::Io {
                path,
                source: error,
            },
        }
    }
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    /// Classify an I/O error raised while reading `path`.
    #[must_use]
    pub fn from_io(path: PathBuf, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            _ => Self::Io {
                path,
                source: error,
            },
        }
    }
}
