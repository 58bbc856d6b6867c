//! Removal and linking of actionable duplicates.
//!
//! # Overview
//!
//! For every group the canonical copy is left alone and each actionable
//! member is removed (permanently or to the system trash), then optionally
//! replaced by a symbolic or hard link to the canonical copy.
//!
//! # Safety
//!
//! - A group whose canonical copy is gone is skipped entirely
//! - Members that resolve to the canonical copy are never touched
//! - Failures are recorded per member; the remaining groups still run
//!
//! # Example
//!
//! ```no_run
//! use dupetree::actions::{execute_groups, ActionConfig, ActionKind};
//!
//! let config = ActionConfig::new(ActionKind::Symlink).with_dry_run(true);
//! let report = execute_groups(&[], &[], &config);
//! assert!(report.all_succeeded());
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::duplicates::{DuplicateGroup, GroupKind};
use crate::scanner::identity::node_id;

/// What to do with actionable members.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// Remove the member
    Delete,
    /// Remove the member and put a symbolic link to the canonical copy in its place
    Symlink,
    /// Remove the member and put a hard link to the canonical copy in its place
    Hardlink,
}

impl ActionKind {
    fn verb(self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::Symlink => "symlink",
            Self::Hardlink => "hardlink",
        }
    }
}

/// Executor configuration.
#[derive(Debug, Clone)]
pub struct ActionConfig {
    /// The action
    pub kind: ActionKind,
    /// Move removed members to the system trash instead of unlinking them
    pub trash: bool,
    /// Only log what would be done
    pub dry_run: bool,
}

impl ActionConfig {
    /// Permanent removal, not a dry run.
    #[must_use]
    pub fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            trash: false,
            dry_run: false,
        }
    }

    /// Use the system trash.
    #[must_use]
    pub fn with_trash(mut self, trash: bool) -> Self {
        self.trash = trash;
        self
    }

    /// Only log what would be done.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Error type for action operations.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The group's canonical copy no longer exists.
    #[error("canonical copy missing, group skipped: {0}")]
    CanonicalMissing(PathBuf),

    /// Directories cannot be hard-linked.
    #[error("cannot hard-link directory: {0}")]
    DirectoryHardlink(PathBuf),

    /// Removing a member failed.
    #[error("failed to remove {path}: {source}")]
    Remove {
        /// Member path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Moving a member to the trash failed.
    #[error("trash operation failed for {path}: {message}")]
    Trash {
        /// Member path
        path: PathBuf,
        /// Message from the trash backend
        message: String,
    },

    /// Creating the link failed after the member was removed.
    #[error("failed to link {path} to {target}: {source}")]
    Link {
        /// Member path
        path: PathBuf,
        /// Canonical copy
        target: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },
}

impl ActionError {
    /// The path the error is about.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::CanonicalMissing(p) | Self::DirectoryHardlink(p) => p,
            Self::Remove { path, .. } | Self::Trash { path, .. } | Self::Link { path, .. } => path,
        }
    }
}

/// Why a member was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The member no longer exists
    Missing,
    /// The member already is the canonical copy (same path after resolution
    /// or, for hard links, same node)
    SameFile,
}

/// Results of one executor run.
#[derive(Debug, Default)]
pub struct ActionReport {
    /// Members removed (and linked, for link actions)
    pub processed: Vec<PathBuf>,
    /// Members that would have been processed in a dry run
    pub planned: Vec<PathBuf>,
    /// Members left alone
    pub skipped: Vec<(PathBuf, SkipReason)>,
    /// Groups skipped entirely
    pub skipped_groups: usize,
    /// Failures, in order
    pub errors: Vec<ActionError>,
    /// Bytes no longer held by duplicate copies
    pub bytes_freed: u64,
}

impl ActionReport {
    /// Whether nothing failed.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.errors.is_empty()
    }

    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self) -> String {
        if !self.planned.is_empty() {
            return format!("Dry run: {} item(s) would be processed", self.planned.len());
        }
        let mut text = format!(
            "Processed {} item(s), freed {} bytes",
            self.processed.len(),
            self.bytes_freed
        );
        if !self.skipped.is_empty() {
            text.push_str(&format!(", {} skipped", self.skipped.len()));
        }
        if !self.errors.is_empty() {
            text.push_str(&format!(", {} failed", self.errors.len()));
        }
        text
    }
}

/// Act on every group: directory groups first, then file groups.
pub fn execute_groups(
    dir_groups: &[DuplicateGroup],
    file_groups: &[DuplicateGroup],
    config: &ActionConfig,
) -> ActionReport {
    let mut report = ActionReport::default();
    for group in dir_groups.iter().chain(file_groups) {
        execute_group(group, config, &mut report);
    }
    log::info!("{}", report.summary());
    report
}

fn execute_group(group: &DuplicateGroup, config: &ActionConfig, report: &mut ActionReport) {
    let Some(canonical) = group.canonical() else {
        report.skipped_groups += 1;
        return;
    };
    let canonical_path = &canonical.path;

    let Ok(canonical_real) = fs::canonicalize(canonical_path) else {
        log::error!("Canonical copy missing: {}", canonical_path.display());
        report.skipped_groups += 1;
        report
            .errors
            .push(ActionError::CanonicalMissing(canonical_path.clone()));
        return;
    };

    if config.kind == ActionKind::Hardlink && group.kind == GroupKind::Directory {
        log::error!("Cannot hard-link directory group of {}", canonical_path.display());
        report.skipped_groups += 1;
        report
            .errors
            .push(ActionError::DirectoryHardlink(canonical_path.clone()));
        return;
    }

    let canonical_node = fs::metadata(canonical_path)
        .ok()
        .map(|m| node_id(canonical_path, &m));

    for member in group.actionable() {
        let path = &member.path;
        let Ok(meta) = fs::symlink_metadata(path) else {
            log::warn!("Skipping missing duplicate: {}", path.display());
            report.skipped.push((path.clone(), SkipReason::Missing));
            continue;
        };

        let resolves_to_canonical = fs::canonicalize(path).is_ok_and(|p| p == canonical_real);
        let shares_node = config.kind == ActionKind::Hardlink
            && canonical_node.is_some()
            && fs::metadata(path).ok().map(|m| node_id(path, &m)) == canonical_node;
        if resolves_to_canonical || shares_node {
            log::debug!("Already the canonical copy: {}", path.display());
            report.skipped.push((path.clone(), SkipReason::SameFile));
            continue;
        }

        if config.dry_run {
            log::info!(
                "Would {} {} (keeping {})",
                config.kind.verb(),
                path.display(),
                canonical_path.display()
            );
            report.planned.push(path.clone());
            continue;
        }

        if let Err(e) = remove(path, meta.is_dir(), config.trash) {
            log::error!("{}", e);
            report.errors.push(e);
            continue;
        }
        report.bytes_freed += group.size;

        if let Err(e) = link(config.kind, canonical_path, path, meta.is_dir()) {
            log::error!("{}", e);
            report.errors.push(e);
            continue;
        }
        log::info!("{}: {}", config.kind.verb(), path.display());
        report.processed.push(path.clone());
    }
}

fn remove(path: &Path, is_dir: bool, to_trash: bool) -> Result<(), ActionError> {
    if to_trash {
        return trash::delete(path).map_err(|e| ActionError::Trash {
            path: path.to_path_buf(),
            message: e.to_string(),
        });
    }
    let result = if is_dir {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    result.map_err(|source| ActionError::Remove {
        path: path.to_path_buf(),
        source,
    })
}

fn link(kind: ActionKind, target: &Path, path: &Path, is_dir: bool) -> Result<(), ActionError> {
    let result = match kind {
        ActionKind::Delete => return Ok(()),
        ActionKind::Hardlink => fs::hard_link(target, path),
        ActionKind::Symlink => make_symlink(target, path, is_dir),
    };
    result.map_err(|source| ActionError::Link {
        path: path.to_path_buf(),
        target: target.to_path_buf(),
        source,
    })
}

#[cfg(unix)]
fn make_symlink(target: &Path, path: &Path, _is_dir: bool) -> io::Result<()> {
    std::os::unix::fs::symlink(target, path)
}

#[cfg(windows)]
fn make_symlink(target: &Path, path: &Path, is_dir: bool) -> io::Result<()> {
    if is_dir {
        std::os::windows::fs::symlink_dir(target, path)
    } else {
        std::os::windows::fs::symlink_file(target, path)
    }
}

#[cfg(not(any(unix, windows)))]
fn make_symlink(_target: &Path, _path: &Path, _is_dir: bool) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "symbolic links are not supported on this platform",
    ))
}
