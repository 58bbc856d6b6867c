//! Resolved duplicate groups.
//!
//! # Overview
//!
//! A [`DuplicateGroup`] is what the finder hands to reporting and to the
//! action executor: the members of one final key, canonical copy first.
//! It carries everything a report needs, so nothing downstream has to look
//! at the working set again.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::scanner::NodeId;

/// Whether a group holds files or directories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    /// Duplicate directory trees
    Directory,
    /// Duplicate files
    File,
}

/// One member of a duplicate group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    /// Absolute path
    pub path: PathBuf,
    /// Scan root the member was found under
    pub root: PathBuf,
    /// Catalog ordinal
    pub seq: usize,
    /// Underlying node identity
    pub node: NodeId,
    /// The copy that is kept
    pub canonical: bool,
    /// The member's parent directory is itself a duplicate directory
    pub in_directory_scope: bool,
}

impl GroupMember {
    /// Path relative to the parent of its scan root, so the root's own
    /// name stays visible (`photos/2021/a.jpg`).
    #[must_use]
    pub fn relative_path(&self) -> PathBuf {
        let base = self.root.parent().unwrap_or(Path::new(""));
        self.path
            .strip_prefix(base)
            .map_or_else(|_| self.path.clone(), Path::to_path_buf)
    }
}

/// A set of records sharing one final key.
///
/// Invariant: at least two members, exactly one of them canonical, and the
/// canonical member comes first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// File or directory group
    pub kind: GroupKind,
    /// Final key shared by every member
    pub key: String,
    /// Representative size: file size or cumulative directory size
    pub size: u64,
    /// Representative modification time (seconds since the Unix epoch)
    pub modified: i64,
    /// Direct child directories of the representative (directories only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir_count: Option<usize>,
    /// Direct child files of the representative (directories only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_count: Option<usize>,
    /// Members, canonical first
    pub members: Vec<GroupMember>,
}

impl DuplicateGroup {
    /// The kept copy.
    #[must_use]
    pub fn canonical(&self) -> Option<&GroupMember> {
        self.members.iter().find(|m| m.canonical)
    }

    /// Members that may be deleted or replaced by links.
    pub fn actionable(&self) -> impl Iterator<Item = &GroupMember> {
        self.members.iter().filter(|m| !m.canonical)
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the group has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Bytes freed by removing every actionable member.
    #[must_use]
    pub fn reclaimable(&self) -> u64 {
        self.size * self.actionable().count() as u64
    }

    /// Whether this is a directory group.
    #[must_use]
    pub fn is_directory(&self) -> bool {
        self.kind == GroupKind::Directory
    }
}
