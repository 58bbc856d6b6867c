//! The working set: every file and directory still in contention.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{Settings, KEY_COMPACT_THRESHOLD};
use crate::scanner::hasher::hash_str;
use crate::scanner::{Catalog, DirRecord, FileRecord};

/// Which record kinds take part in the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Scope {
    /// Directories are tracked, keyed and unwound
    pub track_dirs: bool,
    /// Removing a directory also removes its direct child files
    pub dirs_only: bool,
}

impl Scope {
    /// Derive the scope from the run settings.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            track_dirs: !settings.files_only,
            dirs_only: settings.dirs_only,
        }
    }
}

/// Files and directories still in contention, threaded through every step.
///
/// Records only ever leave the set; nothing is added after construction.
#[derive(Debug, Clone, Default)]
pub struct WorkingSet {
    /// Remaining files, keyed by path
    pub files: BTreeMap<PathBuf, FileRecord>,
    /// Remaining directories, keyed by path
    pub dirs: BTreeMap<PathBuf, DirRecord>,
    children: Arc<HashMap<PathBuf, Vec<PathBuf>>>,
    scope: Scope,
}

impl WorkingSet {
    /// Take ownership of the catalogued records.
    ///
    /// Directories are dropped entirely when the scope does not track them.
    #[must_use]
    pub fn from_catalog(catalog: Catalog, scope: Scope) -> Self {
        Self {
            files: catalog.files,
            dirs: if scope.track_dirs {
                catalog.dirs
            } else {
                BTreeMap::new()
            },
            children: Arc::new(catalog.children),
            scope,
        }
    }

    /// Build from explicit records, deriving the child index.
    #[must_use]
    pub fn from_records(
        files: impl IntoIterator<Item = FileRecord>,
        dirs: impl IntoIterator<Item = DirRecord>,
        scope: Scope,
    ) -> Self {
        let files: BTreeMap<PathBuf, FileRecord> =
            files.into_iter().map(|f| (f.path.clone(), f)).collect();
        let mut children: HashMap<PathBuf, Vec<PathBuf>> = HashMap::new();
        for file in files.values() {
            children
                .entry(file.parent.clone())
                .or_default()
                .push(file.path.clone());
        }
        let dirs = if scope.track_dirs {
            dirs.into_iter().map(|d| (d.path.clone(), d)).collect()
        } else {
            BTreeMap::new()
        };
        Self {
            files,
            dirs,
            children: Arc::new(children),
            scope,
        }
    }

    /// The scope this set was built with.
    #[must_use]
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Number of files plus directories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len() + self.dirs.len()
    }

    /// Whether nothing is left.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.dirs.is_empty()
    }

    /// Remove a single directory, plus its direct child files in dirs-only
    /// mode. Does not touch ancestors.
    ///
    /// Returns the removed record's parent, if the directory was present.
    pub fn remove_dir(&mut self, path: &Path) -> Option<Option<PathBuf>> {
        let removed = self.dirs.remove(path)?;
        if self.scope.dirs_only {
            if let Some(files) = self.children.get(path) {
                for file in files {
                    self.files.remove(file);
                }
            }
        }
        Some(removed.parent)
    }

    /// Remove `start` and every ancestor still in the set, stopping at the
    /// first ancestor that is already gone or at a scan root.
    ///
    /// Returns how many directories were removed.
    pub fn unwind(&mut self, start: &Path) -> usize {
        let mut removed = 0;
        let mut current = Some(start.to_path_buf());
        while let Some(path) = current {
            match self.remove_dir(&path) {
                Some(parent) => {
                    removed += 1;
                    current = parent;
                }
                None => break,
            }
        }
        removed
    }

    /// Remove a file proven unique and unwind its parent chain.
    pub fn eliminate_file(&mut self, path: &Path) {
        if let Some(file) = self.files.remove(path) {
            if self.scope.track_dirs {
                self.unwind(&file.parent);
            }
        }
    }
}

/// Replace a key longer than the compaction threshold with its digest.
#[must_use]
pub fn compact_key(key: String) -> String {
    if key.len() > KEY_COMPACT_THRESHOLD {
        hash_str(&key)
    } else {
        key
    }
}

/// What kind of child a folded key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildKind {
    /// A file directly inside the directory
    File,
    /// A subdirectory
    Dir,
}

impl ChildKind {
    fn tag(self) -> char {
        match self {
            Self::File => 'f',
            Self::Dir => 'd',
        }
    }
}

/// Append child keys to a directory key, then compact.
///
/// Each child enters as `/` + kind tag + digest of its key. Digests are fixed
/// width hex, so a child key can never be mistaken for several siblings or
/// for a deeper level, whatever characters the keys themselves hold.
#[must_use]
pub fn fold_child_keys<'a>(
    mut key: String,
    kind: ChildKind,
    children: impl IntoIterator<Item = &'a str>,
) -> String {
    let mut framed: Vec<String> = children.into_iter().map(hash_str).collect();
    framed.sort_unstable();
    for digest in framed {
        key.push('/');
        key.push(kind.tag());
        key.push_str(&digest);
    }
    compact_key(key)
}
