//! Entry catalog: the flat record set the pipeline starts from.
//!
//! # Overview
//!
//! [`Catalog::collect`] walks every scan root with [`walkdir`] and records
//! each directory and regular file it meets. Children are visited sorted by
//! file name and roots in argument order, so catalog ordinals (`seq`) are
//! deterministic for a given tree.
//!
//! After the walk, directory sizes and child counts are folded bottom-up.
//! They never change afterwards.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::identity::{mtime_secs, node_id};
use super::{DirRecord, FileRecord, ScanError};

/// All directories and files found under the scan roots.
#[derive(Debug, Default)]
pub struct Catalog {
    /// Absolute scan roots actually walked, in argument order
    pub roots: Vec<PathBuf>,
    /// Every directory, keyed by absolute path
    pub dirs: BTreeMap<PathBuf, DirRecord>,
    /// Every regular file, keyed by absolute path
    pub files: BTreeMap<PathBuf, FileRecord>,
    /// Direct child files of each directory
    pub children: HashMap<PathBuf, Vec<PathBuf>>,
    /// Entries that could not be read during the walk
    pub errors: Vec<ScanError>,
}

impl Catalog {
    /// Walk `roots` and build the catalog.
    ///
    /// A root nested inside another root is skipped, since its entries are
    /// already reached through the outer one. Symbolic links are skipped
    /// unless `follow_links` is set.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::NotFound`] or [`ScanError::NotADirectory`] for a
    /// bad root. Failures below a root are collected in [`Catalog::errors`].
    pub fn collect(roots: &[PathBuf], follow_links: bool) -> Result<Self, ScanError> {
        let roots = resolve_roots(roots)?;
        let mut catalog = Self {
            roots: roots.clone(),
            ..Self::default()
        };
        let mut seq = 0usize;

        for root in &roots {
            let (dirs_before, files_before) = (catalog.dirs.len(), catalog.files.len());
            catalog.walk_root(root, follow_links, &mut seq);
            log::info!(
                "Collected {} directories and {} files under {}",
                catalog.dirs.len() - dirs_before,
                catalog.files.len() - files_before,
                root.display()
            );
        }

        catalog.fold_totals();
        catalog.index_children();
        Ok(catalog)
    }

    fn walk_root(&mut self, root: &Path, follow_links: bool, seq: &mut usize) {
        let walker = WalkDir::new(root)
            .follow_links(follow_links)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf);
                    log::warn!("Walker error for {}: {}", path.display(), e);
                    let source = e
                        .into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("filesystem loop detected"));
                    self.errors.push(ScanError::from_io(path, source));
                    continue;
                }
            };

            if entry.depth() > 0 && entry.path_is_symlink() && !follow_links {
                log::trace!("Skipping symlink: {}", entry.path().display());
                continue;
            }

            let path = entry.path().to_path_buf();
            let metadata = if entry.depth() == 0 {
                std::fs::metadata(&path)
            } else {
                entry.metadata().map_err(|e| {
                    e.into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("metadata unavailable"))
                })
            };
            let metadata = match metadata {
                Ok(m) => m,
                Err(e) => {
                    log::warn!("Cannot stat {}: {}", path.display(), e);
                    self.errors.push(ScanError::from_io(path, e));
                    continue;
                }
            };

            let name = entry.file_name().to_string_lossy().into_owned();
            let node = node_id(&path, &metadata);
            let modified = mtime_secs(&metadata);

            if metadata.is_dir() {
                let parent = if entry.depth() == 0 {
                    None
                } else {
                    path.parent().map(Path::to_path_buf)
                };
                let name = if entry.depth() == 0 && name.is_empty() {
                    path.display().to_string()
                } else {
                    name
                };
                self.dirs.insert(
                    path.clone(),
                    DirRecord {
                        path,
                        parent,
                        name,
                        size: 0,
                        dir_count: 0,
                        file_count: 0,
                        root: root.to_path_buf(),
                        modified,
                        node,
                        seq: *seq,
                        key: String::new(),
                    },
                );
                *seq += 1;
            } else if metadata.is_file() {
                let Some(parent) = path.parent().map(Path::to_path_buf) else {
                    continue;
                };
                self.files.insert(
                    path.clone(),
                    FileRecord {
                        path,
                        parent,
                        name,
                        size: metadata.len(),
                        modified,
                        node,
                        root: root.to_path_buf(),
                        seq: *seq,
                        key: String::new(),
                    },
                );
                *seq += 1;
            } else {
                log::trace!("Skipping special file: {}", path.display());
            }
        }
    }

    /// Fold file sizes and child counts into their directories, deepest first.
    fn fold_totals(&mut self) {
        for file in self.files.values() {
            if let Some(dir) = self.dirs.get_mut(&file.parent) {
                dir.size += file.size;
                dir.file_count += 1;
            }
        }

        let order: Vec<PathBuf> = self.dirs.keys().rev().cloned().collect();
        for path in order {
            let Some((parent, size)) = self
                .dirs
                .get(&path)
                .and_then(|d| d.parent.clone().map(|p| (p, d.size)))
            else {
                continue;
            };
            if let Some(parent_dir) = self.dirs.get_mut(&parent) {
                parent_dir.size += size;
                parent_dir.dir_count += 1;
            }
        }
    }

    fn index_children(&mut self) {
        for file in self.files.values() {
            self.children
                .entry(file.parent.clone())
                .or_default()
                .push(file.path.clone());
        }
    }

    /// Total size of all catalogued files.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.files.values().map(|f| f.size).sum()
    }
}

/// Make roots absolute, validate them and drop roots nested in another root.
fn resolve_roots(roots: &[PathBuf]) -> Result<Vec<PathBuf>, ScanError> {
    let mut absolute = Vec::with_capacity(roots.len());
    for root in roots {
        let path = std::path::absolute(root).map_err(|e| ScanError::from_io(root.clone(), e))?;
        let metadata = std::fs::metadata(&path).map_err(|e| ScanError::from_io(path.clone(), e))?;
        if !metadata.is_dir() {
            return Err(ScanError::NotADirectory(path));
        }
        absolute.push(normalize(&path));
    }

    let mut resolved: Vec<PathBuf> = Vec::with_capacity(absolute.len());
    for (i, root) in absolute.iter().enumerate() {
        let covered = absolute
            .iter()
            .enumerate()
            .any(|(j, other)| j != i && root.starts_with(other) && (root != other || j < i));
        if covered {
            log::warn!(
                "Skipping {}: already covered by another scan root",
                root.display()
            );
            continue;
        }
        resolved.push(root.clone());
    }
    Ok(resolved)
}

/// Drop `.` components and resolve `..` lexically.
fn normalize(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
