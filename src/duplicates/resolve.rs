//! Group resolution: filtering, compaction and canonical selection.

use std::path::PathBuf;

use crate::config::{Settings, SizeRange};

use super::compact::compact_dir_groups;
use super::groups::{DuplicateGroup, GroupKind, GroupMember};
use super::records::WorkingSet;

/// Final directory and file groups, each ordered by canonical member.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Directory groups
    pub dirs: Vec<DuplicateGroup>,
    /// File groups
    pub files: Vec<DuplicateGroup>,
}

/// Turn raw path groups into reportable [`DuplicateGroup`]s.
///
/// Members no longer in `ws` are skipped; a group left with fewer than two
/// members is dropped. File groups are not resolved in dirs-only mode.
#[must_use]
pub fn resolve_groups(
    ws: &WorkingSet,
    dir_groups: Vec<Vec<PathBuf>>,
    file_groups: Vec<Vec<PathBuf>>,
    settings: &Settings,
) -> Resolution {
    let mut dir_groups: Vec<Vec<PathBuf>> = dir_groups
        .into_iter()
        .map(|g| g.into_iter().filter(|p| ws.dirs.contains_key(p)).collect())
        .filter(|g: &Vec<PathBuf>| g.len() > 1)
        .filter(|g| meets_count(g.len(), settings.dups_dirs_count))
        .filter(|g| within(&settings.dir_size, ws.dirs.get(&g[0]).map(|d| d.size)))
        .collect();
    if !settings.no_combine_dirs {
        dir_groups = compact_dir_groups(dir_groups, ws);
    }
    let dirs = dir_groups
        .iter()
        .filter_map(|g| build_dir_group(ws, g))
        .collect();

    let mut files: Vec<DuplicateGroup> = if settings.dirs_only {
        Vec::new()
    } else {
        file_groups
            .into_iter()
            .map(|g| g.into_iter().filter(|p| ws.files.contains_key(p)).collect())
            .filter(|g: &Vec<PathBuf>| g.len() > 1)
            .filter(|g| meets_count(g.len(), settings.dups_files_count))
            .filter(|g| within(&settings.file_size, ws.files.get(&g[0]).map(|f| f.size)))
            .filter_map(|g| build_file_group(ws, &g, settings.combine_files()))
            .collect()
    };
    files.sort_by_key(|g| g.members.first().map_or(usize::MAX, |m| m.seq));

    log::debug!(
        "Resolved {} directory groups and {} file groups",
        dir_groups.len(),
        files.len()
    );
    Resolution { dirs, files }
}

fn meets_count(len: usize, min: Option<usize>) -> bool {
    min.map_or(true, |min| len >= min)
}

fn within(range: &SizeRange, size: Option<u64>) -> bool {
    size.is_some_and(|s| range.contains(s))
}

fn build_dir_group(ws: &WorkingSet, paths: &[PathBuf]) -> Option<DuplicateGroup> {
    let records: Vec<_> = paths.iter().filter_map(|p| ws.dirs.get(p)).collect();
    let first = records.first()?;
    Some(DuplicateGroup {
        kind: GroupKind::Directory,
        key: first.key.clone(),
        size: first.size,
        modified: first.modified,
        dir_count: Some(first.dir_count),
        file_count: Some(first.file_count),
        members: records
            .iter()
            .enumerate()
            .map(|(i, d)| GroupMember {
                path: d.path.clone(),
                root: d.root.clone(),
                seq: d.seq,
                node: d.node.clone(),
                canonical: i == 0,
                in_directory_scope: d
                    .parent
                    .as_ref()
                    .is_some_and(|p| ws.dirs.contains_key(p)),
            })
            .collect(),
    })
}

/// Partition into members inside a duplicate directory and free-standing
/// ones. Prefer an in-directory canonical; with `combine` set, a group with
/// no free-standing member is covered by a directory group and dropped.
fn build_file_group(ws: &WorkingSet, paths: &[PathBuf], combine: bool) -> Option<DuplicateGroup> {
    let (in_scope, free): (Vec<_>, Vec<_>) = paths
        .iter()
        .filter_map(|p| ws.files.get(p))
        .partition(|f| ws.dirs.contains_key(&f.parent));

    if combine && free.is_empty() {
        log::trace!("File group covered by directory duplicates: {}", paths[0].display());
        return None;
    }

    let representative = in_scope.first().or_else(|| free.first())?;
    let members = in_scope
        .iter()
        .map(|f| (f, true))
        .chain(free.iter().map(|f| (f, false)))
        .enumerate()
        .map(|(i, (f, scoped))| GroupMember {
            path: f.path.clone(),
            root: f.root.clone(),
            seq: f.seq,
            node: f.node.clone(),
            canonical: i == 0,
            in_directory_scope: scoped,
        })
        .collect();

    Some(DuplicateGroup {
        kind: GroupKind::File,
        key: representative.key.clone(),
        size: representative.size,
        modified: representative.modified,
        dir_count: None,
        file_count: None,
        members,
    })
}
