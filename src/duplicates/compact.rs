//! Directory group compaction.
//!
//! A duplicate directory makes everything below it a duplicate too. A group
//! whose members all sit in parents sharing one fingerprint is already
//! covered by the parents' group and is dropped. A group whose parents
//! differ (or are no longer tracked) is kept, and the groups of those
//! parents are dropped instead.

use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;

use super::records::WorkingSet;

/// Compact `groups` against the fingerprints in `ws`.
///
/// Removals are decided over the whole input before any is applied, so the
/// result does not depend on group order.
#[must_use]
pub fn compact_dir_groups(groups: Vec<Vec<PathBuf>>, ws: &WorkingSet) -> Vec<Vec<PathBuf>> {
    let mut drop_keys: HashSet<String> = HashSet::new();

    for members in &groups {
        let Some(group_key) = group_key(members, ws) else {
            continue;
        };

        let parent_keys: Vec<Option<&str>> = members
            .iter()
            .map(|m| {
                ws.dirs
                    .get(m)
                    .and_then(|d| d.parent.as_ref())
                    .and_then(|p| ws.dirs.get(p))
                    .map(|p| p.key.as_str())
            })
            .collect();
        let distinct: BTreeSet<&str> = parent_keys.iter().flatten().copied().collect();

        if parent_keys.iter().all(Option::is_some) && distinct.len() == 1 {
            log::debug!("Directory group {} is covered by its parents", group_key);
            drop_keys.insert(group_key.to_string());
        } else {
            drop_keys.extend(distinct.into_iter().map(str::to_string));
        }
    }

    let before = groups.len();
    let kept: Vec<Vec<PathBuf>> = groups
        .into_iter()
        .filter(|members| group_key(members, ws).map_or(true, |k| !drop_keys.contains(k)))
        .collect();
    log::debug!("Compacted {} directory groups into {}", before, kept.len());
    kept
}

fn group_key<'a>(members: &[PathBuf], ws: &'a WorkingSet) -> Option<&'a str> {
    members
        .iter()
        .find_map(|m| ws.dirs.get(m))
        .map(|d| d.key.as_str())
}
