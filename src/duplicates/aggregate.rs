//! Bottom-up directory fingerprints.
//!
//! Runs once after the file stages converge. Each directory folds the keys
//! of its surviving child directories into its own key; children are always
//! finished before their parent because the directories are visited in
//! reverse path order.

use std::collections::HashMap;
use std::path::PathBuf;

use super::records::{fold_child_keys, ChildKind, WorkingSet};

/// Fold child directory keys into their parents, then drop every directory
/// whose final key is unique.
///
/// Returns the duplicate directory groups: members in catalog order, groups
/// ordered by their first member.
pub fn aggregate_dirs(ws: &mut WorkingSet) -> Vec<Vec<PathBuf>> {
    let order: Vec<PathBuf> = ws.dirs.keys().rev().cloned().collect();
    let mut child_keys: HashMap<PathBuf, Vec<String>> = HashMap::new();

    for path in &order {
        let Some(dir) = ws.dirs.get_mut(path) else {
            continue;
        };
        if let Some(keys) = child_keys.remove(path) {
            let key = std::mem::take(&mut dir.key);
            dir.key = fold_child_keys(key, ChildKind::Dir, keys.iter().map(String::as_str));
        }
        if let Some(parent) = &dir.parent {
            child_keys
                .entry(parent.clone())
                .or_default()
                .push(dir.key.clone());
        }
    }

    let mut by_key: HashMap<&str, Vec<(usize, &PathBuf)>> = HashMap::new();
    for dir in ws.dirs.values() {
        by_key
            .entry(dir.key.as_str())
            .or_default()
            .push((dir.seq, &dir.path));
    }

    let mut unique = Vec::new();
    let mut groups = Vec::new();
    for (_, mut members) in by_key {
        if members.len() == 1 {
            unique.push(members[0].1.clone());
        } else {
            members.sort_by_key(|(seq, _)| *seq);
            groups.push(members);
        }
    }
    groups.sort_by_key(|g| g[0].0);
    let groups: Vec<Vec<PathBuf>> = groups
        .into_iter()
        .map(|g| g.into_iter().map(|(_, p)| p.clone()).collect())
        .collect();

    for path in &unique {
        log::trace!("Unique directory: {}", path.display());
        ws.remove_dir(path);
    }
    log::info!(
        "Directory fingerprints: {} unique, {} duplicate groups",
        unique.len(),
        groups.len()
    );
    groups
}
