//! Filters applied to the working set before the first stage.
//!
//! None of these unwind ancestors: a directory dropped here only takes its
//! direct child files with it, and only in dirs-only mode.

use std::path::PathBuf;

use crate::config::Settings;

use super::records::WorkingSet;

/// How many records each filter removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterReport {
    /// Directories with a cumulative size of zero
    pub empty_dirs: usize,
    /// Zero-byte files
    pub empty_files: usize,
    /// Files outside the size bounds (files-only mode)
    pub out_of_range: usize,
    /// Directories matching an exclude pattern
    pub excluded_dirs: usize,
    /// Files matching an exclude pattern
    pub excluded_files: usize,
}

impl FilterReport {
    /// Total number of records removed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.empty_dirs + self.empty_files + self.out_of_range + self.excluded_dirs + self.excluded_files
    }
}

/// Run the empty, size and exclude filters in that order.
pub fn apply_prefilters(ws: &mut WorkingSet, settings: &Settings) -> FilterReport {
    let mut report = FilterReport::default();
    let track_dirs = ws.scope().track_dirs;

    if track_dirs && !settings.include_empty_dirs {
        let empty: Vec<PathBuf> = ws
            .dirs
            .values()
            .filter(|d| d.size == 0)
            .map(|d| d.path.clone())
            .collect();
        for path in &empty {
            ws.remove_dir(path);
        }
        report.empty_dirs = empty.len();
    }

    if !settings.include_empty_files {
        let before = ws.files.len();
        ws.files.retain(|_, f| f.size > 0);
        report.empty_files = before - ws.files.len();
    }

    if settings.files_only && settings.file_size.is_bounded() {
        let before = ws.files.len();
        ws.files.retain(|_, f| settings.file_size.contains(f.size));
        report.out_of_range = before - ws.files.len();
    }

    if track_dirs && !settings.exclude_dirs.is_empty() {
        let excluded: Vec<PathBuf> = ws
            .dirs
            .keys()
            .filter(|p| matches_any(&settings.exclude_dirs, p))
            .cloned()
            .collect();
        for path in &excluded {
            log::debug!("Excluding directory {}", path.display());
            ws.remove_dir(path);
        }
        report.excluded_dirs = excluded.len();
    }

    if !settings.exclude_files.is_empty() {
        let before = ws.files.len();
        ws.files
            .retain(|path, _| !matches_any(&settings.exclude_files, path));
        report.excluded_files = before - ws.files.len();
    }

    if report.total() > 0 {
        log::info!(
            "Filtered out {} dirs and {} files before comparison",
            report.empty_dirs + report.excluded_dirs,
            report.empty_files + report.out_of_range + report.excluded_files
        );
    }
    report
}

fn matches_any(patterns: &[glob::Pattern], path: &std::path::Path) -> bool {
    let text = path.to_string_lossy();
    patterns.iter().any(|p| p.matches(&text))
}
