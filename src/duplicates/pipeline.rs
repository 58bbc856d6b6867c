//! The elimination pipeline.
//!
//! # Overview
//!
//! Every stage appends a discriminator to each file's key, groups files by
//! key and discards the ones that ended up alone. A discarded file takes its
//! parent directory chain with it. Files that survive push their key into
//! their parent directory, so the directory fingerprint reflects exactly
//! which files it still holds.
//!
//! Content digests of a stage are computed on a bounded rayon pool; all
//! results are merged before any grouping happens.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use serde::Serialize;

use crate::config::Criteria;
use crate::progress::ProgressCallback;
use crate::scanner::{FileRecord, HashError, HashProvider, ScanError};

use super::records::{compact_key, fold_child_keys, ChildKind, WorkingSet};
use super::stages::{dir_metadata_key, file_metadata_key, Stage};

/// Everything a stage needs besides the working set.
pub struct StageContext<'a> {
    /// Comparison criteria
    pub criteria: &'a Criteria,
    /// Chunk size for prefix and suffix windows
    pub chunk: u64,
    /// Digest source
    pub provider: &'a HashProvider,
    /// Pool for content digests; `None` hashes on the calling thread
    pub pool: Option<&'a rayon::ThreadPool>,
    /// Optional progress sink
    pub progress: Option<&'a dyn ProgressCallback>,
}

/// Counters for one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageStats {
    /// Which stage
    pub stage: Stage,
    /// Files before the stage
    pub files_in: usize,
    /// Files after the stage
    pub files_out: usize,
    /// Directories before the stage
    pub dirs_in: usize,
    /// Directories after the stage
    pub dirs_out: usize,
    /// Digests served from the cache
    pub cache_hits: usize,
    /// Digests computed from file content
    pub cache_misses: usize,
    /// Files dropped because they could not be read
    pub failures: usize,
}

impl StageStats {
    fn new(stage: Stage, ws: &WorkingSet) -> Self {
        Self {
            stage,
            files_in: ws.files.len(),
            files_out: ws.files.len(),
            dirs_in: ws.dirs.len(),
            dirs_out: ws.dirs.len(),
            cache_hits: 0,
            cache_misses: 0,
            failures: 0,
        }
    }

    /// Files eliminated by the stage.
    #[must_use]
    pub fn files_eliminated(&self) -> usize {
        self.files_in - self.files_out
    }

    /// Directories eliminated by the stage.
    #[must_use]
    pub fn dirs_eliminated(&self) -> usize {
        self.dirs_in - self.dirs_out
    }
}

/// Result of one stage.
#[derive(Debug)]
pub struct StageOutcome {
    /// The reduced working set
    pub working_set: WorkingSet,
    /// Stage counters
    pub stats: StageStats,
    /// Files that could not be read
    pub errors: Vec<ScanError>,
}

enum Discriminator {
    Absent,
    Value { text: String, cached: bool },
    Failed(HashError),
}

/// Run one stage over `ws` and return the reduced set.
#[must_use]
pub fn run_stage(mut ws: WorkingSet, stage: Stage, ctx: &StageContext<'_>) -> StageOutcome {
    let mut stats = StageStats::new(stage, &ws);
    let mut errors = Vec::new();
    log::info!("Eliminating candidates by {}...", stage);

    if ws.scope().track_dirs {
        for dir in ws.dirs.values_mut() {
            dir.key = dir_metadata_key(dir, ctx.criteria);
        }
    }

    let discriminators = compute_discriminators(&ws, stage, ctx);
    for (path, discriminator) in discriminators {
        match discriminator {
            Discriminator::Absent => {}
            Discriminator::Value { text, cached } => {
                if stage.reads_content() {
                    if cached {
                        stats.cache_hits += 1;
                    } else {
                        stats.cache_misses += 1;
                    }
                }
                if let Some(file) = ws.files.get_mut(&path) {
                    let mut key = std::mem::take(&mut file.key);
                    key.push_str(&text);
                    file.key = compact_key(key);
                }
            }
            Discriminator::Failed(e) => {
                log::warn!("Dropping unreadable file {}: {}", path.display(), e);
                stats.failures += 1;
                ws.eliminate_file(&path);
                errors.push(ScanError::from(e));
            }
        }
    }

    let mut groups: HashMap<String, Vec<PathBuf>> = HashMap::new();
    for file in ws.files.values() {
        groups.entry(file.key.clone()).or_default().push(file.path.clone());
    }

    let mut survivors = Vec::new();
    for (key, paths) in groups {
        if let [unique] = paths.as_slice() {
            log::trace!("Unique after {}: {}", stage, unique.display());
            ws.eliminate_file(unique);
        } else {
            survivors.push((key, paths));
        }
    }

    if ws.scope().track_dirs {
        propagate_file_keys(&mut ws, &survivors);
    }

    stats.files_out = ws.files.len();
    stats.dirs_out = ws.dirs.len();
    log::info!(
        "{} dirs and {} files removed, {} dirs and {} files left",
        stats.dirs_eliminated(),
        stats.files_eliminated(),
        stats.dirs_out,
        stats.files_out
    );

    StageOutcome {
        working_set: ws,
        stats,
        errors,
    }
}

/// Run `stages` in order, threading the working set through each.
#[must_use]
pub fn run_pipeline(ws: WorkingSet, stages: &[Stage], ctx: &StageContext<'_>) -> PipelineOutcome {
    let mut outcome = PipelineOutcome {
        working_set: ws,
        stats: Vec::with_capacity(stages.len()),
        errors: Vec::new(),
    };
    for &stage in stages {
        let StageOutcome {
            working_set,
            stats,
            errors,
        } = run_stage(outcome.working_set, stage, ctx);
        outcome.working_set = working_set;
        outcome.stats.push(stats);
        outcome.errors.extend(errors);
    }
    outcome
}

/// Result of all stages.
#[derive(Debug)]
pub struct PipelineOutcome {
    /// The converged working set
    pub working_set: WorkingSet,
    /// Counters per executed stage
    pub stats: Vec<StageStats>,
    /// Files that could not be read
    pub errors: Vec<ScanError>,
}

/// Group the remaining files by key, keeping groups of two or more.
///
/// Members are in catalog order; groups are ordered by their first member.
#[must_use]
pub fn group_files(ws: &WorkingSet) -> Vec<Vec<PathBuf>> {
    let mut groups: HashMap<&str, Vec<&FileRecord>> = HashMap::new();
    for file in ws.files.values() {
        groups.entry(file.key.as_str()).or_default().push(file);
    }
    let mut groups: Vec<Vec<&FileRecord>> =
        groups.into_values().filter(|g| g.len() > 1).collect();
    for group in &mut groups {
        group.sort_by_key(|f| f.seq);
    }
    groups.sort_by_key(|g| g[0].seq);
    groups
        .into_iter()
        .map(|g| g.into_iter().map(|f| f.path.clone()).collect())
        .collect()
}

fn compute_discriminators(
    ws: &WorkingSet,
    stage: Stage,
    ctx: &StageContext<'_>,
) -> Vec<(PathBuf, Discriminator)> {
    if !stage.reads_content() {
        return ws
            .files
            .values()
            .map(|file| {
                let text = file_metadata_key(file, ctx.criteria);
                (file.path.clone(), Discriminator::Value { text, cached: false })
            })
            .collect();
    }

    let files: Vec<&FileRecord> = ws.files.values().collect();
    let done = AtomicUsize::new(0);
    if let Some(progress) = ctx.progress {
        progress.on_phase_start(stage.name(), files.len());
    }

    let digest_one = |file: &&FileRecord| {
        let discriminator = match stage.window(file.size, ctx.chunk) {
            None => Discriminator::Absent,
            Some(range) => match ctx.provider.digest(&file.node, &file.path, range) {
                Ok(digest) => Discriminator::Value {
                    text: digest.hex,
                    cached: digest.cached,
                },
                Err(e) => Discriminator::Failed(e),
            },
        };
        if let Some(progress) = ctx.progress {
            let current = done.fetch_add(1, Ordering::Relaxed) + 1;
            progress.on_progress(current, &file.path.to_string_lossy());
        }
        (file.path.clone(), discriminator)
    };

    let results: Vec<(PathBuf, Discriminator)> = match ctx.pool {
        Some(pool) => pool.install(|| files.par_iter().map(digest_one).collect()),
        None => files.iter().map(digest_one).collect(),
    };

    if let Some(progress) = ctx.progress {
        progress.on_phase_end(stage.name());
    }
    results
}

/// Append each surviving file's key to its parent directory, sorted per
/// parent so the result does not depend on grouping order.
fn propagate_file_keys(ws: &mut WorkingSet, survivors: &[(String, Vec<PathBuf>)]) {
    let mut per_dir: BTreeMap<PathBuf, Vec<&str>> = BTreeMap::new();
    for (key, paths) in survivors {
        for path in paths {
            let Some(file) = ws.files.get(path) else {
                continue;
            };
            if ws.dirs.contains_key(&file.parent) {
                per_dir.entry(file.parent.clone()).or_default().push(key);
            }
        }
    }

    for (dir_path, keys) in per_dir {
        if let Some(dir) = ws.dirs.get_mut(&dir_path) {
            let key = std::mem::take(&mut dir.key);
            dir.key = fold_child_keys(key, ChildKind::File, keys);
        }
    }
}
