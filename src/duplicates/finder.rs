//! Duplicate finder orchestration.
//!
//! # Overview
//!
//! [`DuplicateFinder`] runs one complete search:
//!
//! 1. **Catalog** - walk every root into file and directory records
//! 2. **Filters** - drop empty, out-of-range and excluded records
//! 3. **Stages** - metadata, first bytes, last bytes, full hash
//! 4. **Aggregate** - fold directory fingerprints bottom-up
//! 5. **Resolve** - filter, compact and pick canonical copies
//!
//! The finder never mutates the filesystem; see [`crate::actions`] for that.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::cache::HashCache;
use crate::config::{ConfigError, Settings};
use crate::progress::{ProgressCallback, PHASE_CATALOG};
use crate::scanner::{Catalog, HashProvider, Hasher, ScanError};

use super::aggregate::aggregate_dirs;
use super::pipeline::{group_files, run_pipeline, StageContext, StageStats};
use super::prefilter::{apply_prefilters, FilterReport};
use super::records::{Scope, WorkingSet};
use super::resolve::{resolve_groups, Resolution};
use super::stages::Stage;

/// Statistics from one search.
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// Files catalogued
    pub total_files: usize,
    /// Directories catalogued
    pub total_dirs: usize,
    /// Bytes catalogued
    pub total_size: u64,
    /// Records dropped by the filters
    pub filtered: FilterReport,
    /// Counters per executed stage
    pub stages: Vec<StageStats>,
    /// Directories dropped by the fingerprint aggregation
    pub unique_dirs: usize,
    /// Reported directory groups
    pub dir_groups: usize,
    /// Reported file groups
    pub file_groups: usize,
    /// Actionable directories across all directory groups
    pub duplicate_dirs: usize,
    /// Actionable files across all file groups
    pub duplicate_files: usize,
    /// Bytes freed by acting on every actionable member
    pub reclaimable_space: u64,
    /// Wall time of the search
    pub scan_duration: Duration,
    /// Non-fatal errors, in the order they happened
    pub scan_errors: Vec<ScanError>,
}

impl ScanSummary {
    /// Whether any group was reported.
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        self.dir_groups + self.file_groups > 0
    }

    /// Whether any non-fatal error was recorded.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.scan_errors.is_empty()
    }

    /// Digests served from the cache across all stages.
    #[must_use]
    pub fn cache_hits(&self) -> usize {
        self.stages.iter().map(|s| s.cache_hits).sum()
    }

    /// Digests computed from content across all stages.
    #[must_use]
    pub fn cache_misses(&self) -> usize {
        self.stages.iter().map(|s| s.cache_misses).sum()
    }

    /// Share of the catalogued bytes held by actionable duplicates.
    #[must_use]
    pub fn wasted_percentage(&self) -> f64 {
        if self.total_size == 0 {
            0.0
        } else {
            (self.reclaimable_space as f64 / self.total_size as f64) * 100.0
        }
    }
}

/// Errors that end a search.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// A scan root does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// A scan root is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The run configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The catalog could not be built.
    #[error(transparent)]
    Scan(#[from] ScanError),
}

/// Runs the duplicate search for one [`Settings`] value.
///
/// # Example
///
/// ```no_run
/// use dupetree::config::Settings;
/// use dupetree::duplicates::DuplicateFinder;
/// use std::path::PathBuf;
///
/// let settings = Settings {
///     roots: vec![PathBuf::from("/some/path")],
///     ..Settings::default()
/// };
/// let (resolution, summary) = DuplicateFinder::new(settings).find_duplicates().unwrap();
/// println!("{} directory groups, {} file groups", resolution.dirs.len(), resolution.files.len());
/// println!("Reclaimable: {} bytes", summary.reclaimable_space);
/// ```
pub struct DuplicateFinder {
    settings: Settings,
    cache: Option<Arc<HashCache>>,
    progress: Option<Arc<dyn ProgressCallback>>,
}

impl DuplicateFinder {
    /// Create a finder without cache or progress reporting.
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            cache: None,
            progress: None,
        }
    }

    /// Use a persistent digest cache.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<HashCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Report progress through `callback`.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = Some(callback);
        self
    }

    /// The settings this finder runs with.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Catalog the configured roots and search them.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::PathNotFound`] or [`FinderError::NotADirectory`]
    /// for a bad root. Unreadable entries below a root are not errors; they
    /// end up in [`ScanSummary::scan_errors`].
    pub fn find_duplicates(&self) -> Result<(Resolution, ScanSummary), FinderError> {
        let start = Instant::now();
        if let Some(progress) = &self.progress {
            progress.on_phase_start(PHASE_CATALOG, 0);
        }
        let catalog = Catalog::collect(&self.settings.roots, self.settings.follow_links);
        if let Some(progress) = &self.progress {
            progress.on_phase_end(PHASE_CATALOG);
        }
        let catalog = catalog.map_err(|e| match e {
            ScanError::NotFound(path) => FinderError::PathNotFound(path),
            ScanError::NotADirectory(path) => FinderError::NotADirectory(path),
            other => FinderError::Scan(other),
        })?;

        let (resolution, mut summary) = self.find_in_catalog(catalog);
        summary.scan_duration = start.elapsed();
        Ok((resolution, summary))
    }

    /// Search an already collected catalog.
    #[must_use]
    pub fn find_in_catalog(&self, mut catalog: Catalog) -> (Resolution, ScanSummary) {
        let start = Instant::now();
        let settings = &self.settings;
        let mut summary = ScanSummary {
            total_files: catalog.files.len(),
            total_dirs: catalog.dirs.len(),
            total_size: catalog.total_size(),
            scan_errors: std::mem::take(&mut catalog.errors),
            ..ScanSummary::default()
        };
        log::info!(
            "Catalogued {} directories and {} files",
            summary.total_dirs,
            summary.total_files
        );

        let scope = Scope::from_settings(settings);
        let mut ws = WorkingSet::from_catalog(catalog, scope);
        summary.filtered = apply_prefilters(&mut ws, settings);

        let mut provider = HashProvider::new(Hasher::new());
        if let Some(cache) = &self.cache {
            provider = provider.with_cache(Arc::clone(cache));
        }
        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(settings.io_threads)
            .build()
        {
            Ok(pool) => Some(pool),
            Err(e) => {
                log::warn!("Hashing on one thread, pool unavailable: {}", e);
                None
            }
        };
        let ctx = StageContext {
            criteria: &settings.criteria,
            chunk: settings.chunk,
            provider: &provider,
            pool: pool.as_ref(),
            progress: self.progress.as_deref(),
        };

        let stages = Stage::enabled(&settings.criteria);
        log::debug!(
            "Criteria: {} ({} stages)",
            settings.criteria,
            stages.len()
        );
        let outcome = run_pipeline(ws, &stages, &ctx);
        let mut ws = outcome.working_set;
        summary.stages = outcome.stats;
        summary.scan_errors.extend(outcome.errors);

        let dir_groups = if scope.track_dirs {
            let before = ws.dirs.len();
            let groups = aggregate_dirs(&mut ws);
            summary.unique_dirs = before - ws.dirs.len();
            groups
        } else {
            Vec::new()
        };
        let file_groups = group_files(&ws);

        let resolution = resolve_groups(&ws, dir_groups, file_groups, settings);
        summary.dir_groups = resolution.dirs.len();
        summary.file_groups = resolution.files.len();
        summary.duplicate_dirs = resolution.dirs.iter().map(|g| g.len() - 1).sum();
        summary.duplicate_files = resolution.files.iter().map(|g| g.len() - 1).sum();
        summary.reclaimable_space = resolution
            .dirs
            .iter()
            .chain(&resolution.files)
            .map(|g| g.reclaimable())
            .sum();
        summary.scan_duration = start.elapsed();

        if self.cache.is_some() {
            log::debug!(
                "Cache: {} hits, {} misses",
                summary.cache_hits(),
                summary.cache_misses()
            );
        }
        log::info!(
            "Found {} directory groups and {} file groups",
            summary.dir_groups,
            summary.file_groups
        );
        (resolution, summary)
    }
}
