//! dupetree - duplicate file and directory finder
//!
//! Finds duplicate files and whole duplicate directory trees across one or
//! more roots with a staged elimination pipeline (metadata, first bytes,
//! last bytes, full BLAKE3 hash), then optionally deletes the extra copies
//! or replaces them with links.

pub mod actions;
pub mod cache;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::actions::{execute_groups, ActionConfig, ActionKind, ActionReport};
use crate::cache::HashCache;
use crate::cli::{Cli, OutputFormat};
use crate::config::{default_cache_path, CacheSettings, Settings};
use crate::duplicates::{DuplicateFinder, Resolution, ScanSummary};
use crate::error::ExitCode;
use crate::output::{write_summary, JsonOutput, TextReport};
use crate::progress::Progress;

/// Run the application for parsed arguments and return the exit code.
///
/// # Errors
///
/// Returns an error for invalid configuration, a bad scan root or a failure
/// to write the report. Everything else is recorded and reflected in the
/// exit code.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let settings = Settings::load(&cli)?;
    log::debug!("Scanning {} root(s)", settings.roots.len());

    let hide_progress = cli.no_progress || cli.quiet || cli.output == OutputFormat::Json;
    let mut finder = DuplicateFinder::new(settings.clone())
        .with_progress_callback(Arc::new(Progress::new(hide_progress)));
    if let Some(cache) = open_cache(&settings.cache) {
        finder = finder.with_cache(cache);
    }

    let (resolution, summary) = finder.find_duplicates()?;

    let mut action_report = None;
    if !cli.brief {
        if let Some(config) = action_config(&cli) {
            let dirs = if cli.no_dirs { &[][..] } else { &resolution.dirs[..] };
            let files = if cli.no_files { &[][..] } else { &resolution.files[..] };
            action_report = Some(execute_groups(dirs, files, &config));
        }
    }

    let exit_code = exit_code_for(&summary, action_report.as_ref());
    write_report(&cli, &resolution, &summary, exit_code)?;
    Ok(exit_code)
}

/// Pick the exit code once the search (and any actions) finished.
#[must_use]
pub fn exit_code_for(summary: &ScanSummary, actions: Option<&ActionReport>) -> ExitCode {
    let action_failed = actions.is_some_and(|r| !r.all_succeeded());
    if summary.has_errors() || action_failed {
        ExitCode::PartialSuccess
    } else if summary.has_duplicates() {
        ExitCode::Success
    } else {
        ExitCode::NoDuplicates
    }
}

fn action_config(cli: &Cli) -> Option<ActionConfig> {
    let kind = if cli.symlink {
        ActionKind::Symlink
    } else if cli.hardlink {
        ActionKind::Hardlink
    } else if cli.delete {
        ActionKind::Delete
    } else {
        return None;
    };
    Some(
        ActionConfig::new(kind)
            .with_trash(cli.trash)
            .with_dry_run(cli.dry_run),
    )
}

fn open_cache(settings: &CacheSettings) -> Option<Arc<HashCache>> {
    if !settings.enabled {
        return None;
    }
    let Some(path) = settings.path.clone().or_else(default_cache_path) else {
        log::warn!("No cache location available, hashing without a cache");
        return None;
    };
    let cache = HashCache::open_or_recover(&path)?;
    if settings.reset {
        match cache.clear() {
            Ok(()) => log::info!("Cleared hash cache at {}", path.display()),
            Err(e) => log::warn!("Could not clear hash cache: {}", e),
        }
    }
    log::debug!("Using hash cache at {}", path.display());
    Some(Arc::new(cache))
}

fn write_report(
    cli: &Cli,
    resolution: &Resolution,
    summary: &ScanSummary,
    exit_code: ExitCode,
) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.output {
        OutputFormat::Json => {
            let mut json = JsonOutput::new(resolution, summary, exit_code, cli.relative_paths);
            if cli.brief || cli.no_dirs {
                json = json.without_directories();
            }
            if cli.brief || cli.no_files {
                json = json.without_files();
            }
            json.write_to(&mut out).context("failed to write JSON report")?;
        }
        OutputFormat::Text => {
            if !cli.brief {
                TextReport::new(resolution)
                    .with_relative_paths(cli.relative_paths)
                    .with_dirs(!cli.no_dirs)
                    .with_files(!cli.no_files)
                    .write_to(&mut out)
                    .context("failed to write report")?;
            }
            write_summary(&mut out, summary).context("failed to write summary")?;
        }
    }
    out.flush().context("failed to flush output")?;
    Ok(())
}
