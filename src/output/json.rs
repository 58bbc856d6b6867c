//! JSON output formatter for search results.
//!
//! Provides machine-readable JSON output for scripting and automation.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "directories": [
//!     {
//!       "size": 1024,
//!       "date": "2024-03-01 10:15:00",
//!       "modified": 1709288100,
//!       "dir_count": 0,
//!       "file_count": 1,
//!       "items": 2,
//!       "members": [
//!         { "path": "/a", "display": "/a", "canonical": true, "in_directory_scope": false }
//!       ]
//!     }
//!   ],
//!   "files": [],
//!   "summary": {
//!     "total_files": 100,
//!     "dir_groups": 1,
//!     "file_groups": 0,
//!     "reclaimable_space": 1024,
//!     "exit_code": 0
//!   }
//! }
//! ```

use std::io::Write;

use serde::Serialize;

use crate::duplicates::{DuplicateGroup, Resolution, ScanSummary, StageStats};
use crate::error::ExitCode;

use super::format_date;

/// One group member in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonMember {
    /// Absolute path
    pub path: String,
    /// Path as shown to the user (absolute or root-relative)
    pub display: String,
    /// The kept copy
    pub canonical: bool,
    /// Parent directory is itself a duplicate
    pub in_directory_scope: bool,
}

/// One duplicate group in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonGroup {
    /// Representative size in bytes
    pub size: u64,
    /// Representative modification time, formatted
    pub date: String,
    /// Representative modification time in seconds since the Unix epoch
    pub modified: i64,
    /// Direct child directories (directory groups only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir_count: Option<usize>,
    /// Direct child files (directory groups only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_count: Option<usize>,
    /// Number of members
    pub items: usize,
    /// Members, canonical first
    pub members: Vec<JsonMember>,
}

impl JsonGroup {
    /// Convert a [`DuplicateGroup`].
    #[must_use]
    pub fn from_group(group: &DuplicateGroup, relative: bool) -> Self {
        Self {
            size: group.size,
            date: format_date(group.modified),
            modified: group.modified,
            dir_count: group.dir_count,
            file_count: group.file_count,
            items: group.len(),
            members: group
                .members
                .iter()
                .map(|m| JsonMember {
                    path: m.path.to_string_lossy().into_owned(),
                    display: if relative {
                        m.relative_path().to_string_lossy().into_owned()
                    } else {
                        m.path.to_string_lossy().into_owned()
                    },
                    canonical: m.canonical,
                    in_directory_scope: m.in_directory_scope,
                })
                .collect(),
        }
    }
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Files catalogued
    pub total_files: usize,
    /// Directories catalogued
    pub total_dirs: usize,
    /// Bytes catalogued
    pub total_size: u64,
    /// Records removed by the pre-comparison filters
    pub filtered: usize,
    /// Per-stage counters
    pub stages: Vec<StageStats>,
    /// Directory groups reported
    pub dir_groups: usize,
    /// File groups reported
    pub file_groups: usize,
    /// Actionable directories
    pub duplicate_dirs: usize,
    /// Actionable files
    pub duplicate_files: usize,
    /// Bytes freed by acting on every actionable member
    pub reclaimable_space: u64,
    /// Duration of the search in milliseconds
    pub scan_duration_ms: u64,
    /// Non-fatal errors
    pub errors: Vec<String>,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "DT000")
    pub exit_code_name: String,
}

impl JsonSummary {
    /// Create a JSON summary from a [`ScanSummary`] and an exit code.
    #[must_use]
    pub fn from_scan_summary(summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            total_files: summary.total_files,
            total_dirs: summary.total_dirs,
            total_size: summary.total_size,
            filtered: summary.filtered.total(),
            stages: summary.stages.clone(),
            dir_groups: summary.dir_groups,
            file_groups: summary.file_groups,
            duplicate_dirs: summary.duplicate_dirs,
            duplicate_files: summary.duplicate_files,
            reclaimable_space: summary.reclaimable_space,
            scan_duration_ms: u64::try_from(summary.scan_duration.as_millis()).unwrap_or(u64::MAX),
            errors: summary.scan_errors.iter().map(ToString::to_string).collect(),
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Directory groups
    pub directories: Vec<JsonGroup>,
    /// File groups
    pub files: Vec<JsonGroup>,
    /// Run summary
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Build the document.
    ///
    /// # Example
    ///
    /// ```
    /// use dupetree::duplicates::{Resolution, ScanSummary};
    /// use dupetree::error::ExitCode;
    /// use dupetree::output::json::JsonOutput;
    ///
    /// let output = JsonOutput::new(&Resolution::default(), &ScanSummary::default(), ExitCode::NoDuplicates, false);
    /// assert!(output.directories.is_empty());
    /// assert_eq!(output.summary.exit_code, 2);
    /// ```
    #[must_use]
    pub fn new(
        resolution: &Resolution,
        summary: &ScanSummary,
        exit_code: ExitCode,
        relative: bool,
    ) -> Self {
        Self {
            directories: resolution
                .dirs
                .iter()
                .map(|g| JsonGroup::from_group(g, relative))
                .collect(),
            files: resolution
                .files
                .iter()
                .map(|g| JsonGroup::from_group(g, relative))
                .collect(),
            summary: JsonSummary::from_scan_summary(summary, exit_code),
        }
    }

    /// Drop the directory section.
    #[must_use]
    pub fn without_directories(mut self) -> Self {
        self.directories.clear();
        self
    }

    /// Drop the file section.
    #[must_use]
    pub fn without_files(mut self) -> Self {
        self.files.clear();
        self
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write pretty JSON to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), JsonOutputError> {
        let json = self.to_json_pretty()?;
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
