//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - The working set of file and directory records ([`WorkingSet`])
//! - Pre-pipeline filters (empty, size, exclude)
//! - The elimination pipeline (metadata, first bytes, last bytes, full hash)
//! - Bottom-up directory fingerprints and group compaction
//! - Canonical selection ([`DuplicateGroup`])

pub mod aggregate;
pub mod compact;
pub mod finder;
pub mod groups;
pub mod pipeline;
pub mod prefilter;
pub mod records;
pub mod resolve;
pub mod stages;

pub use finder::{DuplicateFinder, FinderError, ScanSummary};
pub use groups::{DuplicateGroup, GroupKind, GroupMember};
pub use pipeline::{run_pipeline, run_stage, StageContext, StageStats};
pub use prefilter::FilterReport;
pub use records::{Scope, WorkingSet};
pub use resolve::Resolution;
pub use stages::Stage;
