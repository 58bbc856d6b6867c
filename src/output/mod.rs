//! Output formatters for search results.
//!
//! This module provides two report formats:
//! - plain text for terminals (default)
//! - JSON for automation and scripting
//!
//! # Example
//!
//! ```no_run
//! use dupetree::config::Settings;
//! use dupetree::duplicates::DuplicateFinder;
//! use dupetree::output::text::TextReport;
//!
//! let (resolution, summary) = DuplicateFinder::new(Settings::default()).find_duplicates().unwrap();
//! let report = TextReport::new(&resolution);
//! report.write_to(&mut std::io::stdout()).unwrap();
//! ```

pub mod json;
pub mod text;

pub use json::JsonOutput;
pub use text::{write_summary, TextReport};

use bytesize::ByteSize;
use chrono::{DateTime, Local, TimeZone};

/// Format a byte count with IEC binary units (`1.5 KiB`).
#[must_use]
pub fn format_size(bytes: u64) -> String {
    ByteSize::b(bytes).to_string()
}

/// Format seconds since the Unix epoch as local `YYYY-MM-DD HH:MM:SS`.
#[must_use]
pub fn format_date(secs: i64) -> String {
    match Local.timestamp_opt(secs, 0).single() {
        Some(time) => time.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => DateTime::from_timestamp(secs, 0)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string()),
    }
}
