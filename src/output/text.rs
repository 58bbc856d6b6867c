//! Plain text report.
//!
//! ```text
//! Duplicate directories:
//!
//! 1  2024-03-01 10:15:00  1.5 MiB  2 directories  14 files  2 items
//!   ✓ /data/photos/2021/
//!   ⨯ /backup/photos/2021/
//!
//! Duplicate files:
//!
//! 1  2024-03-01 10:15:00  12.0 KiB  3 items
//! ↳ ✓ /data/photos/2021/index.txt
//!   ⨯ /tmp/index.txt
//! ```
//!
//! `↳` marks members whose parent directory is itself a duplicate, `✓` the
//! kept copy and `⨯` the actionable ones.

use std::io::{self, Write};

use crate::duplicates::{DuplicateGroup, Resolution, ScanSummary};

use super::{format_date, format_size};

/// Text rendering of a [`Resolution`].
pub struct TextReport<'a> {
    resolution: &'a Resolution,
    relative: bool,
    show_dirs: bool,
    show_files: bool,
}

impl<'a> TextReport<'a> {
    /// Report both kinds with absolute paths.
    #[must_use]
    pub fn new(resolution: &'a Resolution) -> Self {
        Self {
            resolution,
            relative: false,
            show_dirs: true,
            show_files: true,
        }
    }

    /// Show paths relative to their scan root.
    #[must_use]
    pub fn with_relative_paths(mut self, relative: bool) -> Self {
        self.relative = relative;
        self
    }

    /// Include directory groups.
    #[must_use]
    pub fn with_dirs(mut self, show: bool) -> Self {
        self.show_dirs = show;
        self
    }

    /// Include file groups.
    #[must_use]
    pub fn with_files(mut self, show: bool) -> Self {
        self.show_files = show;
        self
    }

    /// Write the report.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        if self.show_dirs {
            self.write_section(writer, "Duplicate directories", &self.resolution.dirs)?;
        }
        if self.show_files {
            self.write_section(writer, "Duplicate files", &self.resolution.files)?;
        }
        Ok(())
    }

    /// Render into a string.
    #[must_use]
    pub fn render(&self) -> String {
        let mut buf = Vec::new();
        // writing to a Vec cannot fail
        let _ = self.write_to(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn write_section<W: Write>(
        &self,
        writer: &mut W,
        title: &str,
        groups: &[DuplicateGroup],
    ) -> io::Result<()> {
        if groups.is_empty() {
            return Ok(());
        }
        writeln!(writer, "\n{title}:\n")?;

        for (index, group) in groups.iter().enumerate() {
            let mut header = format!(
                "{}  {}  {}  ",
                index + 1,
                format_date(group.modified),
                format_size(group.size)
            );
            if let (Some(dirs), Some(files)) = (group.dir_count, group.file_count) {
                header.push_str(&format!("{dirs} directories  {files} files  "));
            }
            header.push_str(&format!("{} items", group.len()));
            writeln!(writer, "{header}")?;

            let suffix = if group.is_directory() { "/" } else { "" };
            for member in &group.members {
                let scope = if member.in_directory_scope && !group.is_directory() {
                    "↳ "
                } else {
                    "  "
                };
                let mark = if member.canonical { "✓ " } else { "⨯ " };
                let path = if self.relative {
                    member.relative_path()
                } else {
                    member.path.clone()
                };
                writeln!(writer, "{scope}{mark}{}{suffix}", path.display())?;
            }
        }
        Ok(())
    }
}

/// Write the run summary.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_summary<W: Write>(writer: &mut W, summary: &ScanSummary) -> io::Result<()> {
    writeln!(writer, "\nSummary:")?;
    writeln!(
        writer,
        "  Catalogued: {} directories, {} files, {}",
        summary.total_dirs,
        summary.total_files,
        format_size(summary.total_size)
    )?;
    if summary.filtered.total() > 0 {
        writeln!(
            writer,
            "  Filtered:   {} records before comparison",
            summary.filtered.total()
        )?;
    }
    for stage in &summary.stages {
        writeln!(
            writer,
            "  {:<11} {} dirs and {} files removed, {} dirs and {} files left",
            format!("{}:", capitalize(stage.stage.name())),
            stage.dirs_eliminated(),
            stage.files_eliminated(),
            stage.dirs_out,
            stage.files_out
        )?;
    }
    writeln!(
        writer,
        "  Groups:     {} directory groups, {} file groups",
        summary.dir_groups, summary.file_groups
    )?;
    writeln!(
        writer,
        "  Reclaimable: {} ({:.1}%)",
        format_size(summary.reclaimable_space),
        summary.wasted_percentage()
    )?;
    if summary.cache_hits() + summary.cache_misses() > 0 {
        writeln!(
            writer,
            "  Cache:      {} hits, {} misses",
            summary.cache_hits(),
            summary.cache_misses()
        )?;
    }
    writeln!(writer, "  Elapsed:    {}", format_duration(summary.scan_duration))?;
    if summary.has_errors() {
        writeln!(writer, "  Errors:     {}", summary.scan_errors.len())?;
        for error in &summary.scan_errors {
            writeln!(writer, "    {error}")?;
        }
    }
    Ok(())
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs();
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if hours > 0 {
        format!("{hours} hours {minutes} minutes")
    } else if minutes > 0 {
        format!("{minutes} minutes {seconds} seconds")
    } else {
        format!("{:.3} seconds", duration.as_secs_f64())
    }
}
