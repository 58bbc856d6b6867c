//! Classification stages and their per-record discriminators.

use std::fmt;

use serde::Serialize;

use crate::cache::ByteRange;
use crate::config::{Criteria, Criterion};
use crate::scanner::{DirRecord, FileRecord};

/// One classification pass of the elimination pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Name, size and/or modification time
    Metadata,
    /// Digest of the first chunk
    Prefix,
    /// Digest of the last chunk
    Suffix,
    /// Digest of the whole file
    FullHash,
}

impl Stage {
    /// All stages in execution order.
    pub const ORDER: [Stage; 4] = [Self::Metadata, Self::Prefix, Self::Suffix, Self::FullHash];

    /// The stages `criteria` enables, in execution order.
    #[must_use]
    pub fn enabled(criteria: &Criteria) -> Vec<Stage> {
        Self::ORDER
            .into_iter()
            .filter(|stage| stage.is_enabled(criteria))
            .collect()
    }

    /// Whether `criteria` enables this stage.
    #[must_use]
    pub fn is_enabled(self, criteria: &Criteria) -> bool {
        match self {
            Self::Metadata => criteria.metadata_stage(),
            Self::Prefix => criteria.has(Criterion::FirstBytes),
            Self::Suffix => criteria.has(Criterion::LastBytes),
            Self::FullHash => criteria.has(Criterion::Hash),
        }
    }

    /// Whether the stage reads file content.
    #[must_use]
    pub fn reads_content(self) -> bool {
        !matches!(self, Self::Metadata)
    }

    /// The byte window to digest for a file of `size` bytes, if any.
    ///
    /// `None` means the stage adds nothing for this file and its key is
    /// left unchanged.
    #[must_use]
    pub fn window(self, size: u64, chunk: u64) -> Option<ByteRange> {
        match self {
            Self::Metadata => None,
            Self::Prefix if size > chunk => Some(ByteRange::Head(chunk)),
            Self::Prefix => Some(ByteRange::Whole),
            Self::Suffix if size > chunk.saturating_mul(2) => Some(ByteRange::Tail(chunk)),
            Self::Suffix => None,
            Self::FullHash if size > chunk => Some(ByteRange::Whole),
            Self::FullHash => None,
        }
    }

    /// Stable lowercase name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Metadata => "metadata",
            Self::Prefix => "first bytes",
            Self::Suffix => "last bytes",
            Self::FullHash => "full hash",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tagged metadata discriminator for a file: `<` + selected fields, each
/// followed by `/`, + `>`.
#[must_use]
pub fn file_metadata_key(file: &FileRecord, criteria: &Criteria) -> String {
    let mut key = String::from("<");
    if criteria.has(Criterion::FileName) {
        key.push_str(&file.name);
        key.push('/');
    }
    if criteria.has(Criterion::Size) {
        key.push_str(&file.size.to_string());
        key.push('/');
    }
    if criteria.has(Criterion::Date) {
        key.push_str(&file.modified.to_string());
        key.push('/');
    }
    key.push('>');
    key
}

/// Metadata key a directory starts every stage with. Never content.
#[must_use]
pub fn dir_metadata_key(dir: &DirRecord, criteria: &Criteria) -> String {
    let mut key = String::from("<");
    if criteria.has(Criterion::DirName) {
        key.push_str(&dir.name);
        key.push('/');
    }
    if criteria.has(Criterion::DirCount) {
        key.push_str(&dir.dir_count.to_string());
        key.push('/');
    }
    if criteria.has(Criterion::FileCount) {
        key.push_str(&dir.file_count.to_string());
        key.push('/');
    }
    key.push('>');
    key
}
