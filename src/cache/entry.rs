//! Cache key definitions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::scanner::NodeId;

/// The byte window a digest was computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ByteRange {
    /// The entire file.
    Whole,
    /// The first `n` bytes.
    Head(u64),
    /// The last `n` bytes.
    Tail(u64),
}

impl ByteRange {
    /// Short tag stored in the `range_kind` column.
    #[must_use]
    pub fn kind(self) -> &'static str {
        match self {
            Self::Whole => "whole",
            Self::Head(_) => "head",
            Self::Tail(_) => "tail",
        }
    }

    /// Window length, `0` for [`ByteRange::Whole`].
    #[must_use]
    pub fn len(self) -> u64 {
        match self {
            Self::Whole => 0,
            Self::Head(n) | Self::Tail(n) => n,
        }
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Whole => write!(f, "whole"),
            Self::Head(n) => write!(f, "head[{n}]"),
            Self::Tail(n) => write!(f, "tail[{n}]"),
        }
    }
}

/// Identity of one cached digest: the file's node plus the byte window.
///
/// A present entry is trusted for the node's current content; nothing is
/// invalidated when a file changes underneath the same node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Stable node identity of the hashed file
    pub node: NodeId,
    /// Hashed window
    pub range: ByteRange,
}

impl CacheKey {
    /// Create a new cache key.
    #[must_use]
    pub fn new(node: NodeId, range: ByteRange) -> Self {
        Self { node, range }
    }
}
