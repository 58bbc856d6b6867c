//! Node identity derivation.
//!
//! # Platform Support
//!
//! - **Unix**: `dev:ino`, so hardlinked paths share one identity
//! - **Other**: a fingerprint of the path, size and modification time

use std::fs::Metadata;
use std::path::Path;

use super::NodeId;

/// Whole seconds since the Unix epoch, `0` when unavailable.
#[must_use]
pub fn mtime_secs(metadata: &Metadata) -> i64 {
    metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
}

/// Derive the node identity of `path` from its metadata.
#[cfg(unix)]
#[must_use]
pub fn node_id(_path: &Path, metadata: &Metadata) -> NodeId {
    use std::os::unix::fs::MetadataExt;
    NodeId::new(format!("{}:{}", metadata.dev(), metadata.ino()))
}

/// Derive the node identity of `path` from its metadata.
///
/// Without inode numbers the identity is bound to the path, so a rewritten
/// file keeps its cache entries only while size and mtime stay the same.
#[cfg(not(unix))]
#[must_use]
pub fn node_id(path: &Path, metadata: &Metadata) -> NodeId {
    let fingerprint = format!(
        "{}\0{}\0{}",
        path.to_string_lossy(),
        metadata.len(),
        mtime_secs(metadata)
    );
    NodeId::new(blake3::hash(fingerprint.as_bytes()).to_hex().to_string())
}

/// Whether identities are shared between hardlinked paths on this platform.
#[must_use]
pub const fn tracks_hardlinks() -> bool {
    cfg!(unix)
}
