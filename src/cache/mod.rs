//! Persistent digest cache.
//!
//! Content digests are expensive, so every digest the pipeline computes is
//! stored under the file's node identity and the byte window that was read.
//! Later runs look the digest up instead of re-reading the file.
//!
//! * [`database`]: SQLite persistence and corruption recovery.
//! * [`entry`]: the key type, [`CacheKey`], and [`ByteRange`].
//!
//! # Invalidation
//!
//! There is none. A node identity (device + inode on Unix) is assumed to
//! imply unchanged content for the duration of a run; use `--reset-cache`
//! after rewriting files in place.

pub mod database;
pub mod entry;

pub use database::{CacheError, CacheResult, HashCache};
pub use entry::{ByteRange, CacheKey};
