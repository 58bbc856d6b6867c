//! BLAKE3 content hashing with streaming reads.
//!
//! # Overview
//!
//! [`Hasher`] digests a whole file or a byte window of it without loading
//! it into memory. [`HashProvider`] puts the persistent [`HashCache`] in
//! front of it: a cached digest is returned as-is, a computed one is stored.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;

use crate::cache::{ByteRange, CacheKey, HashCache};

use super::{HashError, NodeId};

/// Read buffer size used while streaming file content.
pub const BUFFER_SIZE: usize = 64 * 1024;

/// Streaming BLAKE3 hasher.
#[derive(Debug, Clone)]
pub struct Hasher {
    buffer_size: usize,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a hasher with the default buffer size.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer_size: BUFFER_SIZE,
        }
    }

    /// Override the read buffer size.
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1);
        self
    }

    /// Hex digest of the bytes of `path` selected by `range`.
    ///
    /// A window larger than the file covers the whole file.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened, seeked or read.
    pub fn digest(&self, path: &Path, range: ByteRange) -> Result<String, HashError> {
        let io_err = |e| HashError::from_io(path.to_path_buf(), e);
        let mut file = File::open(path).map_err(io_err)?;

        let limit = match range {
            ByteRange::Whole => None,
            ByteRange::Head(n) => Some(n),
            ByteRange::Tail(n) => {
                let len = file.metadata().map_err(io_err)?.len();
                if len > n {
                    file.seek(SeekFrom::Start(len - n)).map_err(io_err)?;
                }
                Some(n)
            }
        };

        let mut hasher = blake3::Hasher::new();
        let mut reader = BufReader::with_capacity(self.buffer_size, file);
        match limit {
            Some(n) => std::io::copy(&mut reader.by_ref().take(n), &mut hasher),
            None => std::io::copy(&mut reader, &mut hasher),
        }
        .map_err(io_err)?;

        Ok(hasher.finalize().to_hex().to_string())
    }
}

/// Hex BLAKE3 digest of an in-memory string.
#[must_use]
pub fn hash_str(data: &str) -> String {
    blake3::hash(data.as_bytes()).to_hex().to_string()
}

/// A digest along with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    /// Hex-encoded digest
    pub hex: String,
    /// Whether the value was served from the cache
    pub cached: bool,
}

/// Digest source with an optional cache side channel.
#[derive(Debug, Clone, Default)]
pub struct HashProvider {
    hasher: Hasher,
    cache: Option<Arc<HashCache>>,
}

impl HashProvider {
    /// Create a provider that always reads file content.
    #[must_use]
    pub fn new(hasher: Hasher) -> Self {
        Self {
            hasher,
            cache: None,
        }
    }

    /// Attach a persistent cache.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<HashCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// The attached cache, if any.
    #[must_use]
    pub fn cache(&self) -> Option<&Arc<HashCache>> {
        self.cache.as_ref()
    }

    /// Digest `range` of the file at `path` whose identity is `node`.
    ///
    /// Cache failures are logged and treated as misses.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] only when the file itself cannot be read.
    pub fn digest(&self, node: &NodeId, path: &Path, range: ByteRange) -> Result<Digest, HashError> {
        let key = CacheKey::new(node.clone(), range);

        if let Some(cache) = &self.cache {
            match cache.get(&key) {
                Ok(Some(hex)) => {
                    log::trace!("Cache hit for {} ({})", path.display(), range);
                    return Ok(Digest { hex, cached: true });
                }
                Ok(None) => {}
                Err(e) => log::debug!("Cache lookup failed for {}: {}", path.display(), e),
            }
        }

        let hex = self.hasher.digest(path, range)?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.insert(&key, &hex) {
                log::debug!("Cache store failed for {}: {}", path.display(), e);
            }
        }

        Ok(Digest { hex, cached: false })
    }
}
