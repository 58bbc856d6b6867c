//! SQLite-backed hash cache database.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

use super::entry::{ByteRange, CacheKey};

/// Errors raised by the hash cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The underlying SQLite call failed.
    #[error("cache database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The cache file or its directory could not be prepared.
    #[error("cache I/O error for {path}: {source}")]
    Io {
        /// Path being prepared
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Another thread panicked while holding the connection.
    #[error("cache connection lock poisoned")]
    Poisoned,
}

/// Result alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

const SCHEMA: &str = "
    PRAGMA journal_mode = WAL;
    PRAGMA synchronous = NORMAL;
    CREATE TABLE IF NOT EXISTS digests (
        node       TEXT    NOT NULL,
        range_kind TEXT    NOT NULL,
        range_len  INTEGER NOT NULL,
        digest     TEXT    NOT NULL,
        PRIMARY KEY (node, range_kind, range_len)
    );
";

/// Persistent digest cache keyed by `(node identity, byte range)`.
///
/// Every insert is committed on its own, so an interrupted run leaves only
/// complete entries behind. Concurrent runs against one file are not
/// coordinated: the last writer of a key wins.
pub struct HashCache {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for HashCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashCache").field("path", &self.path).finish()
    }
}

impl HashCache {
    /// Opens or creates a cache database at `path`.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be opened or is not a valid cache database.
    pub fn new(path: &Path) -> CacheResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| CacheError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        log::debug!("Opened hash cache at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Creates a cache that lives only for this process.
    ///
    /// # Errors
    ///
    /// Fails only if SQLite cannot allocate the in-memory database.
    pub fn in_memory() -> CacheResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// Opens the cache at `path`, treating an unreadable store as empty.
    ///
    /// A corrupt file is discarded and recreated. If that also fails the
    /// cache degrades to an in-memory store; `None` is returned only when
    /// not even that can be created.
    #[must_use]
    pub fn open_or_recover(path: &Path) -> Option<Self> {
        match Self::new(path) {
            Ok(cache) => return Some(cache),
            Err(e) => log::warn!(
                "Hash cache at {} is unreadable ({}), starting with an empty cache",
                path.display(),
                e
            ),
        }

        for suffix in ["", "-wal", "-shm"] {
            let mut stale = path.as_os_str().to_owned();
            stale.push(suffix);
            let _ = fs::remove_file(PathBuf::from(stale));
        }

        match Self::new(path) {
            Ok(cache) => Some(cache),
            Err(e) => {
                log::warn!(
                    "Could not recreate hash cache at {} ({}), using an in-memory cache",
                    path.display(),
                    e
                );
                Self::in_memory().ok()
            }
        }
    }

    /// Location of the backing file, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> CacheResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| CacheError::Poisoned)
    }

    /// Look up a digest.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get(&self, key: &CacheKey) -> CacheResult<Option<String>> {
        let conn = self.lock()?;
        let digest = conn
            .query_row(
                "SELECT digest FROM digests WHERE node = ?1 AND range_kind = ?2 AND range_len = ?3",
                params![key.node.as_str(), key.range.kind(), range_len(key.range)],
                |row| row.get(0),
            )
            .optional()?;
        Ok(digest)
    }

    /// Store a digest, replacing any previous value for the key.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails (e.g. read-only database).
    pub fn insert(&self, key: &CacheKey, digest: &str) -> CacheResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO digests (node, range_kind, range_len, digest)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                key.node.as_str(),
                key.range.kind(),
                range_len(key.range),
                digest
            ],
        )?;
        Ok(())
    }

    /// Number of cached digests.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn len(&self) -> CacheResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM digests", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Whether the cache holds no digests.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn is_empty(&self) -> CacheResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Remove every cached digest.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn clear(&self) -> CacheResult<()> {
        let conn = self.lock()?;
        let removed = conn.execute("DELETE FROM digests", [])?;
        log::info!("Cleared {} cached digests", removed);
        Ok(())
    }

    /// Close the connection, surfacing any final error.
    ///
    /// # Errors
    ///
    /// Returns an error if SQLite fails to close cleanly.
    pub fn close(self) -> CacheResult<()> {
        let conn = self.conn.into_inner().map_err(|_| CacheError::Poisoned)?;
        conn.close().map_err(|(_, e)| CacheError::Database(e))
    }
}

fn range_len(range: ByteRange) -> i64 {
    i64::try_from(range.len()).unwrap_or(i64::MAX)
}
