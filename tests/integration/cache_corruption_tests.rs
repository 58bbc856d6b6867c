use dupetree::cache::HashCache;
use dupetree::config::Settings;
use dupetree::duplicates::DuplicateFinder;
use std::fs;
use std::sync::Arc;
use tempfile::tempdir;

#[test]
fn test_open_corrupted_database_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("hashes.db");
    fs::write(&path, b"not a sqlite database, just some garbage bytes").unwrap();

    assert!(HashCache::new(&path).is_err());
}

#[test]
fn test_recovery_starts_empty() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("hashes.db");
    fs::write(&path, b"corrupted garbage corrupted garbage corrupted garbage").unwrap();

    let cache = HashCache::open_or_recover(&path).unwrap();
    assert!(cache.is_empty().unwrap());
    assert_eq!(cache.path(), Some(path.as_path()));
}

#[test]
fn test_scan_with_recovered_cache() {
    let data = tempdir().unwrap();
    fs::write(data.path().join("a"), b"same content here").unwrap();
    fs::write(data.path().join("b"), b"same content here").unwrap();

    let cache_dir = tempdir().unwrap();
    let path = cache_dir.path().join("hashes.db");
    fs::write(&path, vec![0xffu8; 4096]).unwrap();

    let cache = Arc::new(HashCache::open_or_recover(&path).unwrap());
    let settings = Settings {
        roots: vec![data.path().to_path_buf()],
        files_only: true,
        ..Settings::default()
    };
    let (resolution, summary) = DuplicateFinder::new(settings)
        .with_cache(Arc::clone(&cache))
        .find_duplicates()
        .unwrap();

    assert_eq!(resolution.files.len(), 1);
    assert!(!summary.has_errors());
    assert!(!cache.is_empty().unwrap());
}

#[test]
fn test_unwritable_location_falls_back() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("file-not-dir");
    fs::write(&blocker, b"x").unwrap();

    // parent of the cache path is a regular file, so no store can be created there
    let cache = HashCache::open_or_recover(&blocker.join("hashes.db")).unwrap();
    assert!(cache.path().is_none());
    assert!(cache.is_empty().unwrap());
}
