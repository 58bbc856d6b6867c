use dupetree::cache::{ByteRange, CacheKey, HashCache};
use dupetree::config::Settings;
use dupetree::duplicates::DuplicateFinder;
use dupetree::scanner::NodeId;
use std::fs;
use std::sync::Arc;
use tempfile::tempdir;

fn tree() -> tempfile::TempDir {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("A")).unwrap();
    fs::create_dir_all(dir.path().join("B")).unwrap();
    let big: Vec<u8> = (0..100u8).collect();
    fs::write(dir.path().join("A/data.bin"), &big).unwrap();
    fs::write(dir.path().join("B/data.bin"), &big).unwrap();
    fs::write(dir.path().join("loose1"), b"loose duplicate").unwrap();
    fs::write(dir.path().join("loose2"), b"loose duplicate").unwrap();
    dir
}

fn settings(root: &std::path::Path) -> Settings {
    Settings {
        roots: vec![root.to_path_buf()],
        chunk: 16,
        ..Settings::default()
    }
}

#[test]
fn test_cache_persists_across_runs() {
    let dir = tree();
    let cache_dir = tempdir().unwrap();
    let cache_path = cache_dir.path().join("hashes.db");

    let (first, cold) = {
        let cache = Arc::new(HashCache::new(&cache_path).unwrap());
        DuplicateFinder::new(settings(dir.path()))
            .with_cache(cache)
            .find_duplicates()
            .unwrap()
    };
    assert!(cold.cache_misses() > 0);
    assert_eq!(cold.cache_hits(), 0);

    let cache = Arc::new(HashCache::new(&cache_path).unwrap());
    assert!(!cache.is_empty().unwrap());
    let (second, warm) = DuplicateFinder::new(settings(dir.path()))
        .with_cache(cache)
        .find_duplicates()
        .unwrap();

    assert_eq!(warm.cache_misses(), 0);
    assert_eq!(warm.cache_hits(), cold.cache_misses());
    assert_eq!(first.dirs, second.dirs);
    assert_eq!(first.files, second.files);
}

#[test]
fn test_cache_entries_per_range() {
    let cache = HashCache::in_memory().unwrap();
    let node = NodeId::new("7:42");
    cache
        .insert(&CacheKey::new(node.clone(), ByteRange::Head(16)), "head")
        .unwrap();
    cache
        .insert(&CacheKey::new(node.clone(), ByteRange::Tail(16)), "tail")
        .unwrap();

    assert_eq!(
        cache
            .get(&CacheKey::new(node.clone(), ByteRange::Head(16)))
            .unwrap()
            .as_deref(),
        Some("head")
    );
    assert_eq!(
        cache
            .get(&CacheKey::new(node.clone(), ByteRange::Tail(16)))
            .unwrap()
            .as_deref(),
        Some("tail")
    );
    assert_eq!(
        cache.get(&CacheKey::new(node, ByteRange::Head(32))).unwrap(),
        None
    );
    assert_eq!(cache.len().unwrap(), 2);
}

#[test]
fn test_warm_cache_serves_second_run() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    fs::write(&a, b"first version!!").unwrap();
    fs::write(&b, b"first version!!").unwrap();

    let cache = Arc::new(HashCache::in_memory().unwrap());
    let settings = Settings {
        files_only: true,
        ..settings(dir.path())
    };
    let finder = DuplicateFinder::new(settings).with_cache(Arc::clone(&cache));
    let (before, _) = finder.find_duplicates().unwrap();
    assert_eq!(before.files.len(), 1);

    let (after, warm) = finder.find_duplicates().unwrap();
    assert_eq!(before.files, after.files);
    assert!(warm.cache_hits() > 0);
}
