use dupetree::config::Settings;
use dupetree::duplicates::DuplicateFinder;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn settings(root: &Path) -> Settings {
    Settings {
        roots: vec![root.to_path_buf()],
        chunk: 8,
        ..Settings::default()
    }
}

#[test]
fn test_unicode_and_spaces_in_names() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("résumé final.txt");
    let b = dir.path().join("日本語 ファイル.txt");
    let c = dir.path().join("emoji 🎉.txt");
    for path in [&a, &b, &c] {
        fs::write(path, b"international content").unwrap();
    }

    let (resolution, _) = DuplicateFinder::new(Settings {
        files_only: true,
        ..settings(dir.path())
    })
    .find_duplicates()
    .unwrap();

    assert_eq!(resolution.files.len(), 1);
    let mut paths: Vec<PathBuf> = resolution.files[0]
        .members
        .iter()
        .map(|m| m.path.clone())
        .collect();
    paths.sort();
    let mut expected = vec![a, b, c];
    expected.sort();
    assert_eq!(paths, expected);
}

#[test]
fn test_deeply_nested_duplicates() {
    let dir = tempdir().unwrap();
    let mut deep_a = dir.path().join("a");
    let mut deep_b = dir.path().join("b");
    for level in 0..40 {
        deep_a.push(format!("level{level}"));
        deep_b.push(format!("level{level}"));
    }
    fs::create_dir_all(&deep_a).unwrap();
    fs::create_dir_all(&deep_b).unwrap();
    fs::write(deep_a.join("leaf"), b"bottom of the tree").unwrap();
    fs::write(deep_b.join("leaf"), b"bottom of the tree").unwrap();

    let (resolution, _) = DuplicateFinder::new(settings(dir.path()))
        .find_duplicates()
        .unwrap();

    assert_eq!(resolution.dirs.len(), 1);
    assert_eq!(resolution.dirs[0].members[0].path, dir.path().join("a"));
    assert_eq!(resolution.dirs[0].members[1].path, dir.path().join("b"));
    assert!(resolution.files.is_empty());
}

#[test]
fn test_long_keys_are_compacted() {
    let dir = tempdir().unwrap();
    for side in ["left", "right"] {
        for i in 0..120 {
            let path = dir.path().join(side).join(format!("f{i:03}"));
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, format!("file number {i}")).unwrap();
        }
    }

    let (resolution, _) = DuplicateFinder::new(settings(dir.path()))
        .find_duplicates()
        .unwrap();

    assert_eq!(resolution.dirs.len(), 1);
    assert!(resolution.dirs[0].key.len() <= 1000);
    assert_eq!(resolution.dirs[0].file_count, Some(120));
}

#[cfg(unix)]
#[test]
fn test_symlinks_skipped_by_default() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("real.txt");
    fs::write(&target, b"only one real copy").unwrap();
    std::os::unix::fs::symlink(&target, dir.path().join("link.txt")).unwrap();

    let (resolution, summary) = DuplicateFinder::new(settings(dir.path()))
        .find_duplicates()
        .unwrap();

    assert_eq!(summary.total_files, 1);
    assert!(resolution.files.is_empty());
}

#[cfg(unix)]
#[test]
fn test_follow_links_sees_linked_directory() {
    let dir = tempdir().unwrap();
    let outside = tempdir().unwrap();
    fs::write(outside.path().join("data.bin"), b"reachable only via link").unwrap();
    fs::create_dir(dir.path().join("copy")).unwrap();
    fs::write(dir.path().join("copy/data.bin"), b"reachable only via link").unwrap();
    std::os::unix::fs::symlink(outside.path(), dir.path().join("linked")).unwrap();

    let (without, _) = DuplicateFinder::new(settings(dir.path()))
        .find_duplicates()
        .unwrap();
    assert!(without.dirs.is_empty());
    assert!(without.files.is_empty());

    let (with, summary) = DuplicateFinder::new(Settings {
        follow_links: true,
        ..settings(dir.path())
    })
    .find_duplicates()
    .unwrap();
    assert_eq!(summary.total_files, 2);
    assert_eq!(with.dirs.len(), 1);
    assert_eq!(
        with.dirs[0].members[1].path,
        dir.path().join("linked")
    );
}

#[test]
fn test_root_given_with_dot_components() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("x"), b"dotted twin").unwrap();
    fs::write(dir.path().join("y"), b"dotted twin").unwrap();

    let dotted = dir.path().join("sub").join("..").join(".");
    let (resolution, _) = DuplicateFinder::new(Settings {
        files_only: true,
        ..settings(&dotted)
    })
    .find_duplicates()
    .unwrap();

    assert_eq!(resolution.files.len(), 1);
    assert_eq!(resolution.files[0].members[0].path, dir.path().join("x"));
}
