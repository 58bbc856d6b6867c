use dupetree::config::{Settings, SizeRange};
use dupetree::duplicates::DuplicateFinder;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn settings(root: &Path) -> Settings {
    Settings {
        roots: vec![root.to_path_buf()],
        chunk: 8,
        ..Settings::default()
    }
}

fn write(root: &Path, rel: &str, content: &[u8]) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn test_excluded_files_never_grouped() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.log", b"log line repeated");
    write(dir.path(), "b.log", b"log line repeated");
    write(dir.path(), "a.txt", b"kept duplicate");
    write(dir.path(), "b.txt", b"kept duplicate");

    let (resolution, summary) = DuplicateFinder::new(Settings {
        files_only: true,
        exclude_files: vec![glob::Pattern::new("*.log").unwrap()],
        ..settings(dir.path())
    })
    .find_duplicates()
    .unwrap();

    assert_eq!(summary.filtered.excluded_files, 2);
    assert_eq!(resolution.files.len(), 1);
    assert_eq!(resolution.files[0].members[0].path, dir.path().join("a.txt"));
}

#[test]
fn test_excluded_directory_breaks_directory_group() {
    let dir = tempdir().unwrap();
    write(dir.path(), "A/x", b"twin payload");
    write(dir.path(), "B/x", b"twin payload");

    let (resolution, summary) = DuplicateFinder::new(Settings {
        exclude_dirs: vec![glob::Pattern::new("*/B").unwrap()],
        ..settings(dir.path())
    })
    .find_duplicates()
    .unwrap();

    assert_eq!(summary.filtered.excluded_dirs, 1);
    assert!(resolution.dirs.is_empty());
    assert_eq!(resolution.files.len(), 1);
    assert_eq!(resolution.files[0].members.len(), 2);
}

#[test]
fn test_empty_files_skipped_unless_included() {
    let dir = tempdir().unwrap();
    write(dir.path(), "empty1", b"");
    write(dir.path(), "empty2", b"");

    let files_only = Settings {
        files_only: true,
        ..settings(dir.path())
    };
    let (resolution, summary) = DuplicateFinder::new(files_only.clone())
        .find_duplicates()
        .unwrap();
    assert!(resolution.files.is_empty());
    assert_eq!(summary.filtered.empty_files, 2);

    let (resolution, _) = DuplicateFinder::new(Settings {
        include_empty_files: true,
        ..files_only
    })
    .find_duplicates()
    .unwrap();
    assert_eq!(resolution.files.len(), 1);
    assert_eq!(resolution.files[0].size, 0);
}

#[test]
fn test_file_size_bounds() {
    let dir = tempdir().unwrap();
    write(dir.path(), "tiny1", b"tiny");
    write(dir.path(), "tiny2", b"tiny");
    write(dir.path(), "large1", b"large enough to keep");
    write(dir.path(), "large2", b"large enough to keep");

    for files_only in [true, false] {
        let (resolution, _) = DuplicateFinder::new(Settings {
            files_only,
            file_size: SizeRange {
                min: Some(10),
                max: None,
            },
            ..settings(dir.path())
        })
        .find_duplicates()
        .unwrap();

        assert_eq!(resolution.files.len(), 1, "files_only = {files_only}");
        assert_eq!(resolution.files[0].size, 20);
    }
}

#[test]
fn test_directory_size_bounds() {
    let dir = tempdir().unwrap();
    write(dir.path(), "A/x", b"twin payload");
    write(dir.path(), "B/x", b"twin payload");

    let (resolution, _) = DuplicateFinder::new(Settings {
        dir_size: SizeRange {
            min: None,
            max: Some(5),
        },
        ..settings(dir.path())
    })
    .find_duplicates()
    .unwrap();
    assert!(resolution.dirs.is_empty());

    let (resolution, _) = DuplicateFinder::new(Settings {
        dir_size: SizeRange {
            min: Some(12),
            max: Some(12),
        },
        ..settings(dir.path())
    })
    .find_duplicates()
    .unwrap();
    assert_eq!(resolution.dirs.len(), 1);
}

#[test]
fn test_minimum_directory_count() {
    let dir = tempdir().unwrap();
    for side in ["A", "B", "C"] {
        write(dir.path(), &format!("{side}/x"), b"triplet payload");
    }

    let run = |count| {
        DuplicateFinder::new(Settings {
            dups_dirs_count: Some(count),
            ..settings(dir.path())
        })
        .find_duplicates()
        .unwrap()
        .0
    };

    assert_eq!(run(3).dirs.len(), 1);
    assert_eq!(run(3).dirs[0].members.len(), 3);
    assert!(run(4).dirs.is_empty());
}
