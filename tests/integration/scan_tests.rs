use dupetree::config::{Criteria, Settings};
use dupetree::duplicates::{DuplicateFinder, Stage};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

fn settings(root: &Path) -> Settings {
    Settings {
        roots: vec![root.to_path_buf()],
        chunk: 8,
        ..Settings::default()
    }
}

fn write(root: &Path, rel: &str, content: &[u8]) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

fn member_paths(group: &dupetree::duplicates::DuplicateGroup) -> Vec<PathBuf> {
    group.members.iter().map(|m| m.path.clone()).collect()
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let (resolution, summary) = DuplicateFinder::new(settings(dir.path()))
        .find_duplicates()
        .unwrap();

    assert!(resolution.dirs.is_empty());
    assert!(resolution.files.is_empty());
    assert_eq!(summary.total_files, 0);
    assert!(!summary.has_duplicates());
}

#[test]
fn test_scan_unique_files() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", b"content a");
    write(dir.path(), "b.txt", b"content b");
    write(dir.path(), "c.txt", b"content cc");

    let (resolution, summary) = DuplicateFinder::new(settings(dir.path()))
        .find_duplicates()
        .unwrap();

    assert!(resolution.files.is_empty());
    assert_eq!(summary.total_files, 3);
}

#[test]
fn test_duplicate_directories_suppress_covered_files() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "A/x.txt", b"identical bytes");
    let b = write(dir.path(), "B/x.txt", b"identical bytes");

    let (resolution, _) = DuplicateFinder::new(settings(dir.path()))
        .find_duplicates()
        .unwrap();

    assert_eq!(resolution.dirs.len(), 1);
    assert_eq!(
        member_paths(&resolution.dirs[0]),
        vec![a.parent().unwrap().to_path_buf(), b.parent().unwrap().to_path_buf()]
    );
    assert!(resolution.files.is_empty());
}

#[test]
fn test_covered_files_reported_in_scope_without_combining() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "A/x.txt", b"identical bytes");
    let b = write(dir.path(), "B/x.txt", b"identical bytes");

    let settings = Settings {
        no_combine_files: true,
        ..settings(dir.path())
    };
    let (resolution, _) = DuplicateFinder::new(settings).find_duplicates().unwrap();

    assert_eq!(resolution.dirs.len(), 1);
    assert_eq!(resolution.files.len(), 1);
    let group = &resolution.files[0];
    assert_eq!(member_paths(group), vec![a, b]);
    assert!(group.members.iter().all(|m| m.in_directory_scope));
    assert!(group.members[0].canonical);
}

#[test]
fn test_scattered_files_form_one_group() {
    let dir = tempdir().unwrap();
    let one = write(dir.path(), "p/one.bin", b"shared content!!");
    let two = write(dir.path(), "q/r/two.bin", b"shared content!!");
    let three = write(dir.path(), "s/three.bin", b"shared content!!");
    write(dir.path(), "p/other", b"p side");
    write(dir.path(), "q/r/other", b"qr side!");
    write(dir.path(), "s/other", b"s side is longer");

    let (resolution, summary) = DuplicateFinder::new(settings(dir.path()))
        .find_duplicates()
        .unwrap();

    assert!(resolution.dirs.is_empty());
    assert_eq!(resolution.files.len(), 1);
    let group = &resolution.files[0];
    assert_eq!(member_paths(group), vec![one, two, three]);
    assert_eq!(group.canonical().unwrap().path, group.members[0].path);
    assert_eq!(group.actionable().count(), 2);
    assert_eq!(summary.reclaimable_space, 32);
}

#[test]
fn test_same_size_same_date_different_content() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a", b"0123456789");
    let b = write(dir.path(), "b", b"9876543210");
    let when = filetime::FileTime::from_unix_time(1_600_000_000, 0);
    filetime::set_file_mtime(&a, when).unwrap();
    filetime::set_file_mtime(&b, when).unwrap();

    let settings = Settings {
        criteria: Criteria::resolve("size,date,hash", None).unwrap(),
        chunk: 4,
        ..settings(dir.path())
    };
    let (resolution, summary) = DuplicateFinder::new(settings).find_duplicates().unwrap();

    let metadata = &summary.stages[0];
    assert_eq!(metadata.stage, Stage::Metadata);
    assert_eq!(metadata.files_eliminated(), 0);
    let full = &summary.stages[1];
    assert_eq!(full.stage, Stage::FullHash);
    assert_eq!(full.files_out, 0);
    assert!(resolution.files.is_empty());
}

#[test]
fn test_min_count_drops_pair() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a", b"pair of twins");
    write(dir.path(), "b", b"pair of twins");

    let settings = Settings {
        files_only: true,
        dups_files_count: Some(3),
        ..settings(dir.path())
    };
    let (resolution, summary) = DuplicateFinder::new(settings).find_duplicates().unwrap();
    assert!(resolution.files.is_empty());
    assert_eq!(summary.file_groups, 0);
}

#[test]
fn test_nested_duplicate_trees_reported_at_top() {
    let dir = tempdir().unwrap();
    for side in ["left", "right"] {
        write(dir.path(), &format!("{side}/tree/a.txt"), b"alpha");
        write(dir.path(), &format!("{side}/tree/sub/b.txt"), b"bravo!");
        write(dir.path(), &format!("{side}/tree/sub/deeper/c.txt"), b"charlie");
    }
    write(dir.path(), "left/extra", b"only on the left");

    let (resolution, _) = DuplicateFinder::new(settings(dir.path()))
        .find_duplicates()
        .unwrap();

    assert_eq!(resolution.dirs.len(), 1);
    assert_eq!(
        member_paths(&resolution.dirs[0]),
        vec![dir.path().join("left/tree"), dir.path().join("right/tree")]
    );
    assert_eq!(resolution.dirs[0].size, 18);
    assert!(resolution.files.is_empty());
}

#[test]
fn test_nested_groups_listed_without_combining() {
    let dir = tempdir().unwrap();
    for side in ["left", "right"] {
        write(dir.path(), &format!("{side}/tree/a.txt"), b"alpha");
        write(dir.path(), &format!("{side}/tree/sub/b.txt"), b"bravo!");
    }
    write(dir.path(), "left/extra", b"only on the left");

    let settings = Settings {
        no_combine_dirs: true,
        ..settings(dir.path())
    };
    let (resolution, _) = DuplicateFinder::new(settings).find_duplicates().unwrap();

    let tops: Vec<PathBuf> = resolution.dirs.iter().map(|g| g.members[0].path.clone()).collect();
    assert_eq!(
        tops,
        vec![dir.path().join("left/tree"), dir.path().join("left/tree/sub")]
    );
}

#[test]
fn test_differing_directory_not_grouped() {
    let dir = tempdir().unwrap();
    write(dir.path(), "A/same", b"same content");
    write(dir.path(), "B/same", b"same content");
    write(dir.path(), "B/unique", b"only in B");

    let (resolution, _) = DuplicateFinder::new(settings(dir.path()))
        .find_duplicates()
        .unwrap();

    assert!(resolution.dirs.is_empty());
    assert_eq!(resolution.files.len(), 1);
    assert!(resolution.files[0].members.iter().all(|m| !m.in_directory_scope));
}

#[test]
fn test_dirs_only_mode() {
    let dir = tempdir().unwrap();
    write(dir.path(), "A/x", b"twin content");
    write(dir.path(), "B/x", b"twin content");
    write(dir.path(), "loose1", b"loose twin");
    write(dir.path(), "loose2", b"loose twin");

    let settings = Settings {
        dirs_only: true,
        ..settings(dir.path())
    };
    let (resolution, _) = DuplicateFinder::new(settings).find_duplicates().unwrap();
    assert_eq!(resolution.dirs.len(), 1);
    assert!(resolution.files.is_empty());
}

#[test]
fn test_rerun_gives_identical_groups() {
    let dir: TempDir = tempdir().unwrap();
    write(dir.path(), "A/x", b"twin content");
    write(dir.path(), "B/x", b"twin content");
    write(dir.path(), "c", b"loose twin");
    write(dir.path(), "d", b"loose twin");

    let finder = DuplicateFinder::new(settings(dir.path()));
    let (first, _) = finder.find_duplicates().unwrap();
    let (second, _) = finder.find_duplicates().unwrap();
    assert_eq!(first.dirs, second.dirs);
    assert_eq!(first.files, second.files);
}

#[test]
fn test_regrouped_subtree_not_mistaken_for_duplicate() {
    let dir = tempdir().unwrap();
    let p1 = write(dir.path(), "P/F1", b"first payload");
    write(dir.path(), "P/C/E/F2", b"second payload!");
    let q1 = write(dir.path(), "Q/F1", b"first payload");
    fs::create_dir_all(dir.path().join("Q/C1")).unwrap();
    write(dir.path(), "Q/C2/F2", b"second payload!");

    let settings = Settings {
        criteria: Criteria::resolve("data", Some("count")).unwrap(),
        include_empty_dirs: true,
        no_combine_dirs: true,
        ..settings(dir.path())
    };
    let (resolution, _) = DuplicateFinder::new(settings).find_duplicates().unwrap();

    assert_eq!(resolution.dirs.len(), 1);
    assert_eq!(
        member_paths(&resolution.dirs[0]),
        vec![dir.path().join("P/C/E"), dir.path().join("Q/C2")]
    );
    assert_eq!(resolution.files.len(), 1);
    assert_eq!(member_paths(&resolution.files[0]), vec![p1, q1]);
}
