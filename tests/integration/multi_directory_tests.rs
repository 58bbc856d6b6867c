use dupetree::config::Settings;
use dupetree::duplicates::DuplicateFinder;
use dupetree::error::ExitCode;
use dupetree::output::JsonOutput;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn populate(root: &Path, files: &[(&str, &[u8])]) {
    for (rel, content) in files {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
}

fn settings(roots: Vec<PathBuf>) -> Settings {
    Settings {
        roots,
        chunk: 8,
        ..Settings::default()
    }
}

#[test]
fn test_duplicate_directories_across_roots() {
    let photos = tempdir().unwrap();
    let backup = tempdir().unwrap();
    let album: &[(&str, &[u8])] = &[
        ("2024/beach.jpg", b"sand and sea pixels"),
        ("2024/sunset.jpg", b"orange sky pixels"),
    ];
    populate(photos.path(), album);
    populate(backup.path(), album);
    populate(backup.path(), &[("notes.txt", b"backup notes")]);

    let (resolution, summary) = DuplicateFinder::new(settings(vec![
        photos.path().to_path_buf(),
        backup.path().to_path_buf(),
    ]))
    .find_duplicates()
    .unwrap();

    assert_eq!(resolution.dirs.len(), 1);
    let group = &resolution.dirs[0];
    assert_eq!(group.members[0].path, photos.path().join("2024"));
    assert_eq!(group.members[1].path, backup.path().join("2024"));
    assert_eq!(group.members[0].root, photos.path());
    assert_eq!(group.members[1].root, backup.path());
    assert!(resolution.files.is_empty());
    assert_eq!(summary.total_files, 5);
}

#[test]
fn test_identical_roots_grouped() {
    let left = tempdir().unwrap();
    let right = tempdir().unwrap();
    let tree: &[(&str, &[u8])] = &[("a", b"alpha content"), ("sub/b", b"bravo content")];
    populate(left.path(), tree);
    populate(right.path(), tree);

    let (resolution, _) = DuplicateFinder::new(settings(vec![
        left.path().to_path_buf(),
        right.path().to_path_buf(),
    ]))
    .find_duplicates()
    .unwrap();

    assert_eq!(resolution.dirs.len(), 1);
    let paths: Vec<_> = resolution.dirs[0].members.iter().map(|m| m.path.clone()).collect();
    assert_eq!(paths, vec![left.path().to_path_buf(), right.path().to_path_buf()]);
}

#[test]
fn test_nested_root_scanned_once() {
    let dir = tempdir().unwrap();
    populate(
        dir.path(),
        &[("inner/a", b"twin bytes"), ("inner/b", b"twin bytes")],
    );

    let (resolution, summary) = DuplicateFinder::new(settings(vec![
        dir.path().join("inner"),
        dir.path().to_path_buf(),
    ]))
    .find_duplicates()
    .unwrap();

    assert_eq!(summary.total_files, 2);
    assert_eq!(resolution.files.len(), 1);
    assert_eq!(resolution.files[0].members.len(), 2);
    assert_eq!(resolution.files[0].members[0].root, dir.path());
}

#[test]
fn test_files_scattered_across_roots() {
    let first = tempdir().unwrap();
    let second = tempdir().unwrap();
    populate(first.path(), &[("x/report.pdf", b"quarterly report"), ("x/own", b"first")]);
    populate(second.path(), &[("y/copy.pdf", b"quarterly report"), ("y/own", b"second!")]);

    let (resolution, _) = DuplicateFinder::new(settings(vec![
        first.path().to_path_buf(),
        second.path().to_path_buf(),
    ]))
    .find_duplicates()
    .unwrap();

    assert!(resolution.dirs.is_empty());
    assert_eq!(resolution.files.len(), 1);
    let group = &resolution.files[0];
    assert_eq!(group.members[0].path, first.path().join("x/report.pdf"));
    assert!(group.members[0].canonical);
    assert_eq!(group.members[1].path, second.path().join("y/copy.pdf"));
}

#[test]
fn test_relative_paths_keep_root_name() {
    let first = tempdir().unwrap();
    let second = tempdir().unwrap();
    populate(first.path(), &[("dup.txt", b"same across roots")]);
    populate(second.path(), &[("dup.txt", b"same across roots")]);

    let (resolution, summary) = DuplicateFinder::new(Settings {
        files_only: true,
        ..settings(vec![first.path().to_path_buf(), second.path().to_path_buf()])
    })
    .find_duplicates()
    .unwrap();

    let member = &resolution.files[0].members[0];
    let root_name = first.path().file_name().unwrap();
    assert_eq!(member.relative_path(), Path::new(root_name).join("dup.txt"));

    let json = JsonOutput::new(&resolution, &summary, ExitCode::Success, true);
    let value: serde_json::Value =
        serde_json::from_str(&json.to_json_pretty().unwrap()).unwrap();
    let display = value["files"][0]["members"][0]["display"].as_str().unwrap();
    assert_eq!(Path::new(display), Path::new(root_name).join("dup.txt"));
}

#[test]
fn test_missing_root_is_an_error() {
    let dir = tempdir().unwrap();
    let result = DuplicateFinder::new(settings(vec![
        dir.path().to_path_buf(),
        dir.path().join("does-not-exist"),
    ]))
    .find_duplicates();
    assert!(result.is_err());
}
