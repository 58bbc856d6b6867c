use clap::Parser;
use dupetree::cli::Cli;
use dupetree::config::{ConfigError, Criterion, FileConfig, Settings};
use figment::providers::{Format, Toml};
use figment::Figment;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn cli(args: &[&str]) -> Cli {
    let mut argv = vec!["dupetree"];
    argv.extend_from_slice(args);
    Cli::parse_from(argv)
}

fn file_config(toml: &str) -> FileConfig {
    FileConfig::extract(Figment::new().merge(Toml::string(toml))).unwrap()
}

#[test]
fn test_config_file_values_used() {
    let file = file_config(
        r#"
        check = "size,hash"
        chunk = 4096
        io_threads = 2
        min_size = "10KB"
        exclude = ["*.bak"]
        "#,
    );
    let settings = Settings::from_layers(&cli(&["/data"]), &file).unwrap();

    assert!(settings.criteria.has(Criterion::Size));
    assert!(settings.criteria.has(Criterion::Hash));
    assert!(!settings.criteria.has(Criterion::FirstBytes));
    assert_eq!(settings.chunk, 4096);
    assert_eq!(settings.io_threads, 2);
    assert_eq!(settings.file_size.min, Some(10_000));
    assert_eq!(settings.dir_size.min, Some(10_000));
    assert_eq!(settings.exclude_files.len(), 1);
    assert_eq!(settings.roots, vec![PathBuf::from("/data")]);
}

#[test]
fn test_cli_overrides_config_file() {
    let file = file_config(
        r#"
        check = "size"
        chunk = 4096
        exclude = ["*.bak"]
        "#,
    );
    let settings = Settings::from_layers(
        &cli(&["--check", "fast", "--chunk", "128", "--exclude", "*.tmp", "--exclude", "*.swp", "/data"]),
        &file,
    )
    .unwrap();

    assert!(settings.criteria.has(Criterion::DirName));
    assert_eq!(settings.chunk, 128);
    assert_eq!(settings.exclude_files.len(), 2);
    assert!(settings.exclude_files.iter().all(|p| p.as_str() != "*.bak"));
}

#[test]
fn test_load_from_explicit_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dupetree.toml");
    fs::write(&path, "chunk = 512\ncheck = \"data\"\n").unwrap();

    let path_arg = path.to_string_lossy().to_string();
    let settings = Settings::load(&cli(&["--config", &path_arg, "/data"])).unwrap();
    assert_eq!(settings.chunk, 512);
}

#[test]
fn test_malformed_config_file_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dupetree.toml");
    fs::write(&path, "chunk = \"lots\"\n").unwrap();

    let path_arg = path.to_string_lossy().to_string();
    let err = Settings::load(&cli(&["--config", &path_arg, "/data"])).unwrap_err();
    assert!(matches!(err, ConfigError::File(_)));
}

#[test]
fn test_default_root_is_current_directory() {
    let settings = Settings::from_layers(&cli(&[]), &FileConfig::default()).unwrap();
    assert_eq!(settings.roots, vec![PathBuf::from(".")]);
}

#[test]
fn test_bad_size_rejected() {
    let err = Settings::from_layers(&cli(&["--min-file-size", "12XB"]), &FileConfig::default())
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidSize { value, .. } if value == "12XB"));
}

#[test]
fn test_unknown_criterion_rejected() {
    let err =
        Settings::from_layers(&cli(&["--check", "size,shape"]), &FileConfig::default()).unwrap_err();
    assert!(matches!(err, ConfigError::UnknownCriterion(name) if name == "shape"));
}

#[test]
fn test_ignoring_every_file_criterion_rejected() {
    let err = Settings::from_layers(
        &cli(&["--check", "size,dircount", "--ignore", "size"]),
        &FileConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::NoCriteria));
}

#[test]
fn test_zero_chunk_rejected() {
    let err = Settings::from_layers(&cli(&["--chunk", "0"]), &FileConfig::default()).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidChunk));
}

#[test]
fn test_bad_glob_rejected() {
    let err = Settings::from_layers(&cli(&["--exclude-files", "[abc"]), &FileConfig::default())
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidPattern { .. }));
}

#[test]
fn test_shorthand_overrides_specific_bounds() {
    let settings = Settings::from_layers(
        &cli(&["--max-size", "1MB", "--max-file-size", "2KB", "--dups-count", "4", "--dups-dirs-count", "2"]),
        &FileConfig::default(),
    )
    .unwrap();
    assert_eq!(settings.file_size.max, Some(1_000_000));
    assert_eq!(settings.dir_size.max, Some(1_000_000));
    assert_eq!(settings.dups_files_count, Some(4));
    assert_eq!(settings.dups_dirs_count, Some(4));
}

#[test]
fn test_specific_bound_used_without_shorthand() {
    let settings = Settings::from_layers(
        &cli(&["--max-file-size", "2KB", "--dups-dirs-count", "2"]),
        &FileConfig::default(),
    )
    .unwrap();
    assert_eq!(settings.file_size.max, Some(2_000));
    assert_eq!(settings.dir_size.max, None);
    assert_eq!(settings.dups_files_count, None);
    assert_eq!(settings.dups_dirs_count, Some(2));
}

#[test]
fn test_files_only_disables_combining() {
    let settings =
        Settings::from_layers(&cli(&["--files-only"]), &FileConfig::default()).unwrap();
    assert!(!settings.combine_files());
}

#[test]
fn test_cache_settings() {
    let settings =
        Settings::from_layers(&cli(&["--no-cache"]), &FileConfig::default()).unwrap();
    assert!(!settings.cache.enabled);

    let file = file_config("cache_path = \"/var/cache/dt.db\"");
    let settings = Settings::from_layers(&cli(&["--reset-cache"]), &file).unwrap();
    assert!(settings.cache.enabled);
    assert!(settings.cache.reset);
    assert_eq!(settings.cache.path, Some(PathBuf::from("/var/cache/dt.db")));
}
