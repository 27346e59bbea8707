//! Integration tests for configuration resolution

use serial_test::serial;
use sightline_common::config::{
    load_toml_config, resolve_storage_root, IngestConfig, TomlConfig, STORAGE_ROOT_ENV,
};
use std::io::Write;
use std::path::PathBuf;

#[test]
#[serial]
fn env_var_beats_file_config() {
    std::env::set_var(STORAGE_ROOT_ENV, "/from/env");

    let file_config = TomlConfig {
        storage_root: Some("/from/file".to_string()),
        ..Default::default()
    };
    let resolved = resolve_storage_root(None, &file_config);

    std::env::remove_var(STORAGE_ROOT_ENV);
    assert_eq!(resolved, PathBuf::from("/from/env"));
}

#[test]
#[serial]
fn file_config_used_when_no_cli_or_env() {
    std::env::remove_var(STORAGE_ROOT_ENV);

    let file_config = TomlConfig {
        storage_root: Some("/from/file".to_string()),
        ..Default::default()
    };
    let resolved = resolve_storage_root(None, &file_config);
    assert_eq!(resolved, PathBuf::from("/from/file"));
}

#[test]
#[serial]
fn toml_file_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.toml");

    let mut file = std::fs::File::create(&config_path).unwrap();
    writeln!(
        file,
        r#"
storage_root = "/srv/sightline"
accepted_mime_types = ["image/jpeg"]

[logging]
level = "debug"
"#
    )
    .unwrap();

    let loaded = load_toml_config(Some(&config_path)).unwrap();
    assert_eq!(loaded.storage_root.as_deref(), Some("/srv/sightline"));
    assert_eq!(
        loaded.accepted_mime_types,
        Some(vec!["image/jpeg".to_string()])
    );
    assert_eq!(loaded.logging.level.as_deref(), Some("debug"));
}

#[test]
#[serial]
fn resolve_fills_database_default_under_storage_root() {
    std::env::remove_var(STORAGE_ROOT_ENV);
    std::env::remove_var(sightline_common::config::DATABASE_PATH_ENV);

    let config = IngestConfig::resolve(Some("/srv/sightline"), None).unwrap();
    assert_eq!(config.storage_root, PathBuf::from("/srv/sightline"));
    assert_eq!(
        config.database_path,
        PathBuf::from("/srv/sightline/sightline.db")
    );
    assert!(!config.accepted_mime_types.is_empty());
}

#[test]
#[serial]
fn empty_whitelist_is_rejected() {
    std::env::remove_var(STORAGE_ROOT_ENV);

    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    std::fs::write(&config_path, "accepted_mime_types = []\n").unwrap();

    let result = IngestConfig::resolve(Some("/srv/sightline"), Some(&config_path));
    assert!(result.is_err());
}
