//! Tests for bootstrap configuration and root folder resolution
//!
//! Environment-variable tests run serially: `CLASSHUB_ROOT_FOLDER` is
//! process-global.

use classhub_common::config::{
    RootFolderInitializer, RootFolderResolver, TomlConfig, DATABASE_FILE_NAME, ROOT_FOLDER_ENV,
};
use serial_test::serial;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_toml_defaults_when_fields_absent() {
    let config = TomlConfig::from_toml_str("").unwrap();
    assert_eq!(config.bind, "127.0.0.1");
    assert_eq!(config.port, 5780);
    assert_eq!(config.logging.level, "info");
    assert!(config.root_folder.is_none());
    assert!(config.mail_webhook_url.is_none());
}

#[test]
fn test_toml_full_document() {
    let config = TomlConfig::from_toml_str(
        r#"
        root_folder = "/srv/classhub"
        database_path = "data/school.db"
        bind = "0.0.0.0"
        port = 8088
        mail_webhook_url = "http://mail.local/hook"

        [logging]
        level = "debug"
        "#,
    )
    .unwrap();

    assert_eq!(config.root_folder, Some(PathBuf::from("/srv/classhub")));
    assert_eq!(config.database_path, Some(PathBuf::from("data/school.db")));
    assert_eq!(config.bind, "0.0.0.0");
    assert_eq!(config.port, 8088);
    assert_eq!(config.mail_webhook_url.as_deref(), Some("http://mail.local/hook"));
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_invalid_toml_is_config_error() {
    let err = TomlConfig::from_toml_str("port = \"not a number\"").unwrap_err();
    assert!(matches!(err, classhub_common::Error::Config(_)));
}

#[test]
fn test_explicit_missing_config_file_fails() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");
    assert!(TomlConfig::load_or_default(Some(&missing)).is_err());
}

#[test]
fn test_explicit_config_file_is_loaded() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "port = 6000\n").unwrap();

    let config = TomlConfig::load_or_default(Some(&path)).unwrap();
    assert_eq!(config.port, 6000);
}

#[test]
#[serial]
fn test_cli_argument_wins() {
    std::env::set_var(ROOT_FOLDER_ENV, "/from/env");
    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/from/toml")),
        ..TomlConfig::default()
    };

    let resolved = RootFolderResolver::new()
        .with_cli_arg(Some(PathBuf::from("/from/cli")))
        .with_toml_config(&toml)
        .resolve();
    std::env::remove_var(ROOT_FOLDER_ENV);

    assert_eq!(resolved, PathBuf::from("/from/cli"));
}

#[test]
#[serial]
fn test_env_beats_toml() {
    std::env::set_var(ROOT_FOLDER_ENV, "/from/env");
    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/from/toml")),
        ..TomlConfig::default()
    };

    let resolved = RootFolderResolver::new().with_toml_config(&toml).resolve();
    std::env::remove_var(ROOT_FOLDER_ENV);

    assert_eq!(resolved, PathBuf::from("/from/env"));
}

#[test]
#[serial]
fn test_toml_then_default() {
    std::env::remove_var(ROOT_FOLDER_ENV);
    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/from/toml")),
        ..TomlConfig::default()
    };
    assert_eq!(
        RootFolderResolver::new().with_toml_config(&toml).resolve(),
        PathBuf::from("/from/toml")
    );

    assert_eq!(
        RootFolderResolver::new().resolve(),
        classhub_common::config::default_root_folder()
    );
}

#[test]
fn test_initializer_creates_folder_and_locates_database() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("nested").join("root");
    let init = RootFolderInitializer::new(root.clone());

    init.ensure_directory_exists().unwrap();
    assert!(root.is_dir());
    assert_eq!(init.database_path(), root.join(DATABASE_FILE_NAME));

    let relative = TomlConfig {
        database_path: Some(PathBuf::from("other.db")),
        ..TomlConfig::default()
    };
    assert_eq!(init.database_path_with(&relative), root.join("other.db"));

    let absolute = TomlConfig {
        database_path: Some(dir.path().join("abs.db")),
        ..TomlConfig::default()
    };
    assert_eq!(init.database_path_with(&absolute), dir.path().join("abs.db"));
}
