//! Config error-message, atomic-write-safety, and init integration tests.

use assert_fs::prelude::*;
use hostsync_core::{config, Config, ConfigError};
use predicates::prelude::predicate;
use std::fs;
use std::path::PathBuf;

fn sample() -> Config {
    Config::new(PathBuf::from("/srv/world"), PathBuf::from("/mnt/share/world"))
}

// ---------------------------------------------------------------------------
// 1. Load error messages
// ---------------------------------------------------------------------------

#[test]
fn load_missing_config_mentions_init() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let err = config::load_at(home.path()).unwrap_err();
    assert!(matches!(err, ConfigError::ConfigNotFound { .. }), "got: {err}");
    assert!(err.to_string().contains("hostsync init"));
    assert!(err.to_string().contains("config.yaml"));
}

#[test]
fn load_corrupt_yaml_returns_parse_error_with_path() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let dir = home.path().join(".hostsync");
    fs::create_dir_all(&dir).expect("mkdir");
    fs::write(dir.join("config.yaml"), b": : corrupt : yaml : !!!\n  - broken: [unclosed")
        .expect("write");

    let err = config::load_at(home.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("config.yaml"));
}

#[test]
fn load_config_without_root_is_parse_error() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let dir = home.path().join(".hostsync");
    fs::create_dir_all(&dir).expect("mkdir");
    fs::write(dir.join("config.yaml"), b"store_root: /mnt/share\n").expect("write");

    let err = config::load_at(home.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
}

// ---------------------------------------------------------------------------
// 2. Atomic write safety
// ---------------------------------------------------------------------------

#[test]
fn save_cleans_up_tmp_file() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    config::save_at(home.path(), &sample()).expect("save");

    home.child(".hostsync/config.yaml").assert(predicate::path::exists());
    home.child(".hostsync/config.yaml.tmp")
        .assert(predicate::path::missing());
}

#[test]
fn mid_write_crash_leaves_original_intact() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    config::save_at(home.path(), &sample()).expect("save");

    let path = config::config_path_at(home.path());
    let original = fs::read(&path).expect("read original");

    // Simulate crash: .tmp written but process died before rename
    let tmp = path.with_file_name("config.yaml.tmp");
    fs::write(&tmp, b"CRASH - INCOMPLETE WRITE").expect("write crash tmp");

    assert_eq!(fs::read(&path).expect("read after crash"), original);
    let loaded = config::load_at(home.path()).expect("load after crash");
    assert_eq!(loaded.root, PathBuf::from("/srv/world"));
}

#[cfg(unix)]
#[test]
fn saved_config_is_private() {
    use std::os::unix::fs::PermissionsExt;

    let home = assert_fs::TempDir::new().expect("tempdir");
    config::save_at(home.path(), &sample()).expect("save");

    let file_mode = fs::metadata(config::config_path_at(home.path()))
        .unwrap()
        .permissions()
        .mode()
        & 0o777;
    assert_eq!(file_mode, 0o600);
    let dir_mode = fs::metadata(config::config_dir_at(home.path()))
        .unwrap()
        .permissions()
        .mode()
        & 0o777;
    assert_eq!(dir_mode, 0o700);
}

// ---------------------------------------------------------------------------
// 3. Init
// ---------------------------------------------------------------------------

#[test]
fn init_writes_yaml_with_root_and_store() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    config::init_at(home.path(), sample()).expect("init");

    home.child(".hostsync/config.yaml")
        .assert(predicate::str::contains("root: /srv/world"))
        .assert(predicate::str::contains("store_root: /mnt/share/world"))
        .assert(predicate::str::contains("concurrency: 24"));
}
