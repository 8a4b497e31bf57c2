//! Config file loading tests.

use std::io::Write;
use std::time::Duration;
use talynk_review_lib::services::RollbackPolicy;
use talynk_review_lib::{AppConfig, AppError, TalynkApp};
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_partial_file_keeps_defaults() {
    let file = write_config(r#"{ "api_base_url": "https://api.talynk.test", "refresh_interval_secs": 30 }"#);
    let config = AppConfig::from_json_file(file.path()).unwrap();

    assert_eq!(config.api_base_url, "https://api.talynk.test");
    assert_eq!(config.media_base_url, AppConfig::default().media_base_url);

    let queue = config.queue_config();
    assert_eq!(queue.refresh_interval, Duration::from_secs(30));
    assert_eq!(queue.highlight_duration, Duration::from_millis(2000));
    assert_eq!(queue.rollback, RollbackPolicy::KeepRemoved);
}

#[test]
fn test_rollback_flag_maps_to_restore() {
    let file = write_config(r#"{ "rollback_on_failure": true }"#);
    let config = AppConfig::from_json_file(file.path()).unwrap();
    assert_eq!(config.queue_config().rollback, RollbackPolicy::Restore);
}

#[test]
fn test_invalid_json_is_config_error() {
    let file = write_config("not json");
    let err = AppConfig::from_json_file(file.path()).unwrap_err();
    assert!(matches!(err, AppError::Config { .. }));
}

#[test]
fn test_missing_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = AppConfig::from_json_file(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, AppError::Config { .. }));
}

#[test]
fn test_app_rejects_invalid_config() {
    let err = TalynkApp::new(AppConfig {
        refresh_interval_secs: 0,
        ..AppConfig::default()
    })
    .err()
    .unwrap();
    assert!(matches!(err, AppError::InvalidInput { .. }));
}
