//! Integration test: Configuration utilities
//!
//! Tests the bin_common configuration path helpers and the settings loader.

use campus_admin::bin_common::{load_config_from_env, ChannelSettings, ConfigError, ConfigType};
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

fn settings_file(yaml: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();
    file
}

/// Endpoint the loader should end up with, given the process environment
fn expected_url(from_file: &str) -> String {
    std::env::var("REALTIME_WS_URL")
        .ok()
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| from_file.to_string())
}

#[test]
fn test_realtime_config_path() {
    let config_path = load_config_from_env(ConfigType::Realtime);
    let expected = std::env::var("REALTIME_CONFIG_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| "config/realtime.yaml".to_string());
    assert_eq!(config_path.to_str().unwrap(), expected);
}

#[test]
fn test_custom_config() {
    let custom = ConfigType::Custom("custom/path.yaml".to_string());
    let config_path = load_config_from_env(custom);

    assert_eq!(config_path.to_str().unwrap(), "custom/path.yaml");
}

#[test]
fn test_config_type_default_paths() {
    assert_eq!(ConfigType::Realtime.default_path(), "config/realtime.yaml");

    let custom = ConfigType::Custom("test.yaml".to_string());
    assert_eq!(custom.default_path(), "test.yaml");
}

#[test]
fn test_load_full_settings_file() {
    let file = settings_file(
        r#"
url: wss://admin.example.edu/realtime
reconnect_interval_ms: 2500
max_reconnect_attempts: 8
connect_timeout_ms: 4000
log_level: debug
subscriptions:
  - attendance.marked
  - fees.paid
"#,
    );

    let settings = ChannelSettings::load(file.path()).unwrap();

    assert_eq!(settings.url, expected_url("wss://admin.example.edu/realtime"));
    assert_eq!(settings.reconnect_interval_ms, 2500);
    assert_eq!(settings.max_reconnect_attempts, 8);
    assert_eq!(settings.connect_timeout_ms, Some(4000));
    assert_eq!(settings.log_level, "debug");
    assert_eq!(settings.subscriptions, vec!["attendance.marked", "fees.paid"]);

    let client = settings.build_client().unwrap();
    assert_eq!(client.config().max_reconnect_attempts(), Some(8));
    assert_eq!(client.config().connect_timeout(), Some(Duration::from_millis(4000)));
}

#[test]
fn test_shipped_settings_file_is_valid() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/realtime.yaml");
    let settings = ChannelSettings::load(path).unwrap();

    assert_eq!(settings.reconnect_interval_ms, 5000);
    assert_eq!(settings.max_reconnect_attempts, 5);
    assert!(!settings.subscriptions.is_empty());
}

#[test]
fn test_missing_file_is_file_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ChannelSettings::load(dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::FileError(_)), "{err:?}");
}

#[test]
fn test_malformed_yaml_is_yaml_error() {
    let file = settings_file("url: [unterminated\n");
    let err = ChannelSettings::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::YamlError(_)), "{err:?}");
}
