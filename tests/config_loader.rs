use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use tealoop::config::{ConfigError, RuntimeConfig, StorageConfig};
use tealoop::transport::ReconnectPolicy;
use tempfile::TempDir;

fn write_config(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("config.toml");
    fs::write(&path, content).expect("write config");
    path
}

fn assert_validation_error(config: &RuntimeConfig, needle: &str) {
    match config.validate() {
        Err(ConfigError::ValidationError { message }) => {
            assert!(message.contains(needle), "unexpected message: {message}");
        }
        other => panic!("expected validation error mentioning {needle}, got {other:?}"),
    }
}

/// Test that RuntimeConfig::default() produces the documented values.
#[test]
fn test_config_default_values() {
    let config = RuntimeConfig::default();

    assert_eq!(config.render.frame_interval_ms, 16);
    assert_eq!(config.render.frame_interval(), Duration::from_millis(16));

    assert!(config.transport.url.is_none());
    assert_eq!(config.transport.reconnect_interval_ms, 1000);
    assert_eq!(config.transport.max_reconnect_interval_ms, 30_000);
    assert_eq!(config.transport.reconnect_decay, 1.5);
    assert_eq!(config.transport.timeout_interval_ms, 2000);
    assert!(config.transport.max_reconnect_attempts.is_none());

    assert!(config.storage.path.is_none());
    assert_eq!(config.storage.key, "tealoop-todos");
    assert!(config.validate().is_ok());
}

/// Test that RuntimeConfig::config_path() ends with the expected filename.
#[test]
fn test_config_path_ends_with_expected() {
    let path = RuntimeConfig::config_path();
    assert!(path.ends_with("tealoop/config.toml"));
}

/// Test that a missing config file yields defaults.
#[test]
fn test_missing_file_returns_defaults() {
    let dir = TempDir::new().unwrap();
    let config = RuntimeConfig::load_from(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, RuntimeConfig::default());
}

/// Test that a partial file only overrides the keys it names.
#[test]
fn test_partial_file_keeps_other_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[transport]
url = "127.0.0.1:7070"
reconnect_decay = 2.0
max_reconnect_attempts = 5

[storage]
path = "/tmp/todos.json"
"#,
    );

    let config = RuntimeConfig::load_from(&path).unwrap();
    assert_eq!(config.transport.url.as_deref(), Some("127.0.0.1:7070"));
    assert_eq!(config.transport.reconnect_decay, 2.0);
    assert_eq!(config.transport.max_reconnect_attempts, Some(5));
    assert_eq!(config.transport.reconnect_interval_ms, 1000);
    assert_eq!(config.render.frame_interval_ms, 16);
    assert_eq!(config.storage.path, Some(PathBuf::from("/tmp/todos.json")));
    assert_eq!(config.storage.key, "tealoop-todos");
}

/// Test that an empty file is a valid, all-default config.
#[test]
fn test_empty_file_is_default() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "");
    assert_eq!(RuntimeConfig::load_from(&path).unwrap(), RuntimeConfig::default());
}

/// Test that malformed TOML reports a parse error with the path.
#[test]
fn test_parse_error_names_the_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[transport\nurl = ");

    match RuntimeConfig::load_from(&path) {
        Err(err @ ConfigError::ParseError { .. }) => {
            assert!(err.to_string().contains("config.toml"));
        }
        other => panic!("expected parse error, got {other:?}"),
    }
}

/// Test that a loaded file is validated.
#[test]
fn test_load_validates() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[render]\nframe_interval_ms = 0\n");

    let err = RuntimeConfig::load_from(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError { .. }));
}

/// Test validation fails when the backoff would shrink.
#[test]
fn test_validation_fails_decay_below_one() {
    let mut config = RuntimeConfig::default();
    config.transport.reconnect_decay = 0.5;
    assert_validation_error(&config, "reconnect_decay");

    config.transport.reconnect_decay = f64::NAN;
    assert_validation_error(&config, "reconnect_decay");
}

/// Test validation fails when the ceiling is below the base delay.
#[test]
fn test_validation_fails_max_below_base() {
    let mut config = RuntimeConfig::default();
    config.transport.reconnect_interval_ms = 5000;
    config.transport.max_reconnect_interval_ms = 1000;
    assert_validation_error(&config, "max_reconnect_interval_ms");
}

/// Test validation fails on a zero connect timeout.
#[test]
fn test_validation_fails_zero_timeout() {
    let mut config = RuntimeConfig::default();
    config.transport.timeout_interval_ms = 0;
    assert_validation_error(&config, "timeout_interval_ms");
}

/// Test validation fails on a blank storage key.
#[test]
fn test_validation_fails_empty_key() {
    let mut config = RuntimeConfig::default();
    config.storage.key = "  ".to_string();
    assert_validation_error(&config, "storage.key");
}

/// Test that an explicit storage path wins over the key.
#[test]
fn test_resolved_path_prefers_explicit_path() {
    let explicit = StorageConfig {
        path: Some(PathBuf::from("/srv/todos.json")),
        key: "ignored".to_string(),
    };
    assert_eq!(explicit.resolved_path(), PathBuf::from("/srv/todos.json"));

    let derived = StorageConfig {
        path: None,
        key: "shopping".to_string(),
    };
    assert!(derived.resolved_path().ends_with("tealoop/shopping.json"));
}

/// Test that the transport settings map onto the reconnect policy.
#[test]
fn test_transport_config_builds_policy() {
    let mut config = RuntimeConfig::default();
    config.transport.reconnect_interval_ms = 250;
    config.transport.max_reconnect_attempts = Some(4);

    let policy = ReconnectPolicy::from(&config.transport);
    assert_eq!(policy.reconnect_interval, Duration::from_millis(250));
    assert_eq!(policy.max_reconnect_interval, Duration::from_secs(30));
    assert_eq!(policy.timeout_interval, Duration::from_secs(2));
    assert_eq!(policy.max_reconnect_attempts, Some(4));
}
