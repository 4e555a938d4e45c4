//! Integration tests for Settings loading with layered precedence.
//!
//! Layers, lowest to highest: compiled defaults, config file, `KUMO_*`
//! environment variables. The environment is injected as a map so tests
//! do not touch the process environment.

use std::fs;
use std::path::PathBuf;

use rstest::rstest;
use tempfile::TempDir;

use hvac_stability::application::ApplicationError;
use hvac_stability::config::{Settings, DEFAULT_REQUEST_TIMEOUT_SECS};
use hvac_stability::infrastructure::kumo::DEFAULT_CLOUD_URL;

fn env(pairs: &[(&str, &str)]) -> Option<config::Map<String, String>> {
    Some(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    )
}

fn config_file(temp: &TempDir, content: &str) -> PathBuf {
    let path = temp.path().join("config.toml");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn given_empty_config_file_when_loading_then_defaults_apply() {
    let temp = TempDir::new().unwrap();
    let path = config_file(&temp, "");

    let settings = Settings::load_with_env(Some(&path), env(&[])).unwrap();

    assert_eq!(settings.cloud_url, DEFAULT_CLOUD_URL);
    assert_eq!(settings.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    assert!(settings.data_path.ends_with("hvac_stability"));
    assert_eq!(settings.env_credentials(), None);
}

#[test]
fn given_config_file_when_loading_then_file_values_replace_defaults() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("data");
    let path = config_file(
        &temp,
        &format!(
            "data_path = {:?}\ncloud_url = \"http://localhost:9000\"\nrequest_timeout_secs = 3\n",
            data.display().to_string()
        ),
    );

    let settings = Settings::load_with_env(Some(&path), env(&[])).unwrap();

    assert_eq!(settings.data_path, data);
    assert_eq!(settings.cloud_url, "http://localhost:9000");
    assert_eq!(settings.request_timeout_secs, 3);
    assert_eq!(settings.credentials_file(), data.join(".credentials"));
    assert_eq!(settings.devices_file(), data.join("devices.json"));
}

#[test]
fn given_file_and_env_when_loading_then_env_wins_per_key() {
    let temp = TempDir::new().unwrap();
    let path = config_file(
        &temp,
        "cloud_url = \"http://from-file\"\nrequest_timeout_secs = 3\n",
    );

    let settings = Settings::load_with_env(
        Some(&path),
        env(&[("KUMO_REQUEST_TIMEOUT_SECS", "30"), ("KUMO_DATA_PATH", "/tmp/kumo-env")]),
    )
    .unwrap();

    assert_eq!(settings.cloud_url, "http://from-file");
    assert_eq!(settings.request_timeout_secs, 30);
    assert_eq!(settings.data_path, PathBuf::from("/tmp/kumo-env"));
}

#[rstest]
#[case::both(&[("KUMO_AUTH_USERNAME", "alice"), ("KUMO_AUTH_PASSWORD", "pw")], Some(("alice", "pw")))]
#[case::username_only(&[("KUMO_AUTH_USERNAME", "alice")], None)]
#[case::password_only(&[("KUMO_AUTH_PASSWORD", "pw")], None)]
#[case::empty_value(&[("KUMO_AUTH_USERNAME", "alice"), ("KUMO_AUTH_PASSWORD", "")], None)]
fn given_auth_env_when_loading_then_credentials_need_both(
    #[case] pairs: &[(&str, &str)],
    #[case] expected: Option<(&str, &str)>,
) {
    let temp = TempDir::new().unwrap();
    let path = config_file(&temp, "");

    let settings = Settings::load_with_env(Some(&path), env(pairs)).unwrap();

    assert_eq!(settings.env_credentials(), expected);
}

#[test]
fn given_missing_explicit_config_when_loading_then_config_error() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("nope.toml");

    let err = Settings::load_with_env(Some(&missing), env(&[])).unwrap_err();

    assert!(matches!(err, ApplicationError::Config { .. }));
}

#[test]
fn given_invalid_toml_when_loading_then_config_error() {
    let temp = TempDir::new().unwrap();
    let path = config_file(&temp, "request_timeout_secs = \"soon\"\n");

    let err = Settings::load_with_env(Some(&path), env(&[])).unwrap_err();

    assert!(matches!(err, ApplicationError::Config { .. }));
}

#[test]
fn given_non_numeric_timeout_env_when_loading_then_config_error() {
    let temp = TempDir::new().unwrap();
    let path = config_file(&temp, "");

    let err = Settings::load_with_env(Some(&path), env(&[("KUMO_REQUEST_TIMEOUT_SECS", "ten")]))
        .unwrap_err();

    assert!(err.to_string().contains("KUMO_REQUEST_TIMEOUT_SECS"));
}

#[test]
fn given_env_password_when_showing_then_masked() {
    let temp = TempDir::new().unwrap();
    let path = config_file(&temp, "");
    let settings = Settings::load_with_env(
        Some(&path),
        env(&[("KUMO_AUTH_USERNAME", "alice"), ("KUMO_AUTH_PASSWORD", "hunter2")]),
    )
    .unwrap();

    let shown = settings.to_toml().unwrap();

    assert!(shown.contains("alice"));
    assert!(!shown.contains("hunter2"));
    assert!(shown.contains("********"));
}
