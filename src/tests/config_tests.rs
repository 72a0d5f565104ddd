//! Tests for the configuration module.

use crate::config::rpc::{CommType, DEFAULT_MAX_REQUEST_SIZE};
use crate::config::{ConfigLoader, RpcdConfig, Validate};
use crate::tests::test_utils::TestFixture;
use std::fs;
use tempfile::tempdir;

/// Test that default configuration can be created and is valid.
#[test]
fn test_default_config_is_valid() {
    let config = RpcdConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.rpc.comm_config.incoming_request_max_size, DEFAULT_MAX_REQUEST_SIZE);
    assert_eq!(config.rpc.comm_type, CommType::LocalStreamSocket);
}

/// Test that configuration validation catches invalid values.
#[test]
fn test_config_validation() {
    let mut config = RpcdConfig::default();

    config.rpc.comm_config.backlog = 0;
    assert!(config.validate().is_err());
    config.rpc.comm_config.backlog = 5;

    config.rpc.comm_config.incoming_request_max_size = 0;
    assert!(config.validate().is_err());
    config.rpc.comm_config.incoming_request_max_size = DEFAULT_MAX_REQUEST_SIZE;

    config.log.level = "not-a-level".to_string();
    assert!(config.validate().is_err());
}

/// Test loading configuration from a file.
#[test]
fn test_load_config_from_file() {
    std::env::remove_var("TEST_FILE__RPC__ENABLED");

    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config_file_test.toml");

    let config_content = r#"
    [rpc]
    enabled = true

    [rpc.comm_config]
    sock_path_name = "/tmp/custom.sock"
    lock_path_name = "/tmp/custom.lock"
    backlog = 16
    max_retry_on_transient_errors = 8
    restricted_api = false
    incoming_request_max_size = 65536

    [log]
    level = "debug"
    json = true
    source_location = false
    "#;

    fs::write(&config_path, config_content).unwrap();

    let loader = ConfigLoader::new(Some(&config_path), "TEST_FILE");
    let config = loader.load().unwrap();

    assert_eq!(config.rpc.comm_config.backlog, 16);
    assert_eq!(config.rpc.comm_config.sock_path_name.to_str().unwrap(), "/tmp/custom.sock");
    assert_eq!(config.log.level, "debug");
    assert!(config.log.json);
}

/// Test loading configuration with environment variable overrides.
#[test]
fn test_env_var_override() {
    let mut fixture = TestFixture::new().unwrap();
    let config_path = fixture
        .create_file("[rpc]\nenabled = true\n", ".toml")
        .unwrap();

    fixture.set_env("TEST_ENV__LOG__LEVEL", "warn");
    fixture.set_env("TEST_ENV__RPC__COMM_CONFIG__BACKLOG", "32");

    let loader = ConfigLoader::new(Some(&config_path), "TEST_ENV");
    let config = loader.load().unwrap();

    assert_eq!(config.log.level, "warn");
    assert_eq!(config.rpc.comm_config.backlog, 32);
}

/// Test that loading an invalid configuration file returns an error.
#[test]
fn test_load_invalid_config() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("invalid.toml");

    let config_content = r#"
    [rpc
    enabled = true"
    "#;

    fs::write(&config_path, config_content).unwrap();

    let loader = ConfigLoader::new(Some(&config_path), "TEST_INVALID");
    assert!(loader.load().is_err());
}

/// Test that validation fails for various invalid communication settings.
#[test]
fn test_comm_config_validation_rules() {
    use crate::config::rpc::CommConfig;

    let mut comm_config = CommConfig::default();
    comm_config.backlog = -1;
    assert!(comm_config.validate().is_err());

    let mut comm_config = CommConfig::default();
    comm_config.incoming_request_max_size = 0;
    assert!(comm_config.validate().is_err());
}
