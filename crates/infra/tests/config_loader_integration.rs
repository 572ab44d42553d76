//! Integration tests for configuration loader
//!
//! Tests the end-to-end behavior of loading configuration from files and
//! handing it to a client.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use forcelink_core::testing::ScriptedRemote;
use forcelink_domain::ForceLinkError;
use forcelink_infra::{config, ForceLinkClient};
use tempfile::NamedTempFile;

fn write_config(contents: &str, extension: &str) -> std::path::PathBuf {
    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    temp_file.write_all(contents.as_bytes()).expect("Failed to write to temp file");
    let path = temp_file.path().with_extension(extension);
    std::fs::copy(temp_file.path(), &path).expect("Failed to copy file");
    path
}

#[test]
fn test_load_config_from_json_file() {
    let path = write_config(
        r#"{
            "endpoint": "https://login.example.com/services/Soap/c/20.0",
            "username": "integration@example.com",
            "password": "secret",
            "securityToken": "TOKEN",
            "connectionTimeout": 10000,
            "maxRetries": 2,
            "failOnBoot": false,
            "externalIdField": "Legacy_Id__c",
            "compression": false
        }"#,
        "json",
    );

    let config = config::load_from_file(Some(path.clone())).expect("config should load");

    assert_eq!(config.username, "integration@example.com");
    assert_eq!(config.login_secret(), "secretTOKEN");
    assert_eq!(config.connection_timeout, Duration::from_secs(10));
    assert_eq!(config.max_retries, 2);
    assert!(!config.fail_on_boot);
    assert_eq!(config.external_id_field, "Legacy_Id__c");
    assert!(!config.transport().compression);

    std::fs::remove_file(path).ok();
}

#[test]
fn test_load_config_from_toml_file_applies_defaults() {
    let path = write_config(
        r#"
endpoint = "https://login.example.com/services/Soap/c/20.0"
username = "integration@example.com"
password = "secret"
"#,
        "toml",
    );

    let config = config::load_from_file(Some(path.clone())).expect("config should load");

    assert_eq!(config.max_retries, 1);
    assert!(config.fail_on_boot);
    assert!(config.compression);
    assert_eq!(config.connection_timeout, Duration::from_secs(30));
    assert_eq!(config.external_id_field, "External_Id__c");

    std::fs::remove_file(path).ok();
}

#[test]
fn test_missing_required_field_is_config_error() {
    let path = write_config(r#"{ "endpoint": "https://login.example.com" }"#, "json");

    let err = config::load_from_file(Some(path.clone())).unwrap_err();
    assert!(matches!(err, ForceLinkError::Config(msg) if msg.contains("JSON")));

    std::fs::remove_file(path).ok();
}

#[tokio::test]
async fn test_loaded_config_drives_client() {
    let path = write_config(
        r#"{
            "endpoint": "https://login.example.com/services/Soap/c/20.0",
            "username": "integration@example.com",
            "password": "secret",
            "maxRetries": 0
        }"#,
        "json",
    );
    let config = config::load_from_file(Some(path.clone())).expect("config should load");
    std::fs::remove_file(path).ok();

    let remote = Arc::new(ScriptedRemote::new());
    let client = ForceLinkClient::new(remote, config).expect("client should build");

    assert_eq!(client.connector().config().max_retries, 0);
}
