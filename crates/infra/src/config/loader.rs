//! Configuration loader
//!
//! Loads [`ClientConfig`] from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Reads a `.env` file from the working directory, if present
//! 2. Attempts to load from `FORCELINK_*` environment variables
//! 3. If incomplete, falls back to loading from file
//! 4. Probes multiple paths for config files (JSON or TOML)
//!
//! Every loaded configuration is validated before it is returned.
//!
//! ## Environment Variables
//! - `FORCELINK_ENDPOINT`: Login endpoint URL (required)
//! - `FORCELINK_USERNAME`: Login user name (required)
//! - `FORCELINK_PASSWORD`: Password (required)
//! - `FORCELINK_SECURITY_TOKEN`: Token appended to the password
//! - `FORCELINK_CONNECTION_TIMEOUT_MS`: Per-call timeout in milliseconds
//! - `FORCELINK_MAX_RETRIES`: Session refreshes allowed per call
//! - `FORCELINK_FAIL_ON_BOOT`: Whether a failed first login is fatal
//! - `FORCELINK_EXTERNAL_ID_FIELD`: Field upserts match on
//! - `FORCELINK_COMPRESSION`: Whether to request compressed transport
//!
//! ## File Locations
//! The loader probes `forcelink.{json,toml}` and `config.{json,toml}` in the
//! current directory, its two parents, and next to the executable.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use forcelink_common::CommonError;
use forcelink_domain::constants::ENV_PREFIX;
use forcelink_domain::{ClientConfig, ForceLinkError, Result};
use tracing::{debug, info};

const FILE_STEMS: [&str; 2] = ["forcelink", "config"];
const FILE_EXTENSIONS: [&str; 2] = ["json", "toml"];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables (after reading any
/// `.env` file). If a required variable is missing, falls back to a config
/// file.
///
/// # Errors
/// Returns `ForceLinkError::Config` if no source yields a valid
/// configuration.
pub fn load() -> Result<ClientConfig> {
    if let Ok(path) = dotenvy::dotenv() {
        debug!(path = %path.display(), "Loaded .env file");
    }

    match load_from_env() {
        Ok(config) => {
            info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from `FORCELINK_*` environment variables
///
/// Endpoint, username and password are required; everything else falls back
/// to the [`ClientConfig`] defaults.
///
/// # Errors
/// Returns `ForceLinkError::Config` if required variables are missing, a
/// value cannot be parsed, or validation fails.
pub fn load_from_env() -> Result<ClientConfig> {
    let mut config =
        ClientConfig::new(env_var("ENDPOINT")?, env_var("USERNAME")?, env_var("PASSWORD")?);

    if let Some(token) = optional_env("SECURITY_TOKEN") {
        config.security_token = token;
    }
    if let Some(millis) = env_parse::<u64>("CONNECTION_TIMEOUT_MS")? {
        config.connection_timeout = Duration::from_millis(millis);
    }
    if let Some(max_retries) = env_parse::<u32>("MAX_RETRIES")? {
        config.max_retries = max_retries;
    }
    if let Some(field) = optional_env("EXTERNAL_ID_FIELD") {
        config.external_id_field = field;
    }
    config.fail_on_boot = env_bool("FAIL_ON_BOOT", config.fail_on_boot);
    config.compression = env_bool("COMPRESSION", config.compression);

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations via
/// [`probe_config_paths`]. The format is chosen by file extension.
///
/// # Errors
/// Returns `ForceLinkError::Config` if the file is missing or unreadable, its
/// format is invalid, or validation fails.
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ForceLinkError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            ForceLinkError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| ForceLinkError::Config(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => Ok(toml::from_str(contents).map_err(CommonError::from)?),
        "json" => Ok(serde_json::from_str(contents).map_err(CommonError::from)?),
        _ => Err(CommonError::config_field("format", format!("unsupported extension {extension}"))
            .into()),
    }
}

/// Probe the standard locations for a configuration file
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.extend([cwd.clone(), cwd.join(".."), cwd.join("../..")]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.extend([exe_dir.to_path_buf(), exe_dir.join(".."), exe_dir.join("../..")]);
        }
    }

    roots
        .iter()
        .flat_map(|root| {
            FILE_STEMS.iter().flat_map(move |stem| {
                FILE_EXTENSIONS.iter().map(move |ext| root.join(format!("{stem}.{ext}")))
            })
        })
        .find(|path| path.exists())
}

fn env_key(key: &str) -> String {
    format!("{ENV_PREFIX}{key}")
}

fn env_var(key: &str) -> Result<String> {
    let key = env_key(key);
    std::env::var(&key).map_err(|_| {
        ForceLinkError::Config(format!("Missing required environment variable: {key}"))
    })
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(env_key(key)).ok()
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    optional_env(key)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| {
                ForceLinkError::Config(format!("Invalid value for {}: {e}", env_key(key)))
            })
        })
        .transpose()
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    optional_env(key)
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use tempfile::NamedTempFile;

    use super::*;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const VARS: [&str; 9] = [
        "FORCELINK_ENDPOINT",
        "FORCELINK_USERNAME",
        "FORCELINK_PASSWORD",
        "FORCELINK_SECURITY_TOKEN",
        "FORCELINK_CONNECTION_TIMEOUT_MS",
        "FORCELINK_MAX_RETRIES",
        "FORCELINK_FAIL_ON_BOOT",
        "FORCELINK_EXTERNAL_ID_FIELD",
        "FORCELINK_COMPRESSION",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    fn set_required() {
        std::env::set_var("FORCELINK_ENDPOINT", "https://login.example.com/services/Soap/c/20.0");
        std::env::set_var("FORCELINK_USERNAME", "integration@example.com");
        std::env::set_var("FORCELINK_PASSWORD", "secret");
    }

    fn temp_config(contents: &str, extension: &str) -> (NamedTempFile, PathBuf) {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(contents.as_bytes()).unwrap();
        let path = temp_file.path().with_extension(extension);
        std::fs::copy(temp_file.path(), &path).unwrap();
        (temp_file, path)
    }

    #[test]
    fn test_env_bool_parsing() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        for value in ["1", "true", "YES", "on"] {
            std::env::set_var("FORCELINK_COMPRESSION", value);
            assert!(env_bool("COMPRESSION", false), "{value} should parse as true");
        }
        for value in ["0", "false", "no", "off"] {
            std::env::set_var("FORCELINK_COMPRESSION", value);
            assert!(!env_bool("COMPRESSION", true), "{value} should parse as false");
        }

        std::env::remove_var("FORCELINK_COMPRESSION");
        assert!(env_bool("COMPRESSION", true));
        assert!(!env_bool("COMPRESSION", false));
    }

    #[test]
    fn test_load_from_env_uses_defaults_for_optional_vars() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        set_required();

        let config = load_from_env().unwrap();

        assert_eq!(config.username, "integration@example.com");
        assert_eq!(config.security_token, "");
        assert_eq!(config.max_retries, 1);
        assert!(config.fail_on_boot);
        assert_eq!(config.connection_timeout, Duration::from_secs(30));
        assert_eq!(config.external_id_field, "External_Id__c");

        clear_env();
    }

    #[test]
    fn test_load_from_env_all_vars_set() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        set_required();
        std::env::set_var("FORCELINK_SECURITY_TOKEN", "TOKEN");
        std::env::set_var("FORCELINK_CONNECTION_TIMEOUT_MS", "2500");
        std::env::set_var("FORCELINK_MAX_RETRIES", "3");
        std::env::set_var("FORCELINK_FAIL_ON_BOOT", "false");
        std::env::set_var("FORCELINK_EXTERNAL_ID_FIELD", "Legacy_Id__c");
        std::env::set_var("FORCELINK_COMPRESSION", "off");

        let config = load_from_env().unwrap();

        assert_eq!(config.login_secret(), "secretTOKEN");
        assert_eq!(config.connection_timeout, Duration::from_millis(2500));
        assert_eq!(config.max_retries, 3);
        assert!(!config.fail_on_boot);
        assert_eq!(config.external_id_field, "Legacy_Id__c");
        assert!(!config.compression);

        clear_env();
    }

    #[test]
    fn test_load_from_env_missing_var() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        let err = load_from_env().unwrap_err();
        assert!(matches!(&err, ForceLinkError::Config(msg) if msg.contains("FORCELINK_ENDPOINT")));
    }

    #[test]
    fn test_load_from_env_invalid_number() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        set_required();
        std::env::set_var("FORCELINK_MAX_RETRIES", "many");

        let err = load_from_env().unwrap_err();
        assert!(matches!(&err, ForceLinkError::Config(msg) if msg.contains("FORCELINK_MAX_RETRIES")));

        clear_env();
    }

    #[test]
    fn test_load_from_env_rejects_blank_username() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        set_required();
        std::env::set_var("FORCELINK_USERNAME", "  ");

        assert!(matches!(load_from_env(), Err(ForceLinkError::Config(_))));

        clear_env();
    }

    #[test]
    fn test_load_from_file_json() {
        let (_temp, path) = temp_config(
            r#"{
                "endpoint": "https://login.example.com/services/Soap/c/20.0",
                "username": "integration@example.com",
                "password": "secret",
                "connectionTimeout": 1500,
                "maxRetries": 2
            }"#,
            "json",
        );

        let config = load_from_file(Some(path.clone())).unwrap();
        assert_eq!(config.connection_timeout, Duration::from_millis(1500));
        assert_eq!(config.max_retries, 2);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_from_file_toml() {
        let (_temp, path) = temp_config(
            r#"
endpoint = "https://login.example.com/services/Soap/c/20.0"
username = "integration@example.com"
password = "secret"
securityToken = "TOKEN"
failOnBoot = false
"#,
            "toml",
        );

        let config = load_from_file(Some(path.clone())).unwrap();
        assert_eq!(config.security_token, "TOKEN");
        assert!(!config.fail_on_boot);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_from_file_not_found() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/forcelink.json")));
        assert!(matches!(result, Err(ForceLinkError::Config(_))));
    }

    #[test]
    fn test_load_from_file_validates() {
        let (_temp, path) = temp_config(
            r#"{ "endpoint": "", "username": "u", "password": "p" }"#,
            "json",
        );

        assert!(matches!(load_from_file(Some(path.clone())), Err(ForceLinkError::Config(_))));

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_parse_config_unsupported_format() {
        let result = parse_config("endpoint: x", Path::new("forcelink.yaml"));
        assert!(matches!(result, Err(ForceLinkError::Config(msg)) if msg.contains("yaml")));
    }
}
