//! Configuration loader
//!
//! Loads client configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Reads a `.env` file from the working directory when present
//! 2. Attempts to load from environment variables
//! 3. If `VAULTLINK_ENDPOINT` is absent, falls back to a config file
//! 4. Supports JSON and TOML formats
//!
//! Every configuration returned from this module has passed
//! [`Config::validate`].
//!
//! ## Environment Variables
//! - `VAULTLINK_ENDPOINT`: Vault host (required for env loading)
//! - `VAULTLINK_API_VERSION`: API version segment, e.g. `v24.1`
//! - `VAULTLINK_AUTH_MODE`: `password` (default) or `oauth`
//! - `VAULTLINK_USERNAME` / `VAULTLINK_PASSWORD`: password credentials
//! - `VAULTLINK_CLIENT_ID`: OAuth client id
//! - `VAULTLINK_TIMEOUT_SECS`: per-attempt request timeout
//! - `VAULTLINK_MAX_ATTEMPTS`: total attempts per request
//! - `VAULTLINK_CACHE_ENABLED` / `VAULTLINK_RATE_LIMIT_ENABLED`: toggles
//!   (true/false)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./vaultlink.json` or `./vaultlink.toml`
//! 2. `./config.json` or `./config.toml`
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};
use std::str::FromStr;

use vaultlink_domain::{AuthMode, Config, Credentials, ErrorKind, Result, VaultError};

use crate::errors::InfraError;

pub const ENV_ENDPOINT: &str = "VAULTLINK_ENDPOINT";
pub const ENV_API_VERSION: &str = "VAULTLINK_API_VERSION";
pub const ENV_AUTH_MODE: &str = "VAULTLINK_AUTH_MODE";
pub const ENV_USERNAME: &str = "VAULTLINK_USERNAME";
pub const ENV_PASSWORD: &str = "VAULTLINK_PASSWORD";
pub const ENV_CLIENT_ID: &str = "VAULTLINK_CLIENT_ID";
pub const ENV_TIMEOUT_SECS: &str = "VAULTLINK_TIMEOUT_SECS";
pub const ENV_MAX_ATTEMPTS: &str = "VAULTLINK_MAX_ATTEMPTS";
pub const ENV_CACHE_ENABLED: &str = "VAULTLINK_CACHE_ENABLED";
pub const ENV_RATE_LIMIT_ENABLED: &str = "VAULTLINK_RATE_LIMIT_ENABLED";

const CONFIG_FILE_NAMES: [&str; 4] =
    ["vaultlink.json", "vaultlink.toml", "config.json", "config.toml"];

/// Load configuration with automatic fallback strategy
///
/// Uses environment variables when `VAULTLINK_ENDPOINT` is set; otherwise
/// falls back to a config file.
///
/// # Errors
/// Returns `VaultError::Configuration` if:
/// - The environment names an endpoint but is otherwise invalid
/// - No endpoint is set and no config file can be loaded
/// - File format is invalid
/// - Required fields are missing
pub fn load() -> Result<Config> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }
    load_with_lookup(|key| std::env::var(key).ok())
}

/// [`load`] over an arbitrary variable source.
///
/// Once `lookup` yields an endpoint the environment is authoritative and
/// its errors are returned as-is; the file fallback only runs when no
/// endpoint is set.
///
/// # Errors
/// Same as [`load`].
pub fn load_with_lookup<F>(lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let has_endpoint = lookup(ENV_ENDPOINT).is_some_and(|value| !value.trim().is_empty());
    if !has_endpoint {
        tracing::debug!("{ENV_ENDPOINT} not set, loading configuration from file");
        return load_from_file(None);
    }

    let config = load_from_lookup(lookup)?;
    tracing::info!("Configuration loaded from environment variables");
    Ok(config)
}

/// Load configuration from the process environment (plus `.env`).
///
/// # Errors
/// Returns `VaultError::Configuration` if `VAULTLINK_ENDPOINT` is unset, a
/// numeric or enum variable cannot be parsed, or validation fails.
pub fn load_from_env() -> Result<Config> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }
    load_from_lookup(|key| std::env::var(key).ok())
}

/// Build a configuration from an arbitrary variable source.
///
/// `lookup` returns the value of a variable or `None` when unset.
///
/// # Errors
/// Same as [`load_from_env`].
pub fn load_from_lookup<F>(lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    let endpoint = var(ENV_ENDPOINT).ok_or_else(|| {
        VaultError::configuration(format!("Missing required environment variable: {ENV_ENDPOINT}"))
            .with_context("variable", ENV_ENDPOINT)
    })?;

    let mut config = Config {
        endpoint,
        credentials: Credentials {
            username: var(ENV_USERNAME),
            password: var(ENV_PASSWORD),
            client_id: var(ENV_CLIENT_ID),
        },
        ..Config::default()
    };

    if let Some(version) = var(ENV_API_VERSION) {
        config.api_version = version;
    }
    if let Some(mode) = var(ENV_AUTH_MODE) {
        config.auth_mode = parse_var::<AuthMode>(ENV_AUTH_MODE, &mode)?;
    }
    if let Some(timeout) = var(ENV_TIMEOUT_SECS) {
        config.http.timeout_secs = parse_var(ENV_TIMEOUT_SECS, &timeout)?;
    }
    if let Some(attempts) = var(ENV_MAX_ATTEMPTS) {
        config.http.max_attempts = parse_var(ENV_MAX_ATTEMPTS, &attempts)?;
    }
    config.cache_enabled = var(ENV_CACHE_ENABLED).map_or(false, |value| parse_bool(&value));
    config.rate_limit_enabled =
        var(ENV_RATE_LIMIT_ENABLED).map_or(false, |value| parse_bool(&value));

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations. Format is detected
/// by file extension.
///
/// # Errors
/// Returns `VaultError::Configuration` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(VaultError::configuration(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            VaultError::configuration("No config file found in any of the standard locations")
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| VaultError::from(InfraError::from(e)).relabel(ErrorKind::Configuration))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content without validating it.
///
/// Format is detected by the extension of `path` (`.json` or `.toml`).
///
/// # Errors
/// Returns `VaultError::Configuration` if the format is unsupported or
/// parsing fails.
pub fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    let parsed: Result<Config> = match extension {
        "toml" => toml::from_str(contents).map_err(|e| InfraError::from(e).into()),
        "json" => serde_json::from_str(contents).map_err(|e| InfraError::from(e).into()),
        _ => {
            return Err(VaultError::configuration(format!(
                "Unsupported config format: {extension}"
            )))
        }
    };

    parsed.map_err(|e| {
        e.relabel(ErrorKind::Configuration).with_context("path", path.display().to_string())
    })
}

/// Probe the standard locations for a configuration file.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(CONFIG_FILE_NAMES.iter().map(|name| cwd.join(name)));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(CONFIG_FILE_NAMES.iter().map(|name| exe_dir.join(name)));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn parse_var<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse::<T>().map_err(|e| {
        VaultError::configuration(format!("Invalid value for {key}: {e}"))
            .with_context("variable", key)
    })
}

/// Parse a boolean toggle.
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
