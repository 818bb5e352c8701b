//! Configuration structures
//!
//! Settings are immutable once loaded. [`Config::validate`] runs eagerly and
//! reports every problem in a single `VaultError::Configuration`.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_API_VERSION, DEFAULT_INITIAL_BACKOFF_MS, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_BACKOFF_MS,
    DEFAULT_REFRESH_THRESHOLD_SECS, DEFAULT_TIMEOUT_SECS,
};
use crate::errors::{Result, VaultError};

/// Authentication strategy selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// Username/password login against the session endpoint.
    #[default]
    Password,
    /// OAuth/OIDC login. Parsed but not yet supported by any authenticator.
    #[serde(rename = "oauth", alias = "oidc")]
    OAuth,
}

impl AuthMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Password => "password",
            Self::OAuth => "oauth",
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AuthMode {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "password" | "basic" => Ok(Self::Password),
            "oauth" | "oidc" => Ok(Self::OAuth),
            other => Err(VaultError::configuration(format!("unknown auth mode '{other}'"))
                .with_context("field", "auth_mode")),
        }
    }
}

/// Login credentials. `Debug` never prints the password.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
}

impl Credentials {
    pub fn password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: Some(username.into()), password: Some(password.into()), client_id: None }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("client_id", &self.client_id)
            .finish()
    }
}

/// Transport timeout and retry budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff_ms: DEFAULT_INITIAL_BACKOFF_MS,
            max_backoff_ms: DEFAULT_MAX_BACKOFF_MS,
        }
    }
}

impl HttpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_refresh_threshold_secs() -> u64 {
    DEFAULT_REFRESH_THRESHOLD_SECS
}

/// Top-level client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Vault host, with or without scheme (e.g. `myvault.example.com`).
    #[serde(default)]
    pub endpoint: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default)]
    pub auth_mode: AuthMode,
    #[serde(default)]
    pub credentials: Credentials,
    #[serde(default)]
    pub http: HttpSettings,
    /// Response cache toggle. Reserved; nothing reads it yet.
    #[serde(default)]
    pub cache_enabled: bool,
    /// Client-side rate limiting toggle. Reserved; nothing reads it yet.
    #[serde(default)]
    pub rate_limit_enabled: bool,
    #[serde(default = "default_refresh_threshold_secs")]
    pub refresh_threshold_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_version: default_api_version(),
            auth_mode: AuthMode::default(),
            credentials: Credentials::default(),
            http: HttpSettings::default(),
            cache_enabled: false,
            rate_limit_enabled: false,
            refresh_threshold_secs: default_refresh_threshold_secs(),
        }
    }
}

fn is_blank(value: Option<&String>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

impl Config {
    /// Password-mode configuration with default transport settings.
    pub fn password(
        endpoint: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            credentials: Credentials::password(username, password),
            ..Self::default()
        }
    }

    /// Names of required fields that are absent for the selected auth mode.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.endpoint.trim().is_empty() {
            missing.push("endpoint");
        }
        missing.extend(self.missing_credential_fields());
        missing
    }

    /// Credential fields required by `auth_mode` that are absent.
    pub fn missing_credential_fields(&self) -> Vec<&'static str> {
        let creds = &self.credentials;
        let mut missing = Vec::new();
        match self.auth_mode {
            AuthMode::Password => {
                if is_blank(creds.username.as_ref()) {
                    missing.push("username");
                }
                if is_blank(creds.password.as_ref()) {
                    missing.push("password");
                }
            }
            AuthMode::OAuth => {
                if is_blank(creds.client_id.as_ref()) {
                    missing.push("client_id");
                }
            }
        }
        missing
    }

    /// Validate every field in one pass.
    ///
    /// # Errors
    /// Returns `VaultError::Configuration` listing all missing or invalid
    /// fields in its message and in the `missing_fields` / `invalid_fields`
    /// context entries.
    pub fn validate(&self) -> Result<()> {
        let missing = self.missing_fields();

        let mut invalid = Vec::new();
        if self.http.max_attempts == 0 {
            invalid.push("http.max_attempts");
        }
        if self.http.timeout_secs == 0 {
            invalid.push("http.timeout_secs");
        }
        if self.http.initial_backoff_ms > self.http.max_backoff_ms {
            invalid.push("http.initial_backoff_ms");
        }
        if self.api_version.trim().is_empty() {
            invalid.push("api_version");
        }
        if !self.endpoint.trim().is_empty() && url::Url::parse(&self.normalized_endpoint()).is_err()
        {
            invalid.push("endpoint");
        }

        if missing.is_empty() && invalid.is_empty() {
            return Ok(());
        }

        let mut problems = Vec::new();
        if !missing.is_empty() {
            problems.push(format!("missing required fields: {}", missing.join(", ")));
        }
        if !invalid.is_empty() {
            problems.push(format!("invalid fields: {}", invalid.join(", ")));
        }

        let mut err = VaultError::configuration(problems.join("; "))
            .with_context("auth_mode", self.auth_mode.as_str());
        if !missing.is_empty() {
            err = err.with_context("missing_fields", missing.join(","));
        }
        if !invalid.is_empty() {
            err = err.with_context("invalid_fields", invalid.join(","));
        }
        Err(err)
    }

    /// Endpoint with a scheme (`https://` when none given) and no trailing
    /// slash.
    pub fn normalized_endpoint(&self) -> String {
        normalize_endpoint(&self.endpoint)
    }

    /// Versioned API root, e.g. `https://myvault.example.com/api/v24.1`.
    pub fn api_root(&self) -> String {
        format!("{}/api/{}", self.normalized_endpoint(), self.api_version.trim_matches('/'))
    }

    pub fn refresh_threshold(&self) -> Duration {
        Duration::from_secs(self.refresh_threshold_secs)
    }
}

/// Prefix `https://` when `endpoint` carries no scheme and trim trailing
/// slashes.
pub fn normalize_endpoint(endpoint: &str) -> String {
    let trimmed = endpoint.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}
