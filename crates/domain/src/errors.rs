//! Error types used throughout the workspace
//!
//! [`VaultError`] is a closed set of kinds. Every variant carries an
//! [`ErrorDetails`] payload (human message, machine code, context map);
//! `RateLimit` adds a retry-after duration and `Api` adds the HTTP status and
//! raw response body.
//!
//! Context maps are logged verbatim, so they must never hold secrets.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::DEFAULT_RETRY_AFTER_SECS;

/// Fieldless mirror of the [`VaultError`] variants.
///
/// Used by the error classifier's static code table and as a stable label
/// for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Authentication,
    Authorization,
    Validation,
    NotFound,
    RateLimit,
    Api,
    Configuration,
    Timeout,
    SessionExpired,
    Network,
    QuerySyntax,
    FieldNotFound,
    InvalidState,
}

impl ErrorKind {
    /// Machine code used when the backend did not supply one.
    pub const fn default_code(self) -> &'static str {
        match self {
            Self::Authentication => "AUTHENTICATION_ERROR",
            Self::Authorization => "AUTHORIZATION_ERROR",
            Self::Validation => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::RateLimit => "RATE_LIMIT_EXCEEDED",
            Self::Api => "API_ERROR",
            Self::Configuration => "CONFIGURATION_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::SessionExpired => "SESSION_EXPIRED",
            Self::Network => "NETWORK_ERROR",
            Self::QuerySyntax => "QUERY_SYNTAX_ERROR",
            Self::FieldNotFound => "FIELD_NOT_FOUND",
            Self::InvalidState => "INVALID_STATE",
        }
    }

    /// Stable snake_case label suitable for logs and metrics.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Authentication => "authentication",
            Self::Authorization => "authorization",
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::RateLimit => "rate_limit",
            Self::Api => "api",
            Self::Configuration => "configuration",
            Self::Timeout => "timeout",
            Self::SessionExpired => "session_expired",
            Self::Network => "network",
            Self::QuerySyntax => "query_syntax",
            Self::FieldNotFound => "field_not_found",
            Self::InvalidState => "invalid_state",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Payload shared by every error kind.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub message: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, String>,
}

impl ErrorDetails {
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self { message: message.into(), code: code.into(), context: BTreeMap::new() }
    }
}

impl fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.message, self.code)
    }
}

/// Main error type for VaultLink
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VaultError {
    #[error("Authentication error: {0}")]
    Authentication(ErrorDetails),

    #[error("Authorization error: {0}")]
    Authorization(ErrorDetails),

    #[error("Validation error: {0}")]
    Validation(ErrorDetails),

    #[error("Not found: {0}")]
    NotFound(ErrorDetails),

    #[error("Rate limit exceeded: {details} (retry after {}s)", .retry_after.as_secs())]
    RateLimit { details: ErrorDetails, retry_after: Duration },

    #[error("API error (HTTP {status}): {details}")]
    Api { details: ErrorDetails, status: u16, body: serde_json::Value },

    #[error("Configuration error: {0}")]
    Configuration(ErrorDetails),

    #[error("Timeout: {0}")]
    Timeout(ErrorDetails),

    #[error("Session expired: {0}")]
    SessionExpired(ErrorDetails),

    #[error("Network error: {0}")]
    Network(ErrorDetails),

    #[error("Query syntax error: {0}")]
    QuerySyntax(ErrorDetails),

    #[error("Field not found: {0}")]
    FieldNotFound(ErrorDetails),

    #[error("Invalid state: {0}")]
    InvalidState(ErrorDetails),
}

/// Result type alias for VaultLink operations
pub type Result<T> = std::result::Result<T, VaultError>;

impl VaultError {
    /// Build an error of `kind` with the kind's default machine code.
    ///
    /// `RateLimit` gets the default retry-after; `Api` gets status 0 and a
    /// null body. Use [`VaultError::rate_limit`] / [`VaultError::api`] when
    /// those values are known.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::from_details(kind, ErrorDetails::new(message, kind.default_code()))
    }

    /// Build an error of `kind` around existing details.
    pub fn from_details(kind: ErrorKind, details: ErrorDetails) -> Self {
        match kind {
            ErrorKind::Authentication => Self::Authentication(details),
            ErrorKind::Authorization => Self::Authorization(details),
            ErrorKind::Validation => Self::Validation(details),
            ErrorKind::NotFound => Self::NotFound(details),
            ErrorKind::RateLimit => Self::RateLimit {
                details,
                retry_after: Duration::from_secs(DEFAULT_RETRY_AFTER_SECS),
            },
            ErrorKind::Api => Self::Api { details, status: 0, body: serde_json::Value::Null },
            ErrorKind::Configuration => Self::Configuration(details),
            ErrorKind::Timeout => Self::Timeout(details),
            ErrorKind::SessionExpired => Self::SessionExpired(details),
            ErrorKind::Network => Self::Network(details),
            ErrorKind::QuerySyntax => Self::QuerySyntax(details),
            ErrorKind::FieldNotFound => Self::FieldNotFound(details),
            ErrorKind::InvalidState => Self::InvalidState(details),
        }
    }

    pub fn rate_limit(message: impl Into<String>, retry_after: Duration) -> Self {
        Self::RateLimit {
            details: ErrorDetails::new(message, ErrorKind::RateLimit.default_code()),
            retry_after,
        }
    }

    pub fn api(message: impl Into<String>, status: u16, body: serde_json::Value) -> Self {
        Self::Api { details: ErrorDetails::new(message, ErrorKind::Api.default_code()), status, body }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidState, message)
    }

    /// Replace the machine code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.details_mut().code = code.into();
        self
    }

    /// Attach a context entry. Never pass credentials here.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details_mut().context.insert(key.into(), value.into());
        self
    }

    /// Re-express this error as another kind, keeping message, code and
    /// context.
    #[must_use]
    pub fn relabel(self, kind: ErrorKind) -> Self {
        if self.kind() == kind {
            return self;
        }
        Self::from_details(kind, self.into_details())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Authentication(_) => ErrorKind::Authentication,
            Self::Authorization(_) => ErrorKind::Authorization,
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::RateLimit { .. } => ErrorKind::RateLimit,
            Self::Api { .. } => ErrorKind::Api,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::SessionExpired(_) => ErrorKind::SessionExpired,
            Self::Network(_) => ErrorKind::Network,
            Self::QuerySyntax(_) => ErrorKind::QuerySyntax,
            Self::FieldNotFound(_) => ErrorKind::FieldNotFound,
            Self::InvalidState(_) => ErrorKind::InvalidState,
        }
    }

    pub fn details(&self) -> &ErrorDetails {
        match self {
            Self::Authentication(d)
            | Self::Authorization(d)
            | Self::Validation(d)
            | Self::NotFound(d)
            | Self::Configuration(d)
            | Self::Timeout(d)
            | Self::SessionExpired(d)
            | Self::Network(d)
            | Self::QuerySyntax(d)
            | Self::FieldNotFound(d)
            | Self::InvalidState(d) => d,
            Self::RateLimit { details, .. } | Self::Api { details, .. } => details,
        }
    }

    fn details_mut(&mut self) -> &mut ErrorDetails {
        match self {
            Self::Authentication(d)
            | Self::Authorization(d)
            | Self::Validation(d)
            | Self::NotFound(d)
            | Self::Configuration(d)
            | Self::Timeout(d)
            | Self::SessionExpired(d)
            | Self::Network(d)
            | Self::QuerySyntax(d)
            | Self::FieldNotFound(d)
            | Self::InvalidState(d) => d,
            Self::RateLimit { details, .. } | Self::Api { details, .. } => details,
        }
    }

    fn into_details(self) -> ErrorDetails {
        match self {
            Self::Authentication(d)
            | Self::Authorization(d)
            | Self::Validation(d)
            | Self::NotFound(d)
            | Self::Configuration(d)
            | Self::Timeout(d)
            | Self::SessionExpired(d)
            | Self::Network(d)
            | Self::QuerySyntax(d)
            | Self::FieldNotFound(d)
            | Self::InvalidState(d) => d,
            Self::RateLimit { details, .. } | Self::Api { details, .. } => details,
        }
    }

    pub fn message(&self) -> &str {
        &self.details().message
    }

    pub fn code(&self) -> &str {
        &self.details().code
    }

    pub fn context(&self) -> &BTreeMap<String, String> {
        &self.details().context
    }

    /// HTTP status for `Api` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw response body for `Api` errors.
    pub fn body(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Api { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Server-suggested wait before retrying (`RateLimit` only).
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimit { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }

    /// Returns true if a caller may reasonably retry the same operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Network | ErrorKind::Timeout | ErrorKind::RateLimit)
    }
}
