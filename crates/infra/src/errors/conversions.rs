//! Conversions from external infrastructure errors into domain errors.
//!
//! `VaultError` lives in the domain crate and the source errors live in
//! third-party crates, so the conversions go through the [`InfraError`]
//! newtype to satisfy the orphan rule.

use reqwest::Error as HttpError;
use serde_json::Error as JsonError;
use thiserror::Error;
use vaultlink_domain::{ErrorKind, VaultError};

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct InfraError(pub VaultError);

impl From<InfraError> for VaultError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<VaultError> for InfraError {
    fn from(value: VaultError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoVaultError {
    fn into_vault(self) -> VaultError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → VaultError */
/* -------------------------------------------------------------------------- */

impl IntoVaultError for HttpError {
    fn into_vault(self) -> VaultError {
        // Path only: query strings may carry identifiers callers did not mean
        // to log.
        let path = self.url().map(|url| url.path().to_string());

        let err = if self.is_timeout() {
            VaultError::timeout("request timed out")
        } else if self.is_connect() {
            let host = self.url().and_then(|url| url.host_str()).unwrap_or("unknown host");
            VaultError::network(format!("failed to connect to {host}"))
        } else if let Some(status) = self.status() {
            VaultError::api(format!("HTTP {}", status.as_u16()), status.as_u16(), serde_json::Value::Null)
        } else if self.is_builder() {
            VaultError::validation(format!("invalid HTTP request: {self}"))
        } else if self.is_decode() || self.is_body() {
            VaultError::new(ErrorKind::Api, format!("failed to read response body: {self}"))
        } else {
            VaultError::network(format!("HTTP request failed: {self}"))
        };

        match path {
            Some(path) => err.with_context("url_path", path),
            None => err,
        }
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_vault())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → VaultError */
/* -------------------------------------------------------------------------- */

impl IntoVaultError for JsonError {
    fn into_vault(self) -> VaultError {
        VaultError::validation(format!("invalid JSON: {self}"))
            .with_context("line", self.line().to_string())
            .with_context("column", self.column().to_string())
    }
}

impl From<JsonError> for InfraError {
    fn from(value: JsonError) -> Self {
        InfraError(value.into_vault())
    }
}

/* -------------------------------------------------------------------------- */
/* toml::de::Error → VaultError */
/* -------------------------------------------------------------------------- */

impl IntoVaultError for toml::de::Error {
    fn into_vault(self) -> VaultError {
        VaultError::configuration(format!("invalid TOML format: {}", self.message()))
    }
}

impl From<toml::de::Error> for InfraError {
    fn from(value: toml::de::Error) -> Self {
        InfraError(value.into_vault())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → VaultError */
/* -------------------------------------------------------------------------- */

impl IntoVaultError for std::io::Error {
    fn into_vault(self) -> VaultError {
        use std::io::ErrorKind as IoKind;

        match self.kind() {
            IoKind::TimedOut => VaultError::timeout(self.to_string()),
            IoKind::ConnectionRefused | IoKind::ConnectionReset | IoKind::ConnectionAborted => {
                VaultError::network(self.to_string())
            }
            IoKind::NotFound => VaultError::new(ErrorKind::NotFound, self.to_string()),
            _ => VaultError::configuration(format!("I/O error: {self}")),
        }
    }
}

impl From<std::io::Error> for InfraError {
    fn from(value: std::io::Error) -> Self {
        InfraError(value.into_vault())
    }
}
