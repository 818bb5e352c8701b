//! Concrete authenticators and the mode-based factory.

pub mod password;

use std::sync::Arc;

use vaultlink_common::{AuthManager, Authenticator};
use vaultlink_domain::{AuthMode, Config, Result, VaultError};

pub use password::PasswordAuthenticator;

/// Build the authenticator for `config.auth_mode`.
///
/// # Errors
/// Returns `VaultError::Configuration` when required credentials are missing
/// or the mode has no implementation.
pub fn build_authenticator(config: &Config) -> Result<Arc<dyn Authenticator>> {
    match config.auth_mode {
        AuthMode::Password => Ok(Arc::new(PasswordAuthenticator::new(config.clone())?)),
        AuthMode::OAuth => Err(VaultError::configuration(
            "auth mode 'oauth' is not supported by this client",
        )
        .with_context("auth_mode", AuthMode::OAuth.as_str())),
    }
}

/// Build an [`AuthManager`] using the authenticator and refresh threshold
/// from `config`.
///
/// # Errors
/// Same as [`build_authenticator`].
pub fn build_manager(config: &Config) -> Result<AuthManager> {
    let authenticator = build_authenticator(config)?;
    Ok(AuthManager::with_refresh_threshold(authenticator, config.refresh_threshold()))
}
