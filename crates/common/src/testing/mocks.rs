//! Mock implementations of common traits
//!
//! Provides mock objects for testing purposes.

// Allow missing error/panic docs for test mocks - they are designed to be simple
// and errors are clearly indicated by their return types
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use vaultlink_domain::{AuthMode, Result, Session, VaultError};

use crate::auth::Authenticator;

/// Scripted authenticator for exercising `AuthManager`.
///
/// Successful calls mint sessions with predictable tokens: `token-N` for the
/// N-th `authenticate` call and `refreshed-N` for the N-th
/// `refresh_session` call. Sessions carry no expiry.
///
/// # Examples
///
/// ```
/// # #[cfg(feature = "test-utils")]
/// # {
/// use vaultlink_common::testing::MockAuthenticator;
/// use vaultlink_common::Authenticator;
///
/// # tokio_test::block_on(async {
/// let mock = MockAuthenticator::new();
/// let session = mock.authenticate().await.unwrap();
/// assert_eq!(session.token(), "token-1");
/// assert_eq!(mock.authenticate_calls(), 1);
/// # });
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MockAuthenticator {
    authenticate_calls: AtomicUsize,
    refresh_calls: AtomicUsize,
    logout_calls: AtomicUsize,
    close_calls: AtomicUsize,
    authenticate_error: Mutex<Option<VaultError>>,
    refresh_error: Mutex<Option<VaultError>>,
    logout_error: Mutex<Option<VaultError>>,
}

impl MockAuthenticator {
    /// Create a mock where every call succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `authenticate` call fail with `error`.
    #[must_use]
    pub fn fail_authenticate_with(self, error: VaultError) -> Self {
        *self.authenticate_error.lock() = Some(error);
        self
    }

    /// Make every `refresh_session` call fail with `error`.
    #[must_use]
    pub fn fail_refresh_with(self, error: VaultError) -> Self {
        *self.refresh_error.lock() = Some(error);
        self
    }

    /// Make every `logout` call fail with `error`.
    #[must_use]
    pub fn fail_logout_with(self, error: VaultError) -> Self {
        *self.logout_error.lock() = Some(error);
        self
    }

    /// Clear a previously scripted `authenticate` failure.
    pub fn recover_authenticate(&self) {
        *self.authenticate_error.lock() = None;
    }

    pub fn authenticate_calls(&self) -> usize {
        self.authenticate_calls.load(Ordering::SeqCst)
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn logout_calls(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    fn mint(prefix: &str, n: usize) -> Result<Session> {
        Ok(Session::new(format!("{prefix}-{n}"), 1, 100, "Mock Vault")?
            .with_metadata("auth_mode", AuthMode::Password.as_str()))
    }
}

#[async_trait]
impl Authenticator for MockAuthenticator {
    async fn authenticate(&self) -> Result<Session> {
        let n = self.authenticate_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(err) = self.authenticate_error.lock().clone() {
            return Err(err);
        }
        Self::mint("token", n)
    }

    async fn refresh_session(&self, _session: &Session) -> Result<Session> {
        let n = self.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(err) = self.refresh_error.lock().clone() {
            return Err(err);
        }
        Self::mint("refreshed", n)
    }

    async fn logout(&self, _session: &Session) -> Result<()> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        match self.logout_error.lock().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn close(&self) {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn mode(&self) -> AuthMode {
        AuthMode::Password
    }
}
