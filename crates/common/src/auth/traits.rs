//! Authentication capability
//!
//! One implementation per [`AuthMode`]. The trait abstracts the network calls
//! so [`super::AuthManager`] can be exercised with scripted doubles.

use async_trait::async_trait;
use vaultlink_domain::{AuthMode, Result, Session};

/// Produces and retires [`Session`]s for one authentication mode.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Perform a full login and return a brand-new session.
    ///
    /// # Errors
    /// Returns `VaultError::Authentication` when the backend rejects the
    /// credentials. The error context may name the username and mode but
    /// never the secret. Transport failures (network, timeout, rate limit)
    /// propagate with their own kinds.
    async fn authenticate(&self) -> Result<Session>;

    /// Obtain a replacement for `session` without re-submitting credentials
    /// where the backend allows it.
    ///
    /// # Errors
    /// Same contract as [`Authenticator::authenticate`].
    async fn refresh_session(&self, session: &Session) -> Result<Session>;

    /// Best-effort server-side invalidation of `session`.
    ///
    /// The default does nothing; modes without a logout endpoint keep it.
    async fn logout(&self, _session: &Session) -> Result<()> {
        Ok(())
    }

    /// Release any connections held by the authenticator. A later call may
    /// reopen them.
    fn close(&self) {}

    /// Which mode this authenticator implements.
    fn mode(&self) -> AuthMode;
}
