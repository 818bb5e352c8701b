//! Session manager with refresh-or-reauthenticate fallback
//!
//! Manages the cached session lifecycle:
//! - Authenticate when nothing is cached
//! - Re-authenticate (never refresh) once the cached session has expired
//! - Refresh inside the threshold window, falling back to a full login if
//!   the refresh fails
//! - Reuse the cached session otherwise

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use vaultlink_domain::constants::{
    ACCEPT_HEADER, AUTHORIZATION_HEADER, DEFAULT_REFRESH_THRESHOLD, JSON_CONTENT_TYPE,
};
use vaultlink_domain::{Headers, Result, Session};

use super::traits::Authenticator;

/// Orchestrates create / refresh / reuse decisions over one cached session.
///
/// The cached session is swapped wholesale behind an `RwLock`, so readers
/// never observe a partially updated value. `get_session` calls are
/// serialized through an async mutex so concurrent callers share a single
/// login instead of racing into duplicates.
pub struct AuthManager {
    authenticator: Arc<dyn Authenticator>,
    current: RwLock<Option<Arc<Session>>>,
    resolve_lock: Mutex<()>,
    refresh_threshold: Duration,
}

impl AuthManager {
    /// Create a manager with the default 300 s refresh threshold.
    pub fn new(authenticator: Arc<dyn Authenticator>) -> Self {
        Self::with_refresh_threshold(authenticator, DEFAULT_REFRESH_THRESHOLD)
    }

    /// Create a manager that refreshes sessions `refresh_threshold` before
    /// they expire.
    pub fn with_refresh_threshold(
        authenticator: Arc<dyn Authenticator>,
        refresh_threshold: Duration,
    ) -> Self {
        Self {
            authenticator,
            current: RwLock::new(None),
            resolve_lock: Mutex::new(()),
            refresh_threshold,
        }
    }

    /// Return a usable session, authenticating or refreshing as needed.
    ///
    /// Precedence: no cache → authenticate; expired → authenticate;
    /// inside refresh window → refresh (any refresh error falls back to
    /// authenticate); otherwise reuse.
    ///
    /// # Errors
    /// Propagates the error of `authenticate()` only. Refresh errors are
    /// logged and absorbed by the fallback.
    pub async fn get_session(&self) -> Result<Arc<Session>> {
        let _guard = self.resolve_lock.lock().await;

        let cached = self.current.read().clone();
        let session = match cached {
            None => {
                debug!(mode = %self.authenticator.mode(), "no cached session; authenticating");
                self.authenticator.authenticate().await?
            }
            Some(session) if session.is_expired() => {
                info!(
                    mode = %self.authenticator.mode(),
                    tenant_id = session.tenant_id(),
                    "cached session expired; re-authenticating"
                );
                self.authenticator.authenticate().await?
            }
            Some(session) if session.should_refresh(self.refresh_threshold) => {
                match self.authenticator.refresh_session(&session).await {
                    Ok(refreshed) => {
                        debug!(tenant_id = refreshed.tenant_id(), "session refreshed");
                        refreshed
                    }
                    Err(err) => {
                        warn!(
                            mode = %self.authenticator.mode(),
                            kind = %err.kind(),
                            error = %err,
                            "session refresh failed; falling back to full authentication"
                        );
                        self.authenticator.authenticate().await?
                    }
                }
            }
            Some(session) => return Ok(session),
        };

        let session = Arc::new(session);
        *self.current.write() = Some(Arc::clone(&session));
        info!(
            user_id = session.user_id(),
            tenant_id = session.tenant_id(),
            tenant = session.tenant_name(),
            "session established"
        );
        Ok(session)
    }

    /// Minimal header set carrying `session`'s token.
    pub fn get_auth_headers(session: &Session) -> Headers {
        let mut headers = Headers::new();
        headers.insert(AUTHORIZATION_HEADER.to_string(), session.token().to_string());
        headers.insert(ACCEPT_HEADER.to_string(), JSON_CONTENT_TYPE.to_string());
        headers
    }

    /// Resolve a session and return its auth headers.
    ///
    /// # Errors
    /// Same as [`AuthManager::get_session`].
    pub async fn auth_headers(&self) -> Result<Headers> {
        let session = self.get_session().await?;
        Ok(Self::get_auth_headers(&session))
    }

    /// True when an unexpired session is cached. Never performs I/O.
    pub fn is_authenticated(&self) -> bool {
        self.current.read().as_ref().is_some_and(|session| !session.is_expired())
    }

    /// Cached session without triggering resolution.
    pub fn current_session(&self) -> Option<Arc<Session>> {
        self.current.read().clone()
    }

    /// Seed the cache, e.g. with a session restored from disk.
    pub fn store_session(&self, session: Session) {
        *self.current.write() = Some(Arc::new(session));
    }

    /// Drop the cached session; the next `get_session` authenticates from
    /// scratch.
    pub fn invalidate_session(&self) {
        if self.current.write().take().is_some() {
            info!("session invalidated");
        }
    }

    /// Best-effort server logout followed by unconditional local
    /// invalidation.
    pub async fn logout(&self) {
        let _guard = self.resolve_lock.lock().await;

        let cached = self.current.read().clone();
        if let Some(session) = cached {
            if let Err(err) = self.authenticator.logout(&session).await {
                warn!(kind = %err.kind(), error = %err, "server-side logout failed");
            }
        }

        self.invalidate_session();
    }

    /// Release the authenticator's connections. The cached session is kept.
    pub fn close(&self) {
        self.authenticator.close();
        debug!("authenticator closed");
    }

    pub fn refresh_threshold(&self) -> Duration {
        self.refresh_threshold
    }
}
