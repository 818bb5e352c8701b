//! Authenticated API client
//!
//! Combines an [`AuthManager`] with an [`HttpTransport`]: every call resolves
//! a valid session, attaches its headers, and issues the request.

use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;
use tracing::{info, instrument, warn};
use vaultlink_common::AuthManager;
use vaultlink_domain::{Config, ErrorKind, Headers, Result};

use crate::auth::build_manager;
use crate::http::{HttpTransport, RequestBody};

/// Authenticated client for the Vault REST API.
///
/// When the backend rejects the session token (`INVALID_SESSION_ID`), the
/// cached session is dropped and the call is retried once with a fresh
/// login.
pub struct VaultClient {
    auth: Arc<AuthManager>,
    transport: HttpTransport,
}

impl VaultClient {
    /// Validate `config`, build the authenticator for its mode, and open the
    /// transport. No login happens until the first call.
    ///
    /// # Errors
    /// Returns `VaultError::Configuration` for invalid settings or an
    /// unsupported auth mode.
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        let auth = Arc::new(build_manager(config)?);
        let transport = HttpTransport::from_config(config);
        transport.open()?;
        Ok(Self { auth, transport })
    }

    /// Assemble a client from existing parts. The transport is opened if it
    /// is not already.
    ///
    /// # Errors
    /// Same as [`HttpTransport::open`].
    pub fn from_parts(auth: Arc<AuthManager>, transport: HttpTransport) -> Result<Self> {
        transport.open()?;
        Ok(Self { auth, transport })
    }

    pub fn auth(&self) -> &Arc<AuthManager> {
        &self.auth
    }

    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    #[instrument(skip(self, query), fields(path = %path))]
    pub async fn get(&self, path: &str, query: Option<&[(&str, &str)]>) -> Result<Value> {
        self.call(Method::GET, path, query, None).await
    }

    #[instrument(skip(self, body), fields(path = %path))]
    pub async fn post(&self, path: &str, body: Option<RequestBody>) -> Result<Value> {
        self.call(Method::POST, path, None, body).await
    }

    #[instrument(skip(self, body), fields(path = %path))]
    pub async fn put(&self, path: &str, body: Option<RequestBody>) -> Result<Value> {
        self.call(Method::PUT, path, None, body).await
    }

    #[instrument(skip(self), fields(path = %path))]
    pub async fn delete(&self, path: &str) -> Result<Value> {
        self.call(Method::DELETE, path, None, None).await
    }

    /// Log out server-side, clear the cached session, and release both the
    /// request transport and the authenticator's own connections.
    pub async fn shutdown(&self) {
        self.auth.logout().await;
        self.auth.close();
        self.transport.close();
        info!("client shut down");
    }

    async fn call(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(&str, &str)]>,
        body: Option<RequestBody>,
    ) -> Result<Value> {
        let headers = self.auth.auth_headers().await?;
        match self.send(&method, path, &headers, query, body.clone()).await {
            Err(err) if err.kind() == ErrorKind::SessionExpired => {
                warn!(%method, path, "session rejected by server, re-authenticating");
                self.auth.invalidate_session();
                let headers = self.auth.auth_headers().await?;
                self.send(&method, path, &headers, query, body).await
            }
            other => other,
        }
    }

    async fn send(
        &self,
        method: &Method,
        path: &str,
        headers: &Headers,
        query: Option<&[(&str, &str)]>,
        body: Option<RequestBody>,
    ) -> Result<Value> {
        self.transport.request(method.clone(), path, Some(headers), query, body).await
    }
}
