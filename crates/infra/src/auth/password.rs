//! Username/password authentication against the `auth` endpoint.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, warn};
use vaultlink_common::{AuthManager, Authenticator};
use vaultlink_domain::constants::{ACCEPT_HEADER, AUTH_PATH, JSON_CONTENT_TYPE};
use vaultlink_domain::{AuthMode, Config, ErrorKind, Headers, Result, Session, VaultError};

use crate::http::{HttpTransport, RequestBody};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    session_id: Option<String>,
    user_id: Option<i64>,
    #[serde(default)]
    vault_ids: Vec<TenantEntry>,
}

#[derive(Debug, Deserialize)]
struct TenantEntry {
    id: i64,
    #[serde(default)]
    name: String,
    url: Option<String>,
}

/// Authenticator that exchanges a username and password for a session.
///
/// The backend returns every tenant the user can reach; the first one in
/// response order becomes the session's tenant. Sessions carry no expiry,
/// and a refresh is simply a new login.
pub struct PasswordAuthenticator {
    config: Config,
    username: String,
    password: String,
    transport: OnceCell<HttpTransport>,
}

impl std::fmt::Debug for PasswordAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordAuthenticator")
            .field("api_root", &self.config.api_root())
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl PasswordAuthenticator {
    /// Validate `config` and build an authenticator. No I/O happens here.
    ///
    /// # Errors
    /// Returns `VaultError::Configuration` naming every missing field among
    /// `endpoint`, `username` and `password`.
    pub fn new(config: Config) -> Result<Self> {
        let config = Config { auth_mode: AuthMode::Password, ..config };
        let missing = config.missing_fields();
        if !missing.is_empty() {
            return Err(VaultError::configuration(format!(
                "password authentication requires: {}",
                missing.join(", ")
            ))
            .with_context("missing_fields", missing.join(","))
            .with_context("auth_mode", AuthMode::Password.as_str()));
        }

        let username = config.credentials.username.clone().unwrap_or_default();
        let password = config.credentials.password.clone().unwrap_or_default();
        Ok(Self { config, username, password, transport: OnceCell::new() })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Whether the internal transport has been built and is currently open.
    pub fn is_transport_open(&self) -> bool {
        self.transport.get().is_some_and(HttpTransport::is_open)
    }

    async fn transport(&self) -> Result<&HttpTransport> {
        let transport =
            self.transport.get_or_init(|| async { HttpTransport::from_config(&self.config) }).await;
        transport.open()?;
        Ok(transport)
    }

    fn login_failure(&self, message: impl Into<String>) -> VaultError {
        VaultError::authentication(message)
            .with_context("username", self.username.clone())
            .with_context("auth_mode", AuthMode::Password.as_str())
    }

    /// Keep transport-level kinds; everything else the backend says about a
    /// login is an authentication failure.
    fn classify_login_error(&self, err: VaultError) -> VaultError {
        match err.kind() {
            ErrorKind::Network | ErrorKind::Timeout | ErrorKind::RateLimit => err,
            _ => {
                let cause = err.code().to_string();
                err.relabel(ErrorKind::Authentication)
                    .with_context("username", self.username.clone())
                    .with_context("auth_mode", AuthMode::Password.as_str())
                    .with_context("cause_code", cause)
            }
        }
    }

    fn session_from_response(&self, body: Value) -> Result<Session> {
        let response: LoginResponse = serde_json::from_value(body)
            .map_err(|err| self.login_failure(format!("unexpected login response: {err}")))?;

        let token = response
            .session_id
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| self.login_failure("login response did not include a session id"))?;
        let user_id = response
            .user_id
            .ok_or_else(|| self.login_failure("login response did not include a user id"))?;

        let tenant_count = response.vault_ids.len();
        let tenant = response
            .vault_ids
            .into_iter()
            .next()
            .ok_or_else(|| self.login_failure("user has no accessible vaults"))?;

        let mut session = Session::new(token, user_id, tenant.id, tenant.name)?
            .with_metadata("auth_mode", AuthMode::Password.as_str())
            .with_metadata("tenant_count", tenant_count.to_string());
        if let Some(url) = tenant.url {
            session = session.with_metadata("tenant_url", url);
        }
        Ok(session)
    }
}

#[async_trait]
impl Authenticator for PasswordAuthenticator {
    #[instrument(skip(self), fields(username = %self.username))]
    async fn authenticate(&self) -> Result<Session> {
        let transport = self.transport().await?;
        let form = RequestBody::Form(vec![
            ("username".to_string(), self.username.clone()),
            ("password".to_string(), self.password.clone()),
        ]);

        let headers = Headers::from([(ACCEPT_HEADER.to_string(), JSON_CONTENT_TYPE.to_string())]);

        let body = transport
            .post(AUTH_PATH, Some(&headers), Some(form))
            .await
            .map_err(|err| self.classify_login_error(err))?;

        let session = self.session_from_response(body)?;
        info!(
            user_id = session.user_id(),
            tenant_id = session.tenant_id(),
            tenant = session.tenant_name(),
            "authenticated"
        );
        Ok(session)
    }

    async fn refresh_session(&self, _session: &Session) -> Result<Session> {
        debug!("refreshing password session by logging in again");
        self.authenticate().await
    }

    #[instrument(skip(self, session), fields(username = %self.username))]
    async fn logout(&self, session: &Session) -> Result<()> {
        let transport = self.transport().await?;
        let headers = AuthManager::get_auth_headers(session);
        match transport.post(AUTH_PATH, Some(&headers), None).await {
            Ok(_) => {
                debug!("server session invalidated");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "logout request failed");
                Err(err)
            }
        }
    }

    /// Release the internal transport. The next call reopens it.
    fn close(&self) {
        if let Some(transport) = self.transport.get() {
            transport.close();
        }
    }

    fn mode(&self) -> AuthMode {
        AuthMode::Password
    }
}
