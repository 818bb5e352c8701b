//! Authenticated session value
//!
//! A [`Session`] is immutable once built. Refreshing produces a new value
//! that replaces the cached reference; nothing edits a session in place.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, VaultError};

/// Authenticated handle scoped to one tenant (vault).
///
/// Invariants:
/// - `token` is non-empty
/// - `expires_at >= created_at` when an expiry is known
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "SessionRecord")]
pub struct Session {
    token: String,
    user_id: i64,
    tenant_id: i64,
    tenant_name: String,
    created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    metadata: BTreeMap<String, String>,
}

/// Unchecked wire shape; converted into [`Session`] after validation.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionRecord {
    token: String,
    user_id: i64,
    tenant_id: i64,
    tenant_name: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
}

impl TryFrom<SessionRecord> for Session {
    type Error = VaultError;

    fn try_from(record: SessionRecord) -> Result<Self> {
        let session = Self::with_created_at(
            record.token,
            record.user_id,
            record.tenant_id,
            record.tenant_name,
            record.created_at,
        )?;
        let session = match record.expires_at {
            Some(expires_at) => session.with_expiry(expires_at)?,
            None => session,
        };
        Ok(Self { metadata: record.metadata, ..session })
    }
}

impl Session {
    /// Create a session created "now" with no known expiry.
    ///
    /// # Errors
    /// Returns `VaultError::Validation` if `token` is empty.
    pub fn new(
        token: impl Into<String>,
        user_id: i64,
        tenant_id: i64,
        tenant_name: impl Into<String>,
    ) -> Result<Self> {
        Self::with_created_at(token, user_id, tenant_id, tenant_name, Utc::now())
    }

    /// Create a session with an explicit creation timestamp.
    ///
    /// # Errors
    /// Returns `VaultError::Validation` if `token` is empty.
    pub fn with_created_at(
        token: impl Into<String>,
        user_id: i64,
        tenant_id: i64,
        tenant_name: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(VaultError::validation("session token must not be empty")
                .with_context("field", "token"));
        }

        Ok(Self {
            token,
            user_id,
            tenant_id,
            tenant_name: tenant_name.into(),
            created_at,
            expires_at: None,
            metadata: BTreeMap::new(),
        })
    }

    /// Attach an absolute expiry.
    ///
    /// # Errors
    /// Returns `VaultError::Validation` if `expires_at` precedes creation.
    pub fn with_expiry(self, expires_at: DateTime<Utc>) -> Result<Self> {
        if expires_at < self.created_at {
            return Err(VaultError::validation("session expiry precedes its creation time")
                .with_context("created_at", self.created_at.to_rfc3339())
                .with_context("expires_at", expires_at.to_rfc3339()));
        }
        Ok(Self { expires_at: Some(expires_at), ..self })
    }

    /// Attach a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn tenant_id(&self) -> i64 {
        self.tenant_id
    }

    pub fn tenant_name(&self) -> &str {
        &self.tenant_name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// `false` when no expiry is known, else `now >= expires_at`.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }

    /// Remaining lifetime floored at zero; `None` when no expiry is known.
    pub fn time_until_expiry(&self) -> Option<Duration> {
        self.time_until_expiry_at(Utc::now())
    }

    pub fn time_until_expiry_at(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.expires_at.map(|expires_at| (expires_at - now).to_std().unwrap_or(Duration::ZERO))
    }

    /// True iff an expiry is known and `0 < remaining <= threshold`.
    ///
    /// An already-expired session reports `false`; callers check
    /// [`Session::is_expired`] first.
    pub fn should_refresh(&self, threshold: Duration) -> bool {
        self.should_refresh_at(threshold, Utc::now())
    }

    pub fn should_refresh_at(&self, threshold: Duration, now: DateTime<Utc>) -> bool {
        match self.time_until_expiry_at(now) {
            Some(remaining) => !remaining.is_zero() && remaining <= threshold,
            None => false,
        }
    }

    /// Time elapsed since the session was created (zero if the clock moved
    /// backwards).
    pub fn age(&self) -> Duration {
        (Utc::now() - self.created_at).to_std().unwrap_or(Duration::ZERO)
    }
}
