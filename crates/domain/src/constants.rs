//! Application constants
//!
//! Centralized location for domain-level defaults used throughout the
//! workspace.

use std::time::Duration;

// Session lifecycle
pub const DEFAULT_REFRESH_THRESHOLD_SECS: u64 = 300;
pub const DEFAULT_REFRESH_THRESHOLD: Duration = Duration::from_secs(DEFAULT_REFRESH_THRESHOLD_SECS);

// Transport retry budget
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 2_000;
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 10_000;

// Rate limiting
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

// API layout
pub const DEFAULT_API_VERSION: &str = "v24.1";
pub const AUTH_PATH: &str = "auth";

// Wire markers
pub const RESPONSE_STATUS_FIELD: &str = "responseStatus";
pub const RESPONSE_STATUS_FAILURE: &str = "FAILURE";
pub const AUTHORIZATION_HEADER: &str = "Authorization";
pub const ACCEPT_HEADER: &str = "Accept";
pub const JSON_CONTENT_TYPE: &str = "application/json";
