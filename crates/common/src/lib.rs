//! Session lifecycle orchestration shared across VaultLink crates.
//!
//! # Modules
//!
//! - `auth`: the [`auth::Authenticator`] capability and the
//!   [`auth::AuthManager`] that decides between reusing, refreshing, and
//!   re-creating a cached session
//! - `testing`: scripted authenticator doubles (`test-utils` feature)

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod auth;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "test-utils", test))]
pub mod testing;

pub use auth::{AuthManager, Authenticator};
