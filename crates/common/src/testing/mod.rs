//! Testing utilities and helpers
//!
//! - **[`mocks`]**: scripted [`crate::auth::Authenticator`] double with call
//!   counters
//!
//! ## Usage
//!
//! ```rust
//! # #[cfg(feature = "test-utils")]
//! # {
//! use std::sync::Arc;
//!
//! use vaultlink_common::testing::MockAuthenticator;
//! use vaultlink_common::AuthManager;
//! use vaultlink_domain::VaultError;
//!
//! let mock = Arc::new(MockAuthenticator::new().fail_refresh_with(VaultError::network("down")));
//! let manager = AuthManager::new(mock.clone());
//! assert!(!manager.is_authenticated());
//! assert_eq!(mock.authenticate_calls(), 0);
//! # }
//! ```

pub mod mocks;

pub use mocks::MockAuthenticator;
