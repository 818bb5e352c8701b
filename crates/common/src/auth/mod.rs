//! Authenticated session lifecycle
//!
//! ```text
//! ┌─────────────────┐
//! │   AuthManager   │  create / refresh / reuse decisions, cached session
//! └────────┬────────┘
//!          │
//!          └──► dyn Authenticator   (one implementation per AuthMode)
//! ```
//!
//! Concrete authenticators perform network I/O and live in
//! `vaultlink-infra`; this crate only depends on the trait.
//!
//! # Usage Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use vaultlink_common::auth::{AuthManager, Authenticator};
//!
//! async fn call_api(authenticator: Arc<dyn Authenticator>) -> vaultlink_domain::Result<()> {
//!     let manager = AuthManager::new(authenticator);
//!
//!     // Authenticates on first use, reuses or refreshes afterwards
//!     let headers = manager.auth_headers().await?;
//!     assert!(headers.contains_key("Authorization"));
//!
//!     manager.logout().await;
//!     Ok(())
//! }
//! ```

pub mod manager;
pub mod traits;

pub use manager::AuthManager;
pub use traits::Authenticator;
