//! # VaultLink Infrastructure
//!
//! Network and file-system side of the client.
//!
//! This crate contains:
//! - The retrying HTTP transport
//! - Backend error classification and conversions from third-party errors
//! - The username/password authenticator and the mode-based factory
//! - Configuration loading (environment, `.env`, JSON/TOML files)
//! - Logging initialisation
//!
//! ## Architecture
//! - Implements the `Authenticator` trait defined in `vaultlink-common`
//! - Depends on `vaultlink-domain` and `vaultlink-common`
//! - Contains all "impure" code (I/O)

pub mod auth;
pub mod client;
pub mod config;
pub mod errors;
pub mod http;
pub mod observability;

// Re-export commonly used items
pub use auth::{build_authenticator, build_manager, PasswordAuthenticator};
pub use client::VaultClient;
pub use errors::InfraError;
pub use http::{HttpTransport, HttpTransportBuilder, RequestBody};
