//! # VaultLink Domain
//!
//! Pure domain types shared by every VaultLink crate.
//!
//! This crate contains:
//! - The immutable [`Session`] value and its expiry arithmetic
//! - The closed [`VaultError`] taxonomy and [`Result`] alias
//! - Configuration structures and eager validation
//! - Domain constants (default thresholds, retry budget)
//!
//! ## Architecture
//! - No dependencies on other VaultLink crates
//! - No I/O: networking and file loading live in `vaultlink-infra`

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
