//! HTTP transport for the versioned Vault REST API.

pub mod client;

pub use client::{HttpTransport, HttpTransportBuilder, RequestBody};
