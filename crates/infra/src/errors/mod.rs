//! Error conversions and backend error classification.

pub mod classifier;
pub mod conversions;

pub use classifier::{create_error, is_failure_payload, lookup_kind, ERROR_CODE_TABLE};
pub use conversions::InfraError;
