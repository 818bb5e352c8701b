//! Domain types and models

pub mod session;

use std::collections::BTreeMap;

pub use session::Session;

/// Request headers as plain name/value pairs.
///
/// Kept transport-agnostic so the domain and auth layers do not depend on an
/// HTTP crate; the transport converts them at the edge.
pub type Headers = BTreeMap<String, String>;
