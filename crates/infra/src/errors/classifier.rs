//! Backend error classification.
//!
//! The backend reports business failures in two places: the HTTP status and
//! a `responseStatus: "FAILURE"` envelope whose `errors` array carries a
//! machine code. Both funnel into [`create_error`].

use serde_json::Value;
use vaultlink_domain::constants::{RESPONSE_STATUS_FAILURE, RESPONSE_STATUS_FIELD};
use vaultlink_domain::{ErrorKind, VaultError};

/// Backend error code → typed error kind.
pub static ERROR_CODE_TABLE: &[(&str, ErrorKind)] = &[
    ("INVALID_SESSION_ID", ErrorKind::SessionExpired),
    ("USERNAME_OR_PASSWORD_INCORRECT", ErrorKind::Authentication),
    ("PASSWORD_CHANGE_REQUIRED", ErrorKind::Authentication),
    ("USER_LOCKED_OUT", ErrorKind::Authentication),
    ("INACTIVE_USER", ErrorKind::Authentication),
    ("NO_PERMISSION", ErrorKind::Authorization),
    ("INSUFFICIENT_ACCESS", ErrorKind::Authorization),
    ("INVALID_DATA", ErrorKind::Validation),
    ("PARAMETER_REQUIRED", ErrorKind::Validation),
    ("MALFORMED_URL", ErrorKind::Validation),
    ("METHOD_NOT_SUPPORTED", ErrorKind::Validation),
    ("INVALID_QUERY", ErrorKind::QuerySyntax),
    ("MALFORMED_QUERY", ErrorKind::QuerySyntax),
    ("ATTRIBUTE_NOT_SUPPORTED", ErrorKind::FieldNotFound),
    ("INVALID_FIELD", ErrorKind::FieldNotFound),
    ("OPERATION_NOT_ALLOWED", ErrorKind::InvalidState),
    ("ITEM_NAME_EXISTS", ErrorKind::InvalidState),
    ("API_LIMIT_EXCEEDED", ErrorKind::RateLimit),
    ("NOT_FOUND", ErrorKind::NotFound),
    ("INVALID_ID", ErrorKind::NotFound),
    ("REQUEST_TIMEOUT", ErrorKind::Timeout),
];

/// Look up the typed kind for a backend error code. Exact match only.
pub fn lookup_kind(code: &str) -> Option<ErrorKind> {
    ERROR_CODE_TABLE.iter().find(|(known, _)| *known == code).map(|(_, kind)| *kind)
}

/// True when a 2xx/3xx body still reports a business failure.
pub fn is_failure_payload(body: &Value) -> bool {
    body.get(RESPONSE_STATUS_FIELD).and_then(Value::as_str) == Some(RESPONSE_STATUS_FAILURE)
}

/// Build a typed error from a failure response.
///
/// Only the first entry of `errors` is considered. Unknown or absent codes
/// produce an `Api` error carrying the status and the whole body. Never
/// fails.
pub fn create_error(response: &Value, status_code: u16) -> VaultError {
    let first = response.get("errors").and_then(Value::as_array).and_then(|errors| errors.first());

    let code = first.and_then(|entry| entry.get("type")).and_then(Value::as_str);
    let message = first
        .and_then(|entry| entry.get("message"))
        .and_then(Value::as_str)
        .map(str::to_owned)
        .unwrap_or_else(|| format!("API request failed with status {status_code}"));

    let err = match code.and_then(lookup_kind) {
        Some(ErrorKind::Api) | None => VaultError::api(message, status_code, response.clone()),
        Some(kind) => VaultError::new(kind, message),
    };

    match code {
        Some(code) => err.with_code(code),
        None => err,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;

    fn failure(code: &str, message: &str) -> Value {
        json!({
            "responseStatus": "FAILURE",
            "errors": [{ "type": code, "message": message }]
        })
    }

    #[test]
    fn every_table_code_resolves() {
        for (code, kind) in ERROR_CODE_TABLE {
            assert_eq!(lookup_kind(code), Some(*kind), "code {code}");
        }
        assert_eq!(lookup_kind("invalid_session_id"), None);
        assert_eq!(lookup_kind("SOMETHING_ELSE"), None);
    }

    #[test]
    fn session_expired_code_maps_to_session_expired() {
        let err = create_error(&failure("INVALID_SESSION_ID", "Invalid or expired session ID."), 200);
        assert_eq!(err.kind(), ErrorKind::SessionExpired);
        assert_eq!(err.code(), "INVALID_SESSION_ID");
        assert_eq!(err.message(), "Invalid or expired session ID.");
    }

    #[test]
    fn rate_limit_code_gets_default_retry_after() {
        let err = create_error(&failure("API_LIMIT_EXCEEDED", "slow down"), 200);
        assert_eq!(err.kind(), ErrorKind::RateLimit);
        assert_eq!(err.retry_after(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn unknown_code_becomes_api_error_with_body() {
        let body = failure("MYSTERY", "huh");
        let err = create_error(&body, 200);

        assert_eq!(err.kind(), ErrorKind::Api);
        assert_eq!(err.status(), Some(200));
        assert_eq!(err.body(), Some(&body));
        assert_eq!(err.code(), "MYSTERY");
    }

    #[test]
    fn missing_errors_array_uses_generic_message() {
        let err = create_error(&json!({ "responseStatus": "FAILURE" }), 503);
        assert_eq!(err.kind(), ErrorKind::Api);
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.message(), "API request failed with status 503");
    }

    #[test]
    fn only_first_error_entry_is_considered() {
        let body = json!({
            "responseStatus": "FAILURE",
            "errors": [
                { "type": "INVALID_QUERY", "message": "bad VQL" },
                { "type": "NO_PERMISSION", "message": "nope" }
            ]
        });
        assert_eq!(create_error(&body, 200).kind(), ErrorKind::QuerySyntax);
    }

    #[test]
    fn failure_payload_detection() {
        assert!(is_failure_payload(&json!({ "responseStatus": "FAILURE" })));
        assert!(!is_failure_payload(&json!({ "responseStatus": "SUCCESS" })));
        assert!(!is_failure_payload(&json!({ "data": [] })));
        assert!(!is_failure_payload(&json!("FAILURE")));
    }
}
