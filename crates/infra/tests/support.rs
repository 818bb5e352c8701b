//! Shared fixtures for the wiremock-backed integration suites.

#![allow(dead_code)]

use serde_json::{json, Value};
use vaultlink_domain::Config;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const AUTH_ROUTE: &str = "/api/v24.1/auth";

/// Password config pointed at `server` with millisecond backoff.
pub fn config_for(server: &MockServer) -> Config {
    let mut config = Config::password(server.uri(), "alice", "s3cret");
    config.http.timeout_secs = 5;
    config.http.initial_backoff_ms = 10;
    config.http.max_backoff_ms = 20;
    config
}

/// Successful login payload listing `tenants` as `(id, name)` pairs.
pub fn login_body(token: &str, tenants: &[(i64, &str)]) -> Value {
    let vaults: Vec<Value> = tenants
        .iter()
        .map(|(id, name)| {
            json!({ "id": id, "name": name, "url": format!("https://{}.example.com", name.to_lowercase()) })
        })
        .collect();
    json!({
        "responseStatus": "SUCCESS",
        "sessionId": token,
        "userId": 42,
        "vaultIds": vaults
    })
}

/// Failure envelope with a single backend error.
pub fn failure_body(code: &str, message: &str) -> Value {
    json!({
        "responseStatus": "FAILURE",
        "errors": [{ "type": code, "message": message }]
    })
}

pub async fn mount_login(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path(AUTH_ROUTE))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_body(token, &[(7, "Quality")])))
        .mount(server)
        .await;
}

pub async fn requests_to(server: &MockServer, route: &str) -> Vec<wiremock::Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|request| request.url.path() == route)
        .collect()
}
