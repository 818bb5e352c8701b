//! End-to-end calls through `VaultClient`: login, header injection, and
//! recovery from a rejected session.

mod support;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::json;
use support::{config_for, failure_body, login_body, mount_login, requests_to, AUTH_ROUTE};
use vaultlink_common::{AuthManager, Authenticator};
use vaultlink_domain::ErrorKind;
use vaultlink_infra::{HttpTransport, PasswordAuthenticator, VaultClient};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DOCS_ROUTE: &str = "/api/v24.1/objects/documents";

#[tokio::test]
async fn logs_in_once_and_reuses_session() {
    let server = MockServer::start().await;
    mount_login(&server, "sess-1").await;
    Mock::given(method("GET"))
        .and(path(DOCS_ROUTE))
        .and(header("Authorization", "sess-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "responseStatus": "SUCCESS",
            "documents": []
        })))
        .expect(2)
        .mount(&server)
        .await;

    let client = VaultClient::new(&config_for(&server)).expect("client");
    client.get("objects/documents", None).await.expect("first call");
    client.get("objects/documents", None).await.expect("second call");

    assert_eq!(requests_to(&server, AUTH_ROUTE).await.len(), 1);
    assert!(client.auth().is_authenticated());
}

#[tokio::test]
async fn rejected_session_triggers_one_relogin() {
    let server = MockServer::start().await;

    let logins = Arc::new(AtomicUsize::new(0));
    let logins_clone = logins.clone();
    Mock::given(method("POST"))
        .and(path(AUTH_ROUTE))
        .respond_with(move |_req: &wiremock::Request| -> ResponseTemplate {
            let n = logins_clone.fetch_add(1, Ordering::SeqCst) + 1;
            ResponseTemplate::new(200).set_body_json(login_body(&format!("sess-{n}"), &[(7, "Quality")]))
        })
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(DOCS_ROUTE))
        .and(header("Authorization", "sess-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(failure_body("INVALID_SESSION_ID", "Invalid or expired session ID.")),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(DOCS_ROUTE))
        .and(header("Authorization", "sess-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "responseStatus": "SUCCESS" })))
        .mount(&server)
        .await;

    let client = VaultClient::new(&config_for(&server)).unwrap();
    let body = client.get("objects/documents", None).await.expect("recovered");

    assert_eq!(body["responseStatus"], json!("SUCCESS"));
    assert_eq!(logins.load(Ordering::SeqCst), 2);
    assert_eq!(client.auth().current_session().unwrap().token(), "sess-2");
}

#[tokio::test]
async fn other_failures_are_not_retried() {
    let server = MockServer::start().await;
    mount_login(&server, "sess-1").await;
    Mock::given(method("GET"))
        .and(path(DOCS_ROUTE))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(failure_body("NO_PERMISSION", "Denied.")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = VaultClient::new(&config_for(&server)).unwrap();
    let err = client.get("objects/documents", None).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Authorization);
    assert_eq!(requests_to(&server, AUTH_ROUTE).await.len(), 1);
}

#[tokio::test]
async fn shutdown_logs_out_and_closes_transport() {
    let server = MockServer::start().await;
    mount_login(&server, "sess-1").await;
    Mock::given(method("GET"))
        .and(path(DOCS_ROUTE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let client = VaultClient::new(&config_for(&server)).unwrap();
    client.get("objects/documents", None).await.unwrap();

    client.shutdown().await;

    assert!(!client.auth().is_authenticated());
    assert!(!client.transport().is_open());
    let err = client.transport().get("objects/documents", None, None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[tokio::test]
async fn shutdown_releases_the_login_transport() {
    let server = MockServer::start().await;
    mount_login(&server, "sess-1").await;
    Mock::given(method("GET"))
        .and(path(DOCS_ROUTE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let authenticator = Arc::new(PasswordAuthenticator::new(config.clone()).unwrap());
    let manager = Arc::new(AuthManager::new(Arc::clone(&authenticator) as Arc<dyn Authenticator>));
    let client = VaultClient::from_parts(manager, HttpTransport::from_config(&config)).unwrap();

    client.get("objects/documents", None).await.unwrap();
    assert!(authenticator.is_transport_open());

    client.shutdown().await;
    assert!(!authenticator.is_transport_open());
}

#[test]
fn invalid_config_fails_fast() {
    let err = VaultClient::new(&vaultlink_domain::Config::default()).err().expect("invalid");
    assert_eq!(err.kind(), ErrorKind::Configuration);
}
