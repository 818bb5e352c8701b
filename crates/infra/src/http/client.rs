use std::time::Duration;

use parking_lot::RwLock;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER};
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, warn};
use vaultlink_domain::constants::{
    ACCEPT_HEADER, DEFAULT_INITIAL_BACKOFF_MS, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_BACKOFF_MS,
    DEFAULT_RETRY_AFTER_SECS, DEFAULT_TIMEOUT_SECS,
};
use vaultlink_domain::{Config, Headers, Result, VaultError};

use crate::errors::{classifier, InfraError};

/// Request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Serialized as `application/json`.
    Json(Value),
    /// Serialized as `application/x-www-form-urlencoded`.
    Form(Vec<(String, String)>),
}

/// Pooled HTTP transport bound to one versioned API root.
///
/// Retries only when the connection cannot be established or the attempt
/// times out. HTTP error statuses and failure payloads surface on the first
/// attempt. The transport adds no headers of its own; callers attach auth
/// and `Accept` headers.
///
/// A transport starts closed; call [`HttpTransport::open`] before issuing
/// requests.
pub struct HttpTransport {
    api_root: String,
    timeout: Duration,
    max_attempts: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
    user_agent: Option<String>,
    client: RwLock<Option<ReqwestClient>>,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("api_root", &self.api_root)
            .field("timeout", &self.timeout)
            .field("max_attempts", &self.max_attempts)
            .field("open", &self.is_open())
            .finish()
    }
}

impl HttpTransport {
    /// Start building a transport for `api_root`
    /// (e.g. `https://myvault.example.com/api/v24.1`).
    pub fn builder(api_root: impl Into<String>) -> HttpTransportBuilder {
        HttpTransportBuilder::new(api_root)
    }

    /// Transport using the API root and retry settings from `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::builder(config.api_root())
            .timeout(config.http.timeout())
            .max_attempts(config.http.max_attempts)
            .initial_backoff(config.http.initial_backoff())
            .max_backoff(config.http.max_backoff())
            .build()
    }

    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Build the connection pool. Calling it on an open transport is a no-op.
    ///
    /// # Errors
    /// Returns `VaultError::Configuration` when the TLS backend cannot be
    /// initialised.
    pub fn open(&self) -> Result<()> {
        let mut guard = self.client.write();
        if guard.is_some() {
            return Ok(());
        }

        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();
        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent.clone());
        }

        let client = builder.build().map_err(|err| {
            VaultError::configuration(format!("failed to build HTTP client: {err}"))
        })?;
        *guard = Some(client);
        debug!(api_root = %self.api_root, "HTTP transport opened");
        Ok(())
    }

    /// Drop the connection pool. Later requests fail until reopened.
    pub fn close(&self) {
        if self.client.write().take().is_some() {
            debug!(api_root = %self.api_root, "HTTP transport closed");
        }
    }

    pub fn is_open(&self) -> bool {
        self.client.read().is_some()
    }

    pub async fn get(
        &self,
        path: &str,
        headers: Option<&Headers>,
        query: Option<&[(&str, &str)]>,
    ) -> Result<Value> {
        self.request(Method::GET, path, headers, query, None).await
    }

    pub async fn post(
        &self,
        path: &str,
        headers: Option<&Headers>,
        body: Option<RequestBody>,
    ) -> Result<Value> {
        self.request(Method::POST, path, headers, None, body).await
    }

    pub async fn put(
        &self,
        path: &str,
        headers: Option<&Headers>,
        body: Option<RequestBody>,
    ) -> Result<Value> {
        self.request(Method::PUT, path, headers, None, body).await
    }

    pub async fn delete(&self, path: &str, headers: Option<&Headers>) -> Result<Value> {
        self.request(Method::DELETE, path, headers, None, None).await
    }

    /// Issue a request and return the parsed JSON body.
    ///
    /// `path` is resolved against the API root unless it is already an
    /// absolute `http(s)://` URL.
    ///
    /// # Errors
    /// - `InvalidState` when the transport is not open
    /// - `Validation` for header names or values that cannot be sent
    /// - `Network` / `Timeout` once the retry budget is spent
    /// - `RateLimit` for HTTP 429
    /// - `Api` for any other status ≥ 400
    /// - a classified error when a successful status carries a failure
    ///   payload
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        headers: Option<&Headers>,
        query: Option<&[(&str, &str)]>,
        body: Option<RequestBody>,
    ) -> Result<Value> {
        let client = self.client.read().clone().ok_or_else(|| {
            VaultError::invalid_state("HTTP transport is not open")
                .with_context("api_root", self.api_root.clone())
        })?;

        let url = self.resolve_url(path);
        let header_map = build_header_map(headers)?;
        let attempts = self.max_attempts.max(1);

        for attempt in 1..=attempts {
            let builder = prepare(
                client.request(method.clone(), &url),
                &header_map,
                query,
                body.as_ref(),
            );

            debug!(attempt, %method, %url, "sending HTTP request");

            match builder.send().await {
                Ok(response) => {
                    debug!(attempt, %method, %url, status = %response.status(), "received HTTP response");
                    return self.handle_response(response, &method, path).await;
                }
                Err(err) => {
                    if attempt < attempts && should_retry_error(&err) {
                        let delay = self.backoff_delay(attempt);
                        warn!(
                            attempt,
                            %method,
                            %url,
                            error = %err,
                            delay_ms = delay.as_millis() as u64,
                            "HTTP request failed, retrying"
                        );
                        if !delay.is_zero() {
                            tokio::time::sleep(delay).await;
                        }
                        continue;
                    }

                    warn!(attempt, %method, %url, error = %err, "HTTP request failed");
                    let infra: InfraError = err.into();
                    return Err(VaultError::from(infra)
                        .with_context("method", method.as_str())
                        .with_context("attempts", attempt.to_string()));
                }
            }
        }

        Err(VaultError::invalid_state("HTTP transport exhausted retries without producing a result"))
    }

    /// Delay before retry number `retry_number` (1-based): the initial
    /// backoff doubled per retry, capped at the maximum.
    pub(crate) fn backoff_delay(&self, retry_number: u32) -> Duration {
        let shift = retry_number.saturating_sub(1).min(16);
        self.initial_backoff.saturating_mul(1u32 << shift).min(self.max_backoff)
    }

    fn resolve_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.api_root.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    async fn handle_response(&self, response: Response, method: &Method, path: &str) -> Result<Value> {
        let status = response.status();
        let retry_after = parse_retry_after(response.headers());
        let text = response.text().await.map_err(|err| VaultError::from(InfraError::from(err)))?;
        let body = parse_body(&text);

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(VaultError::rate_limit("rate limit exceeded", retry_after)
                .with_context("path", path)
                .with_context("method", method.as_str()));
        }

        if status.as_u16() >= 400 {
            return Err(VaultError::api(
                format!("API request failed with status {}", status.as_u16()),
                status.as_u16(),
                body,
            )
            .with_context("path", path)
            .with_context("method", method.as_str()));
        }

        if classifier::is_failure_payload(&body) {
            let err = classifier::create_error(&body, status.as_u16());
            debug!(%method, path, kind = %err.kind(), code = err.code(), "failure payload");
            return Err(err);
        }

        Ok(body)
    }
}

/// Builder for [`HttpTransport`].
#[derive(Debug)]
pub struct HttpTransportBuilder {
    api_root: String,
    timeout: Duration,
    max_attempts: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
    user_agent: Option<String>,
}

impl HttpTransportBuilder {
    fn new(api_root: impl Into<String>) -> Self {
        Self {
            api_root: api_root.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff: Duration::from_millis(DEFAULT_INITIAL_BACKOFF_MS),
            max_backoff: Duration::from_millis(DEFAULT_MAX_BACKOFF_MS),
            user_agent: None,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Configure the total number of attempts (initial try + retries).
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    pub fn max_backoff(mut self, backoff: Duration) -> Self {
        self.max_backoff = backoff;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build a closed transport.
    pub fn build(self) -> HttpTransport {
        HttpTransport {
            api_root: self.api_root.trim_end_matches('/').to_string(),
            timeout: self.timeout,
            max_attempts: self.max_attempts.max(1),
            initial_backoff: self.initial_backoff,
            max_backoff: self.max_backoff,
            user_agent: self.user_agent,
            client: RwLock::new(None),
        }
    }
}

fn prepare(
    mut builder: RequestBuilder,
    headers: &HeaderMap,
    query: Option<&[(&str, &str)]>,
    body: Option<&RequestBody>,
) -> RequestBuilder {
    builder = builder.headers(headers.clone());
    if let Some(query) = query {
        builder = builder.query(query);
    }
    match body {
        Some(RequestBody::Json(value)) => builder.json(value),
        Some(RequestBody::Form(fields)) => builder.form(fields),
        None => builder,
    }
}

/// Caller headers only; the transport adds none of its own.
fn build_header_map(headers: Option<&Headers>) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    for (name, value) in headers.into_iter().flatten() {
        // Values may be session tokens; only the header name is reported.
        let invalid = || VaultError::validation("invalid HTTP header").with_context("header", name.clone());
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
        let mut header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;
        if !name.eq_ignore_ascii_case(ACCEPT_HEADER) {
            header_value.set_sensitive(true);
        }
        map.insert(header_name, header_value);
    }
    Ok(map)
}

fn parse_retry_after(headers: &HeaderMap) -> Duration {
    let secs = headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
    Duration::from_secs(secs)
}

fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return json!({});
    }
    serde_json::from_str(text).unwrap_or_else(|_| json!({ "raw": text }))
}

fn should_retry_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use vaultlink_domain::ErrorKind;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn transport_for(server: &MockServer) -> HttpTransport {
        let transport = HttpTransport::builder(format!("{}/api/v24.1", server.uri()))
            .initial_backoff(Duration::from_millis(10))
            .max_backoff(Duration::from_millis(40))
            .max_attempts(3)
            .build();
        transport.open().expect("open transport");
        transport
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let transport = HttpTransport::builder("https://vault.example.com/api/v24.1").build();
        assert_eq!(transport.backoff_delay(1), Duration::from_secs(2));
        assert_eq!(transport.backoff_delay(2), Duration::from_secs(4));
        assert_eq!(transport.backoff_delay(3), Duration::from_secs(8));
        assert_eq!(transport.backoff_delay(4), Duration::from_secs(10));
        assert_eq!(transport.backoff_delay(40), Duration::from_secs(10));
    }

    #[test]
    fn resolves_relative_and_absolute_urls() {
        let transport = HttpTransport::builder("https://vault.example.com/api/v24.1/").build();
        assert_eq!(
            transport.resolve_url("/objects/documents"),
            "https://vault.example.com/api/v24.1/objects/documents"
        );
        assert_eq!(transport.resolve_url("auth"), "https://vault.example.com/api/v24.1/auth");
        assert_eq!(
            transport.resolve_url("https://other.example.com/x"),
            "https://other.example.com/x"
        );
    }

    #[test]
    fn body_parsing_fallbacks() {
        assert_eq!(parse_body(""), json!({}));
        assert_eq!(parse_body("  \n"), json!({}));
        assert_eq!(parse_body("<html>oops</html>"), json!({ "raw": "<html>oops</html>" }));
        assert_eq!(parse_body(r#"{"a":1}"#), json!({ "a": 1 }));
    }

    #[test]
    fn invalid_header_reports_name_only() {
        let mut headers = Headers::new();
        headers.insert("Authorization".into(), "secret\nvalue".into());

        let err = build_header_map(Some(&headers)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.context().get("header").map(String::as_str), Some("Authorization"));
        assert!(!err.to_string().contains("secret"));
    }

    #[tokio::test]
    async fn request_on_closed_transport_is_invalid_state() {
        let transport = HttpTransport::builder("https://vault.example.com/api/v24.1").build();
        let err = transport.get("objects", None, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        transport.open().unwrap();
        assert!(transport.is_open());
        transport.close();
        assert!(!transport.is_open());
    }

    #[tokio::test]
    async fn returns_parsed_body_with_headers_and_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v24.1/objects/documents"))
            .and(query_param("limit", "5"))
            .and(header("Authorization", "tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "responseStatus": "SUCCESS",
                "data": [1, 2]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let transport = transport_for(&server);
        let mut headers = Headers::new();
        headers.insert("Authorization".into(), "tok".into());

        let body = transport
            .get("objects/documents", Some(&headers), Some(&[("limit", "5")]))
            .await
            .expect("response");
        assert_eq!(body["data"], json!([1, 2]));
    }

    #[tokio::test]
    async fn sends_no_accept_header_of_its_own() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let transport = transport_for(&server);
        transport.get("objects", None, None).await.expect("response");

        let requests = server.received_requests().await.unwrap();
        let accept = requests[0].headers.get("accept").and_then(|value| value.to_str().ok());
        assert_ne!(accept, Some("application/json"));
        assert!(requests[0].headers.get("authorization").is_none());
    }

    #[tokio::test]
    async fn posts_form_bodies() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v24.1/auth"))
            .and(body_string_contains("username=alice"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .expect(1)
            .mount(&server)
            .await;

        let transport = transport_for(&server);
        let body = transport
            .post("auth", None, Some(RequestBody::Form(vec![("username".into(), "alice".into())])))
            .await
            .expect("response");
        assert_eq!(body["ok"], json!(true));
    }

    #[tokio::test]
    async fn does_not_retry_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;

        let transport = transport_for(&server);
        let err = transport.get("objects", None, None).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Api);
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.body(), Some(&json!({ "raw": "boom" })));
        assert_eq!(err.context().get("path").map(String::as_str), Some("objects"));
        assert_eq!(err.context().get("method").map(String::as_str), Some("GET"));
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rate_limit_reads_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
            .expect(1)
            .mount(&server)
            .await;

        let transport = transport_for(&server);
        let err = transport.get("objects", None, None).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::RateLimit);
        assert_eq!(err.retry_after(), Some(Duration::from_secs(7)));
    }

    #[tokio::test]
    async fn rate_limit_defaults_to_sixty_seconds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "soon"))
            .mount(&server)
            .await;

        let transport = transport_for(&server);
        let err = transport.get("objects", None, None).await.unwrap_err();
        assert_eq!(err.retry_after(), Some(Duration::from_secs(60)));
    }

    #[tokio::test]
    async fn failure_payload_is_classified() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "responseStatus": "FAILURE",
                "errors": [{ "type": "INVALID_SESSION_ID", "message": "Invalid or expired session ID." }]
            })))
            .mount(&server)
            .await;

        let transport = transport_for(&server);
        let err = transport.get("objects", None, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SessionExpired);
    }

    #[tokio::test]
    async fn retries_timeouts_until_success() {
        let server = MockServer::start().await;
        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_clone = attempts.clone();
        Mock::given(method("GET"))
            .respond_with(move |_req: &wiremock::Request| -> ResponseTemplate {
                let current = attempts_clone.fetch_add(1, Ordering::SeqCst);
                if current < 2 {
                    ResponseTemplate::new(200)
                        .set_body_json(json!({ "late": true }))
                        .set_delay(Duration::from_secs(2))
                } else {
                    ResponseTemplate::new(200).set_body_json(json!({ "late": false }))
                }
            })
            .mount(&server)
            .await;

        let transport = HttpTransport::builder(format!("{}/api/v24.1", server.uri()))
            .timeout(Duration::from_millis(200))
            .initial_backoff(Duration::from_millis(10))
            .max_backoff(Duration::from_millis(20))
            .max_attempts(3)
            .build();
        transport.open().unwrap();

        let body = transport.get("objects", None, None).await.expect("response");
        assert_eq!(body["late"], json!(false));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn connect_failures_exhaust_budget_as_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener); // release the port so that requests fail with ECONNREFUSED

        let transport = HttpTransport::builder(format!("http://{addr}/api/v24.1"))
            .initial_backoff(Duration::from_millis(5))
            .max_backoff(Duration::from_millis(10))
            .max_attempts(3)
            .build();
        transport.open().unwrap();

        let err = transport.get("objects", None, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
        assert_eq!(err.context().get("attempts").map(String::as_str), Some("3"));
    }

    #[tokio::test]
    async fn connect_refusal_is_retried_until_server_is_up() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = HttpTransport::builder(format!("http://{addr}/api/v24.1"))
            .initial_backoff(Duration::from_millis(400))
            .max_backoff(Duration::from_millis(400))
            .max_attempts(3)
            .build();
        transport.open().unwrap();
        let pending = tokio::spawn(async move { transport.get("objects", None, None).await });

        // First attempt is refused; the server comes up during the backoff.
        tokio::time::sleep(Duration::from_millis(150)).await;
        let server =
            MockServer::builder().listener(TcpListener::bind(addr).unwrap()).start().await;
        Mock::given(method("GET"))
            .and(path("/api/v24.1/objects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "up": true })))
            .mount(&server)
            .await;

        let body = pending.await.unwrap().expect("retried request succeeds");
        assert_eq!(body["up"], json!(true));
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }
}
