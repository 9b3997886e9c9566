//! HTTP execution with retry, backoff and rate-limit handling.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use tracing::{debug, info_span, warn, Instrument};

use crate::config::ClientConfig;
use crate::error::{CrmError, CrmResult};
use crate::metrics::{record_request, record_retry};
use crate::retry::{parse_retry_after, RetryConfig, Sleeper, TokioSleeper};

// =============================================================================
// Request description
// =============================================================================

/// A request that can be re-issued on every attempt.
#[derive(Clone)]
pub struct RequestSpec {
    pub method: Method,
    pub url: String,
    /// Metric/span label, e.g. `hotels.list`.
    pub operation: &'static str,
    pub bearer: Option<String>,
    pub body: Option<Value>,
}

impl RequestSpec {
    pub fn new(method: Method, url: impl Into<String>, operation: &'static str) -> Self {
        Self {
            method,
            url: url.into(),
            operation,
            bearer: None,
            body: None,
        }
    }

    pub fn get(url: impl Into<String>, operation: &'static str) -> Self {
        Self::new(Method::GET, url, operation)
    }

    pub fn post(url: impl Into<String>, operation: &'static str) -> Self {
        Self::new(Method::POST, url, operation)
    }

    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

impl fmt::Debug for RequestSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSpec")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("operation", &self.operation)
            .field("bearer", &self.bearer.as_ref().map(|_| "<redacted>"))
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

/// Status and body text of a single attempt, unclassified.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

enum AttemptOutcome {
    Json(Value),
    RateLimited(Option<Duration>),
}

// =============================================================================
// Client
// =============================================================================

/// HTTP client that retries transient failures.
#[derive(Clone)]
pub struct ResilientHttpClient {
    http: Client,
    retry: RetryConfig,
    deadline: Option<Duration>,
    sleeper: Arc<dyn Sleeper>,
}

impl ResilientHttpClient {
    /// Build the underlying reqwest client from config.
    pub fn new(config: &ClientConfig) -> CrmResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("hcrm-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(CrmError::Network)?;

        Ok(Self::from_parts(http, config.retry.clone(), config.request_deadline))
    }

    pub fn from_parts(http: Client, retry: RetryConfig, deadline: Option<Duration>) -> Self {
        Self {
            http,
            retry,
            deadline,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Replace the sleeper used between attempts.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Suspend the calling task through the configured sleeper.
    pub async fn pause(&self, duration: Duration) {
        self.sleeper.sleep(duration).await;
    }

    /// Execute with retry and parse the body as JSON.
    ///
    /// Rate-limited responses wait for `Retry-After` (or plain backoff) and
    /// move on to the next attempt. Transport failures and non-success
    /// statuses back off with jitter. A body that is not JSON fails at once.
    pub async fn execute(&self, request: &RequestSpec) -> CrmResult<Value> {
        let span = info_span!(
            "crm_request",
            operation = %request.operation,
            method = %request.method,
        );

        let start = Instant::now();
        let result = self.execute_within_deadline(request).instrument(span).await;
        let latency_ms = start.elapsed().as_millis() as f64;

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(0),
        };
        record_request(request.operation, status, latency_ms);

        result
    }

    async fn execute_within_deadline(&self, request: &RequestSpec) -> CrmResult<Value> {
        match self.deadline {
            Some(deadline) => tokio::time::timeout(deadline, self.execute_with_retry(request))
                .await
                .map_err(|_| {
                    warn!(operation = %request.operation, "Request deadline exceeded");
                    CrmError::DeadlineExceeded(deadline)
                })?,
            None => self.execute_with_retry(request).await,
        }
    }

    async fn execute_with_retry(&self, request: &RequestSpec) -> CrmResult<Value> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 0..max_attempts {
            let has_next = attempt + 1 < max_attempts;
            let span = info_span!("crm_attempt", attempt = attempt + 1, max_attempts);

            match self.attempt(request).instrument(span).await {
                Ok(AttemptOutcome::Json(value)) => return Ok(value),
                Ok(AttemptOutcome::RateLimited(retry_after)) => {
                    last_error = Some(CrmError::rate_limited(&request.url, retry_after));
                    if has_next {
                        let delay = self.retry.rate_limit_delay(attempt, retry_after);
                        warn!(
                            operation = %request.operation,
                            attempt = attempt + 1,
                            delay_ms = delay.as_millis() as u64,
                            "Rate limited, waiting before retry"
                        );
                        record_retry(request.operation, "rate_limited");
                        self.sleeper.sleep(delay).await;
                    }
                }
                Err(e) if e.is_retryable() && has_next => {
                    let delay = self.retry.failure_delay(attempt);
                    warn!(
                        operation = %request.operation,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Request failed, retrying: {}",
                        e
                    );
                    record_retry(request.operation, "error");
                    self.sleeper.sleep(delay).await;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| CrmError::rate_limited(&request.url, None)))
    }

    async fn attempt(&self, request: &RequestSpec) -> CrmResult<AttemptOutcome> {
        let response = self.build(request).send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Ok(AttemptOutcome::RateLimited(parse_retry_after(response.headers())));
        }

        let text = response.text().await?;

        if !status.is_success() {
            return Err(CrmError::http(status.as_u16(), &request.url, text));
        }

        serde_json::from_str(&text).map(AttemptOutcome::Json).map_err(|e| {
            debug!(operation = %request.operation, "Unparsable body: {}", prefix(&text, 200));
            CrmError::response_format(format!(
                "{} returned a non-JSON body: {} (body prefix: {})",
                request.url,
                e,
                prefix(&text, 200)
            ))
        })
    }

    /// Issue exactly one attempt and hand back status and body text.
    pub async fn send_once(&self, request: &RequestSpec) -> CrmResult<RawResponse> {
        let fut = async {
            let response = self.build(request).send().await?;
            let status = response.status();
            let body = response.text().await?;
            Ok::<_, CrmError>(RawResponse { status, body })
        };

        match self.deadline {
            Some(deadline) => tokio::time::timeout(deadline, fut)
                .await
                .map_err(|_| CrmError::DeadlineExceeded(deadline))?,
            None => fut.await,
        }
    }

    fn build(&self, request: &RequestSpec) -> reqwest::RequestBuilder {
        let mut builder = self
            .http
            .request(request.method.clone(), &request.url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json");

        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        builder
    }
}

fn prefix(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RecordingSleeper;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(attempts: u32, sleeper: &RecordingSleeper) -> ResilientHttpClient {
        let retry = RetryConfig {
            max_attempts: attempts,
            ..RetryConfig::default()
        };
        ResilientHttpClient::from_parts(Client::new(), retry, Some(Duration::from_secs(10)))
            .with_sleeper(Arc::new(sleeper.clone()))
    }

    /// Address with nothing listening on it.
    fn closed_port_url() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        format!("http://127.0.0.1:{}/api/hotels", port)
    }

    #[tokio::test]
    async fn test_success_returns_json_and_sends_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/contacts"))
            .and(header("authorization", "Bearer tok"))
            .and(header("accept", "application/json"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
            .expect(1)
            .mount(&server)
            .await;

        let sleeper = RecordingSleeper::new();
        let request = RequestSpec::get(format!("{}/api/contacts", server.uri()), "test").bearer("tok");
        let value = client(5, &sleeper).execute(&request).await.unwrap();

        assert_eq!(value, json!([{"id": 1}]));
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn test_retry_after_is_honored() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "2"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .mount(&server)
            .await;

        let sleeper = RecordingSleeper::new();
        let request = RequestSpec::get(server.uri(), "test");
        let value = client(5, &sleeper).execute(&request).await.unwrap();

        assert_eq!(value["ok"], true);
        let delays = sleeper.delays();
        assert_eq!(delays.len(), 1);
        assert!(delays[0] >= Duration::from_millis(2000));
    }

    #[tokio::test]
    async fn test_rate_limit_without_header_uses_backoff() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let sleeper = RecordingSleeper::new();
        client(5, &sleeper)
            .execute(&RequestSpec::get(server.uri(), "test"))
            .await
            .unwrap();

        assert_eq!(
            sleeper.delays(),
            vec![Duration::from_millis(2000), Duration::from_millis(4000)]
        );
    }

    #[tokio::test]
    async fn test_rate_limit_exhausting_budget_reports_429() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .expect(3)
            .mount(&server)
            .await;

        let sleeper = RecordingSleeper::new();
        let err = client(3, &sleeper)
            .execute(&RequestSpec::get(server.uri(), "test"))
            .await
            .unwrap_err();

        assert_eq!(err.http_status(), Some(429));
        assert_eq!(sleeper.delays().len(), 2);
    }

    #[tokio::test]
    async fn test_network_failures_use_exactly_max_attempts() {
        let sleeper = RecordingSleeper::new();
        let request = RequestSpec::get(closed_port_url(), "test");
        let err = client(5, &sleeper).execute(&request).await.unwrap_err();

        assert!(matches!(err, CrmError::Network(_)), "got {:?}", err);
        // Five attempts means four waits between them.
        let delays = sleeper.delays();
        assert_eq!(delays.len(), 4);
        for (attempt, delay) in delays.iter().enumerate() {
            let base = Duration::from_millis(2000 * 2u64.pow(attempt as u32));
            assert!(*delay >= base && *delay <= base + Duration::from_millis(1000));
        }
    }

    #[tokio::test]
    async fn test_http_errors_are_retried_then_propagated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
            .expect(5)
            .mount(&server)
            .await;

        let sleeper = RecordingSleeper::new();
        let err = client(5, &sleeper)
            .execute(&RequestSpec::get(server.uri(), "test"))
            .await
            .unwrap_err();

        match err {
            CrmError::Http { status, body, .. } => {
                assert_eq!(status, 503);
                assert_eq!(body, "upstream down");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_json_success_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let sleeper = RecordingSleeper::new();
        let err = client(5, &sleeper)
            .execute(&RequestSpec::get(server.uri(), "test"))
            .await
            .unwrap_err();

        assert!(matches!(err, CrmError::ResponseFormat(_)));
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn test_deadline_bounds_hanging_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let http = ResilientHttpClient::from_parts(
            Client::new(),
            RetryConfig::immediate(1),
            Some(Duration::from_millis(100)),
        );
        let err = http
            .execute(&RequestSpec::get(server.uri(), "test"))
            .await
            .unwrap_err();

        assert!(matches!(err, CrmError::DeadlineExceeded(_)));
    }

    #[tokio::test]
    async fn test_send_once_returns_raw_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("nope"))
            .expect(1)
            .mount(&server)
            .await;

        let sleeper = RecordingSleeper::new();
        let raw = client(5, &sleeper)
            .send_once(&RequestSpec::post(server.uri(), "login").json(json!({})))
            .await
            .unwrap();

        assert_eq!(raw.status, StatusCode::UNAUTHORIZED);
        assert_eq!(raw.body, "nope");
    }

    #[test]
    fn test_request_debug_redacts_bearer() {
        let request = RequestSpec::get("http://x", "op").bearer("very-secret");
        assert!(!format!("{:?}", request).contains("very-secret"));
    }

    #[test]
    fn test_prefix_respects_char_boundaries() {
        assert_eq!(prefix("héllo", 2), "hé");
        assert_eq!(prefix("ok", 10), "ok");
    }
}
