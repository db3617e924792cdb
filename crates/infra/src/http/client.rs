use std::time::Duration;

use clusterwatch_domain::constants::{DEFAULT_MAX_ATTEMPTS, DEFAULT_REQUEST_TIMEOUT_SECS};
use clusterwatch_domain::ClusterWatchError;
use reqwest::header::HeaderMap;
use reqwest::{Client as ReqwestClient, Method, Request, RequestBuilder, Response};
use tracing::{debug, warn};

use crate::errors::InfraError;

/// HTTP client that retries transport failures and 5xx responses with
/// exponential backoff.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    max_attempts: usize,
    base_backoff: Duration,
}

/// What a single attempt produced.
enum Attempt {
    Done(Response),
    Retry,
}

impl HttpClient {
    /// Builder with the default timeout, attempts and backoff.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Client with default timeout and attempts.
    pub fn new() -> Result<Self, ClusterWatchError> {
        Self::builder().build()
    }

    /// Start a request on the underlying client; pass it to [`send`](Self::send).
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Total attempts per request, initial try included.
    pub const fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Send `builder`, retrying until a non-5xx response arrives or attempts
    /// run out.
    ///
    /// The last 5xx response is returned as-is so callers can map its status.
    /// Request bodies must be buffered; streaming bodies cannot be replayed.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, ClusterWatchError> {
        let attempts = self.max_attempts.max(1);

        for attempt in 1..=attempts {
            let request = builder
                .try_clone()
                .ok_or_else(|| {
                    ClusterWatchError::Internal("request body cannot be replayed for retry".into())
                })?
                .build()
                .map_err(|err| ClusterWatchError::from(InfraError::from(err)))?;

            let last = attempt == attempts;
            match self.attempt(request, attempt, last).await? {
                Attempt::Done(response) => return Ok(response),
                Attempt::Retry => self.sleep_before_retry(attempt).await,
            }
        }

        Err(ClusterWatchError::Internal("http client ran out of attempts without a response".into()))
    }

    async fn attempt(
        &self,
        request: Request,
        attempt: usize,
        last: bool,
    ) -> Result<Attempt, ClusterWatchError> {
        let method = request.method().clone();
        let url = request.url().clone();
        debug!(attempt, %method, %url, "sending HTTP request");

        match self.client.execute(request).await {
            Ok(response) => {
                let status = response.status();
                debug!(attempt, %method, %url, %status, "received HTTP response");

                if status.is_server_error() && !last {
                    warn!(attempt, %url, %status, "server error, retrying");
                    return Ok(Attempt::Retry);
                }
                Ok(Attempt::Done(response))
            }
            Err(err) => {
                debug!(attempt, %method, %url, error = %err, "HTTP request failed");

                if !last && is_transient(&err) {
                    warn!(attempt, %url, error = %err, "transport error, retrying");
                    return Ok(Attempt::Retry);
                }
                Err(InfraError::from(err).into())
            }
        }
    }

    /// Delay before retry number `retry` (1-based): `base * 2^(retry-1)`,
    /// capped at 2^8.
    fn backoff_delay(&self, retry: usize) -> Duration {
        let exponent = retry.saturating_sub(1).min(8) as u32;
        self.base_backoff.saturating_mul(1u32 << exponent)
    }

    async fn sleep_before_retry(&self, retry: usize) {
        let delay = self.backoff_delay(retry);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    max_attempts: usize,
    base_backoff: Duration,
    user_agent: Option<String>,
    default_headers: Option<HeaderMap>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_backoff: Duration::from_millis(200),
            user_agent: None,
            default_headers: None,
        }
    }
}

impl HttpClientBuilder {
    /// Per-attempt timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Total number of attempts (initial try + retries).
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Delay before the first retry; doubles on each later one.
    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    /// `User-Agent` sent with every request.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Headers added to every request.
    pub fn default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers = Some(headers);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<HttpClient, ClusterWatchError> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }
        if let Some(headers) = self.default_headers {
            builder = builder.default_headers(headers);
        }

        let client = builder.build().map_err(|err| ClusterWatchError::from(InfraError::from(err)))?;

        Ok(HttpClient { client, max_attempts: self.max_attempts.max(1), base_backoff: self.base_backoff })
    }
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use reqwest::StatusCode;
    use wiremock::matchers::{header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn fast_client(attempts: usize) -> HttpClient {
        HttpClient::builder()
            .base_backoff(Duration::from_millis(5))
            .max_attempts(attempts)
            .build()
            .expect("http client")
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let client = HttpClient::builder().base_backoff(Duration::from_millis(10)).build().unwrap();

        assert_eq!(client.backoff_delay(1), Duration::from_millis(10));
        assert_eq!(client.backoff_delay(2), Duration::from_millis(20));
        assert_eq!(client.backoff_delay(4), Duration::from_millis(80));
        assert_eq!(client.backoff_delay(50), Duration::from_millis(2560));
    }

    #[tokio::test]
    async fn success_is_returned_after_one_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let client = fast_client(3);
        let response = client.send(client.request(Method::GET, server.uri())).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn server_errors_are_retried_until_success() {
        let server = MockServer::start().await;
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        Mock::given(method("POST"))
            .respond_with(move |_req: &wiremock::Request| {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    ResponseTemplate::new(503)
                } else {
                    ResponseTemplate::new(200)
                }
            })
            .expect(3)
            .mount(&server)
            .await;

        let client = fast_client(3);
        let request = client.request(Method::POST, server.uri()).body("{\"metrics\":[]}");
        let response = client.send(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn last_server_error_is_returned_when_attempts_run_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(2)
            .mount(&server)
            .await;

        let client = fast_client(2);
        let response = client.send(client.request(Method::GET, server.uri())).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let client = fast_client(3);
        let response = client.send(client.request(Method::GET, server.uri())).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn default_headers_are_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("X-Requested-By", "cli"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let mut headers = HeaderMap::new();
        headers.insert("x-requested-by", "cli".parse().unwrap());
        let client = HttpClient::builder().default_headers(headers).build().unwrap();

        let response = client.send(client.request(Method::GET, server.uri())).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn refused_connection_surfaces_as_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = fast_client(2);
        let result = client.send(client.request(Method::GET, format!("http://{addr}"))).await;

        match result {
            Err(ClusterWatchError::Network(msg)) => assert!(msg.contains("HTTP")),
            other => panic!("expected network error, got {:?}", other),
        }
    }
}
