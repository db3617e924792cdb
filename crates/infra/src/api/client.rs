//! REST client for the log-management server
//!
//! JSON over HTTP with retries (via [`HttpClient`]), an overall timeout per
//! call and token authentication.

use std::sync::Arc;
use std::time::Duration;

use clusterwatch_domain::constants::{REQUESTED_BY_HEADER, REQUESTED_BY_VALUE};
use clusterwatch_domain::ServerConfig;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument};

use super::auth::{basic_authorization, AccessTokenProvider};
use super::errors::ApiError;
use crate::http::HttpClient;

/// Configuration for API client
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// API root, e.g. `https://graylog.example.com/api`
    pub base_url: String,
    /// Per-attempt timeout
    pub timeout: Duration,
    /// Total attempts per call
    pub max_attempts: usize,
}

impl From<&ServerConfig> for ApiClientConfig {
    fn from(server: &ServerConfig) -> Self {
        Self {
            base_url: server.base_url.clone(),
            timeout: server.timeout(),
            max_attempts: server.max_attempts,
        }
    }
}

/// Authenticated JSON client
pub struct ApiClient {
    http: HttpClient,
    auth: Arc<dyn AccessTokenProvider>,
    base_url: String,
    call_timeout: Duration,
}

impl ApiClient {
    /// # Errors
    ///
    /// Returns `ApiError::Config` for an empty base URL or if the HTTP client
    /// cannot be built.
    pub fn new(config: ApiClientConfig, auth: Arc<dyn AccessTokenProvider>) -> Result<Self, ApiError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ApiError::Config("base URL must not be empty".into()));
        }

        let requested_by = HeaderName::from_bytes(REQUESTED_BY_HEADER.as_bytes())
            .map_err(|e| ApiError::Config(format!("Invalid header name: {e}")))?;
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(requested_by, HeaderValue::from_static(REQUESTED_BY_VALUE));

        let attempts = config.max_attempts.max(1);
        let http = HttpClient::builder()
            .timeout(config.timeout)
            .max_attempts(attempts)
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build HttpClient: {e}")))?;

        // Room for every attempt plus backoff between them.
        let call_timeout = config
            .timeout
            .saturating_mul(u32::try_from(http.max_attempts()).unwrap_or(u32::MAX))
            .saturating_add(Duration::from_secs(1));

        Ok(Self { http, auth, base_url, call_timeout })
    }

    /// Base URL every request path is appended to, without a trailing `/`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// # Errors
    ///
    /// Transport, status and decode failures as [`ApiError`].
    #[instrument(skip(self), fields(path = %path))]
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.execute(Method::GET, path, None).await?;
        Self::decode(response, path).await
    }

    /// # Errors
    ///
    /// Transport, status and decode failures as [`ApiError`].
    #[instrument(skip(self, body), fields(path = %path))]
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_vec(body)
            .map_err(|e| ApiError::Client(format!("Failed to serialize body: {e}")))?;
        let response = self.execute(Method::POST, path, Some(body)).await?;
        Self::decode(response, path).await
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<Response, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let token = self.auth.access_token().await?;

        debug!(%method, url = %url, "API request");

        let mut request = self
            .http
            .request(method, &url)
            .header(AUTHORIZATION, basic_authorization(&token));
        if let Some(body) = body {
            request = request.header(CONTENT_TYPE, "application/json").body(body);
        }

        let response = tokio::time::timeout(self.call_timeout, self.http.send(request))
            .await
            .map_err(|_| ApiError::Timeout(self.call_timeout))??;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &url, &body));
        }

        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: Response, path: &str) -> Result<T, ApiError> {
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(format!("Failed to read response body: {e}")))?;

        // 204/205 carry no body; only types that accept `null` decode from it.
        if status == StatusCode::NO_CONTENT || status == StatusCode::RESET_CONTENT || bytes.is_empty() {
            return serde_json::from_value(serde_json::Value::Null).map_err(|_| {
                ApiError::Decode(format!("{path}: empty response ({})", status.as_u16()))
            });
        }

        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(format!("{path}: {e}")))
    }
}

/// Builder for API client
#[derive(Default)]
pub struct ApiClientBuilder {
    config: Option<ApiClientConfig>,
    auth: Option<Arc<dyn AccessTokenProvider>>,
}

impl ApiClient {
    /// Builder; both config and auth are required.
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }
}

impl ApiClientBuilder {
    /// Server location, timeout and attempts.
    pub fn config(mut self, config: ApiClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Token source for the `Authorization` header.
    pub fn auth(mut self, auth: Arc<dyn AccessTokenProvider>) -> Self {
        self.auth = Some(auth);
        self
    }

    /// # Errors
    ///
    /// Returns `ApiError::Config` if config or auth is missing.
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let config = self.config.ok_or_else(|| ApiError::Config("API config not set".into()))?;
        let auth = self.auth.ok_or_else(|| ApiError::Config("Auth provider not set".into()))?;

        ApiClient::new(config, auth)
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::auth::SessionStore;
    use crate::api::errors::ApiErrorCategory;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Pong {
        message: String,
    }

    fn client_for(server: &MockServer, session: Arc<SessionStore>) -> ApiClient {
        let config = ApiClientConfig {
            base_url: format!("{}/api/", server.uri()),
            timeout: Duration::from_secs(2),
            max_attempts: 2,
        };
        ApiClient::new(config, session).unwrap()
    }

    fn logged_in() -> Arc<SessionStore> {
        Arc::new(SessionStore::with_token("abc").unwrap())
    }

    #[tokio::test]
    async fn get_sends_auth_and_requested_by_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/ping"))
            .and(header("Authorization", "Basic YWJjOnRva2Vu"))
            .and(header("X-Requested-By", "cli"))
            .and(header("Accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "message": "pong" })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, logged_in());
        let pong: Pong = client.get("/ping").await.unwrap();

        assert_eq!(pong, Pong { message: "pong".into() });
    }

    #[tokio::test]
    async fn post_sends_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/echo"))
            .and(body_json(serde_json::json!({ "metrics": ["a", "b"] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "message": "ok" })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, logged_in());
        let body = serde_json::json!({ "metrics": ["a", "b"] });
        let reply: Pong = client.post("/echo", &body).await.unwrap();

        assert_eq!(reply.message, "ok");
    }

    #[tokio::test]
    async fn no_session_fails_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;

        let client = client_for(&server, Arc::new(SessionStore::new()));
        let result: Result<Pong, ApiError> = client.get("/ping").await;

        assert!(matches!(result, Err(ApiError::Auth(_))));
    }

    #[tokio::test]
    async fn unauthorized_maps_to_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, logged_in());
        let err = client.get::<Pong>("/ping").await.unwrap_err();

        assert!(matches!(err, ApiError::Auth(ref msg) if msg.contains("token expired")));
    }

    #[tokio::test]
    async fn persistent_server_error_maps_after_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&server)
            .await;

        let client = client_for(&server, logged_in());
        let err = client.get::<Pong>("/ping").await.unwrap_err();

        assert_eq!(err.category(), ApiErrorCategory::Server);
    }

    #[tokio::test]
    async fn malformed_body_maps_to_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server, logged_in());
        let err = client.get::<Pong>("/ping").await.unwrap_err();

        assert!(matches!(err, ApiError::Decode(ref msg) if msg.starts_with("/ping")));
    }

    #[tokio::test]
    async fn no_content_decodes_into_unit() {
        let server = MockServer::start().await;
        Mock::given(method("POST")).respond_with(ResponseTemplate::new(204)).mount(&server).await;

        let client = client_for(&server, logged_in());
        let result: Result<(), ApiError> = client.post("/noop", &()).await;

        assert!(result.is_ok());
    }

    #[test]
    fn builder_requires_config_and_auth() {
        assert!(matches!(ApiClient::builder().auth(logged_in()).build(), Err(ApiError::Config(_))));

        let config = ApiClientConfig {
            base_url: "http://localhost:9000/api".into(),
            timeout: Duration::from_secs(1),
            max_attempts: 1,
        };
        assert!(ApiClient::builder().config(config.clone()).build().is_err());

        let client = ApiClient::builder().config(config).auth(logged_in()).build().unwrap();
        assert_eq!(client.base_url(), "http://localhost:9000/api");
    }

    #[test]
    fn call_timeout_covers_every_attempt() {
        let config = ApiClientConfig {
            base_url: "http://localhost:9000/api/".into(),
            timeout: Duration::from_secs(2),
            max_attempts: 3,
        };

        let client = ApiClient::new(config, logged_in()).unwrap();

        assert_eq!(client.http.max_attempts(), 3);
        assert_eq!(client.call_timeout, Duration::from_secs(7));
        assert_eq!(client.base_url(), "http://localhost:9000/api");
    }

    #[test]
    fn empty_base_url_is_rejected() {
        let config =
            ApiClientConfig { base_url: "/".into(), timeout: Duration::from_secs(1), max_attempts: 1 };
        assert!(matches!(ApiClient::new(config, logged_in()), Err(ApiError::Config(_))));
    }
}
