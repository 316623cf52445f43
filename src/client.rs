//! HTTP client for the Firefly III REST API.
//!
//! Wraps a [`reqwest::Client`] bound to one instance URL with bearer-token
//! headers. Every response goes through [`classify_status`]; every transport
//! failure through [`classify_transport`]. Nothing is retried.

use core::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, Request, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::cache::SharedCache;
use crate::config::{Settings, TOKEN_VAR, URL_VAR};
use crate::error::{FireflyError, classify_status, classify_transport};

/// Per-request timeout.
pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Query type used by requests that carry no query string.
type NoQuery = [(&'static str, &'static str)];

/// Path of the instance information endpoint.
pub(crate) const ABOUT_PATH: &str = "/api/v1/about";

/// Client for a single Firefly III instance.
///
/// Owns one connection pool for its lifetime. Call [`FireflyClient::close`]
/// when done; dropping the client releases the pool on every other path.
pub(crate) struct FireflyClient {
    /// Base URL without a trailing slash.
    base_url: String,
    /// Personal access token, stored verbatim.
    token: String,
    /// Underlying HTTP transport.
    http: reqwest::Client,
    /// Optional cache consulted by GET requests.
    cache: Option<SharedCache>,
}

impl core::fmt::Debug for FireflyClient {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FireflyClient")
            .field("base_url", &self.base_url)
            .field("token_length", &self.token.len())
            .field("cached", &self.cache.is_some())
            .finish_non_exhaustive()
    }
}

impl FireflyClient {
    /// Creates a client with the default request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`FireflyError::Validation`] if `base_url` or `token` is empty.
    pub(crate) fn new(base_url: &str, token: &str) -> Result<Self, FireflyError> {
        Self::with_timeout(base_url, token, DEFAULT_TIMEOUT)
    }

    /// Creates a client from loaded [`Settings`].
    ///
    /// # Errors
    ///
    /// Returns [`FireflyError::Validation`] if either setting is missing.
    pub(crate) fn from_settings(settings: &Settings) -> Result<Self, FireflyError> {
        Self::new(
            settings.url.as_deref().unwrap_or_default(),
            settings.token.as_deref().unwrap_or_default(),
        )
    }

    /// Creates a client with a custom request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`FireflyError::Validation`] if `base_url` or `token` is empty
    /// or the token cannot be sent as a header, and [`FireflyError::Other`]
    /// if the HTTP transport cannot be built.
    pub(crate) fn with_timeout(
        base_url: &str,
        token: &str,
        timeout: Duration,
    ) -> Result<Self, FireflyError> {
        let trimmed = base_url.strip_suffix('/').unwrap_or(base_url);
        if trimmed.is_empty() {
            return Err(FireflyError::Validation(format!(
                "{URL_VAR} environment variable is not set"
            )));
        }
        if token.is_empty() {
            return Err(FireflyError::Validation(format!(
                "{TOKEN_VAR} environment variable is not set"
            )));
        }

        let mut auth = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_err| {
            FireflyError::Validation(format!("{TOKEN_VAR} contains invalid header characters"))
        })?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        let _auth = headers.insert(AUTHORIZATION, auth);
        let _accept = headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let _content_type =
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|err| FireflyError::Other(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            base_url: trimmed.to_owned(),
            token: token.to_owned(),
            http,
            cache: None,
        })
    }

    /// Serves GET requests through `cache`.
    #[must_use]
    pub(crate) fn with_cache(mut self, cache: SharedCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Access token as configured.
    #[cfg(test)]
    #[must_use]
    pub(crate) fn token(&self) -> &str {
        &self.token
    }

    /// Releases the connection pool.
    pub(crate) fn close(self) {
        tracing::debug!(base_url = %self.base_url, "closing Firefly III client");
        drop(self);
    }

    /// Joins `path` onto the base URL.
    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    /// Builds a request without sending it.
    fn build<Q, B>(
        &self,
        method: Method,
        path: &str,
        query: Option<&Q>,
        body: Option<&B>,
    ) -> Result<Request, FireflyError>
    where
        Q: Serialize + ?Sized,
        B: Serialize + ?Sized,
    {
        let mut builder = self.http.request(method, self.url(path));
        if let Some(params) = query {
            builder = builder.query(params);
        }
        if let Some(payload) = body {
            builder = builder.json(payload);
        }
        builder
            .build()
            .map_err(|err| classify_transport(err, &self.base_url))
    }

    /// Sends a request and returns the status and raw body.
    async fn send(&self, request: Request) -> Result<(StatusCode, Vec<u8>), FireflyError> {
        let method = request.method().clone();
        let url = request.url().clone();
        let response = self
            .http
            .execute(request)
            .await
            .map_err(|err| classify_transport(err, &self.base_url))?;
        let status = response.status();
        tracing::debug!(%method, %url, status = status.as_u16(), "Firefly III response");
        let bytes = response
            .bytes()
            .await
            .map_err(|err| classify_transport(err, &self.base_url))?;
        Ok((status, bytes.to_vec()))
    }

    /// Sends a GET, consulting the cache first when one is attached.
    async fn fetch(&self, request: Request) -> Result<Value, FireflyError> {
        let Some(cache) = self.cache.as_ref() else {
            let (status, body) = self.send(request).await?;
            return classify_status(status.as_u16(), &body);
        };

        let key = request.url().as_str().to_owned();
        let hit = cache.lock().await.get(&key);
        if let Some(value) = hit {
            tracing::debug!(%key, "cache hit");
            return Ok(value);
        }

        let (status, body) = self.send(request).await?;
        let value = classify_status(status.as_u16(), &body)?;
        cache.lock().await.set(&key, value.clone());
        Ok(value)
    }

    /// Makes a GET request.
    ///
    /// # Errors
    ///
    /// Returns the classified error for transport failures, error statuses,
    /// or a body that is not JSON.
    pub(crate) async fn get(&self, path: &str) -> Result<Value, FireflyError> {
        let request = self.build::<NoQuery, Value>(Method::GET, path, None, None)?;
        self.fetch(request).await
    }

    /// Makes a GET request with query parameters.
    ///
    /// # Errors
    ///
    /// Same as [`FireflyClient::get`].
    pub(crate) async fn get_with_query<Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<Value, FireflyError> {
        let request = self.build::<Q, Value>(Method::GET, path, Some(query), None)?;
        self.fetch(request).await
    }

    /// Makes a GET request and decodes the body into `T`.
    ///
    /// # Errors
    ///
    /// Same as [`FireflyClient::get`], plus [`FireflyError::Other`] when the
    /// body does not match `T`.
    pub(crate) async fn get_as<T: DeserializeOwned>(&self, path: &str) -> Result<T, FireflyError> {
        decode(self.get(path).await?)
    }

    /// Makes a GET request with query parameters and decodes the body.
    ///
    /// # Errors
    ///
    /// Same as [`FireflyClient::get_as`].
    pub(crate) async fn get_with_query_as<T, Q>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<T, FireflyError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        decode(self.get_with_query(path, query).await?)
    }

    /// Sends a request with an optional JSON body, bypassing the cache.
    async fn write<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Value, FireflyError> {
        let request = self.build::<NoQuery, B>(method, path, None, body)?;
        let (status, bytes) = self.send(request).await?;
        classify_status(status.as_u16(), &bytes)
    }

    /// Makes a POST request.
    ///
    /// # Errors
    ///
    /// Same as [`FireflyClient::get`].
    pub(crate) async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<Value, FireflyError> {
        self.write(Method::POST, path, body).await
    }

    /// Makes a PUT request.
    ///
    /// # Errors
    ///
    /// Same as [`FireflyClient::get`].
    pub(crate) async fn put<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<Value, FireflyError> {
        self.write(Method::PUT, path, body).await
    }

    /// Makes a PATCH request.
    ///
    /// Firefly III's v1 API updates through PUT, so no tool calls this yet.
    ///
    /// # Errors
    ///
    /// Same as [`FireflyClient::get`].
    #[allow(dead_code, reason = "kept for endpoints that accept PATCH")]
    pub(crate) async fn patch<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<Value, FireflyError> {
        self.write(Method::PATCH, path, body).await
    }

    /// Makes a DELETE request. A 204 reply yields `{"success": true}`.
    ///
    /// # Errors
    ///
    /// Same as [`FireflyClient::get`].
    pub(crate) async fn delete(&self, path: &str) -> Result<Value, FireflyError> {
        let request = self.build::<NoQuery, Value>(Method::DELETE, path, None, None)?;
        let (status, body) = self.send(request).await?;
        if status == StatusCode::NO_CONTENT {
            return Ok(json!({ "success": true }));
        }
        classify_status(status.as_u16(), &body)
    }

    /// Checks connectivity by fetching `/api/v1/about`.
    ///
    /// # Errors
    ///
    /// Same as [`FireflyClient::get`].
    pub(crate) async fn test_connection(&self) -> Result<Value, FireflyError> {
        tracing::info!(base_url = %self.base_url, "testing connection to Firefly III API");
        match self.get(ABOUT_PATH).await {
            Ok(about) => {
                tracing::info!("connection successful");
                Ok(about)
            }
            Err(err) => {
                tracing::error!(%err, "connection test failed");
                Err(err)
            }
        }
    }
}

/// Decodes a JSON value into a typed resource schema.
fn decode<T: DeserializeOwned>(value: Value) -> Result<T, FireflyError> {
    serde_json::from_value(value)
        .map_err(|err| FireflyError::Other(format!("unexpected response from API: {err}")))
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::missing_docs_in_private_items,
    clippy::panic,
    clippy::use_debug,
    clippy::default_numeric_fallback,
    clippy::wildcard_enum_match_arm,
    reason = "test code uses expect and panics for readability"
)]
mod tests {
    use alloc::sync::Arc;
    use core::time::Duration;

    use serde_json::{Value, json};
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::FireflyClient;
    use crate::cache::ResponseCache;
    use crate::config::Settings;
    use crate::error::{ErrorKind, FireflyError};

    fn client_for(server: &MockServer) -> FireflyClient {
        FireflyClient::new(&server.uri(), "test-token-123").expect("valid client")
    }

    #[test]
    fn strips_exactly_one_trailing_slash() {
        let client = FireflyClient::new("https://firefly.example.com/", "token").expect("valid");
        assert_eq!(client.base_url(), "https://firefly.example.com");
        let doubled = FireflyClient::new("https://firefly.example.com//", "token").expect("valid");
        assert_eq!(doubled.base_url(), "https://firefly.example.com/");
        assert_eq!(doubled.token(), "token");
    }

    #[test]
    fn stores_token_verbatim() {
        let client =
            FireflyClient::new("https://custom.firefly.com", " spaced token ").expect("valid");
        assert_eq!(client.base_url(), "https://custom.firefly.com");
        assert_eq!(client.token(), " spaced token ");
    }

    #[test]
    fn empty_url_is_validation_error() {
        let err = FireflyClient::new("", "token").expect_err("empty URL must fail");
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("FIREFLY_URL"));
    }

    #[test]
    fn empty_token_is_validation_error() {
        let err = FireflyClient::new("https://firefly.example.com", "").expect_err("must fail");
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("FIREFLY_TOKEN"));
    }

    #[test]
    fn missing_settings_are_validation_errors() {
        let err = FireflyClient::from_settings(&Settings::new(
            Some("https://firefly.example.com".to_owned()),
            None,
        ))
        .expect_err("missing token must fail");
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn get_sends_auth_headers_and_returns_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/accounts"))
            .and(header("Authorization", "Bearer test-token-123"))
            .and(header("Accept", "application/json"))
            .and(header("Content-Type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": "test"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = client.get("/api/v1/accounts").await.expect("GET succeeds");
        assert_eq!(result, json!({"data": "test"}));
        client.close();
    }

    #[tokio::test]
    async fn get_with_query_forwards_parameters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/accounts"))
            .and(query_param("type", "asset"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = client
            .get_with_query("api/v1/accounts", &[("type", "asset"), ("page", "2")])
            .await
            .expect("GET succeeds");
        assert_eq!(result, json!({"data": []}));
    }

    #[tokio::test]
    async fn post_put_patch_send_json_bodies() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/accounts"))
            .and(body_json(json!({"name": "Test"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "123"})))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/api/v1/accounts/123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"updated": true})))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/api/v1/accounts/123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"patched": true})))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let created = client
            .post("/api/v1/accounts", Some(&json!({"name": "Test"})))
            .await
            .expect("POST succeeds");
        assert_eq!(created, json!({"id": "123"}));
        let updated = client
            .put("/api/v1/accounts/123", Some(&json!({"name": "Updated"})))
            .await
            .expect("PUT succeeds");
        assert_eq!(updated, json!({"updated": true}));
        let patched = client
            .patch("/api/v1/accounts/123", Some(&json!({"balance": 100})))
            .await
            .expect("PATCH succeeds");
        assert_eq!(patched, json!({"patched": true}));
    }

    #[tokio::test]
    async fn delete_no_content_is_synthetic_success() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/accounts/123"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = client.delete("/api/v1/accounts/123").await.expect("DELETE");
        assert_eq!(result, json!({"success": true}));
    }

    #[tokio::test]
    async fn delete_with_body_is_parsed() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/accounts/123"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"deleted": true, "id": "123"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = client.delete("/api/v1/accounts/123").await.expect("DELETE");
        assert_eq!(result, json!({"deleted": true, "id": "123"}));
    }

    #[tokio::test]
    async fn unauthorized_maps_to_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.get("/api/v1/accounts").await.expect_err("401");
        assert_eq!(err.kind(), ErrorKind::Auth);
        assert!(err.to_string().contains("Authentication failed"));
    }

    #[tokio::test]
    async fn forbidden_maps_to_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.get("/api/v1/accounts").await.expect_err("403");
        assert_eq!(err.kind(), ErrorKind::Auth);
        assert!(err.to_string().contains("Permission denied"));
    }

    #[tokio::test]
    async fn api_error_carries_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({"message": "Invalid request data"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .post("/api/v1/accounts", Some(&json!({})))
            .await
            .expect_err("400");
        match err {
            FireflyError::Api {
                message,
                status,
                body,
            } => {
                assert_eq!(message, "Invalid request data");
                assert_eq!(status, 400);
                assert_eq!(body, Some(json!({"message": "Invalid request data"})));
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn server_error_with_html_body_uses_generic_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("<h1>oops</h1>"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.get("/api/v1/accounts").await.expect_err("500");
        assert_eq!(err.status_code(), Some(500));
        assert_eq!(err.to_string(), "API error: 500");
    }

    #[tokio::test]
    async fn invalid_json_success_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.get("/api/v1/accounts").await.expect_err("bad JSON");
        assert_eq!(err.kind(), ErrorKind::Api);
        assert!(err.to_string().contains("Invalid JSON response"));
    }

    #[tokio::test]
    async fn refused_connection_names_base_url() {
        let client = FireflyClient::new("http://127.0.0.1:1", "token").expect("valid client");
        let err = client.get("/api/v1/about").await.expect_err("nothing listens");
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert!(err.to_string().contains("Failed to connect to http://127.0.0.1:1"));
    }

    #[tokio::test]
    async fn unbuildable_request_is_connection_error() {
        let client = FireflyClient::new("not a url", "token").expect("valid client");
        let err = client.get("/api/v1/about").await.expect_err("URL cannot be parsed");
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert!(err.to_string().starts_with("HTTP error:"));
    }

    #[tokio::test]
    async fn slow_upstream_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client =
            FireflyClient::with_timeout(&server.uri(), "token", Duration::from_millis(50))
                .expect("valid client");
        let err = client.get("/api/v1/about").await.expect_err("timeout");
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert_eq!(err.to_string(), "Request timed out");
    }

    #[tokio::test]
    async fn cached_get_hits_upstream_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/currencies"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .expect(1)
            .mount(&server)
            .await;

        let cache = ResponseCache::shared();
        let client = client_for(&server).with_cache(Arc::clone(&cache));
        let first = client.get("/api/v1/currencies").await.expect("first GET");
        let second = client.get("/api/v1/currencies").await.expect("second GET");
        assert_eq!(first, second);
        assert_eq!(cache.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(2)
            .mount(&server)
            .await;

        let cache = ResponseCache::shared();
        let client = client_for(&server).with_cache(Arc::clone(&cache));
        let _first = client.get("/api/v1/tags").await.expect_err("500");
        let _second = client.get("/api/v1/tags").await.expect_err("500");
        assert_eq!(cache.lock().await.len(), 0);
    }

    #[tokio::test]
    async fn writes_do_not_invalidate_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": ["old"]})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": "new"})))
            .mount(&server)
            .await;

        let client = client_for(&server).with_cache(ResponseCache::shared());
        let before = client.get("/api/v1/tags").await.expect("GET");
        let _created = client
            .post("/api/v1/tags", Some(&json!({"tag": "new"})))
            .await
            .expect("POST");
        let after = client.get("/api/v1/tags").await.expect("cached GET");
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_connection_returns_about() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/about"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"version": "5.7.0", "api_version": "1.5.0", "php_version": "8.1.0"}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let about = client.test_connection().await.expect("connected");
        assert_eq!(
            about.pointer("/data/version").and_then(Value::as_str),
            Some("5.7.0")
        );
    }
}
