//! TestClient for integration testing without network binding
//!
//! ```rust,ignore
//! let service = VersionedApp::new(versions(), models())
//!     .route("/users/{id}", get(get_user).response_schema("User"))
//!     .build()?;
//! let client = TestClient::new(service);
//!
//! let response = client.request(TestRequest::get("/users/1").version("2024-01-01")).await;
//! response.assert_status(200).assert_header("x-api-version", "2024-01-01");
//! ```

use crate::pipeline::VersionedService;
use crate::response::Response;
use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use http_body_util::BodyExt;
use serde::{de::DeserializeOwned, Serialize};

/// Sends requests through the full versioning pipeline of a built service
pub struct TestClient {
    service: VersionedService,
}

impl TestClient {
    pub fn new(service: VersionedService) -> Self {
        Self { service }
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.request(TestRequest::get(path)).await
    }

    pub async fn post_json<T: Serialize>(&self, path: &str, body: &T) -> TestResponse {
        self.request(TestRequest::post(path).json(body)).await
    }

    pub async fn request(&self, req: TestRequest) -> TestResponse {
        let mut builder = http::Request::builder().method(req.method).uri(req.path.as_str());
        if let Some(headers) = builder.headers_mut() {
            headers.extend(req.headers);
        }

        let request = match builder.body(req.body.unwrap_or_default()) {
            Ok(request) => request,
            Err(err) => panic!("Invalid test request for {}: {}", req.path, err),
        };

        TestResponse::from_response(self.service.call(request).await).await
    }
}

/// Test request builder
#[derive(Debug, Clone)]
pub struct TestRequest {
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl TestRequest {
    fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(path: &str) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: &str) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: &str) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: &str) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: &str) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn header(mut self, key: &str, value: &str) -> Self {
        if let (Ok(name), Ok(val)) = (
            key.parse::<http::header::HeaderName>(),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, val);
        }
        self
    }

    /// Pin the request to `version` through the default `x-api-version` header
    pub fn version(self, version: &str) -> Self {
        self.header("x-api-version", version)
    }

    pub fn json<T: Serialize>(mut self, body: &T) -> Self {
        if let Ok(bytes) = serde_json::to_vec(body) {
            self.body = Some(Bytes::from(bytes));
            self.headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
        }
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Test response with assertion helpers
#[derive(Debug)]
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    async fn from_response(response: Response) -> Self {
        let (parts, body) = response.into_parts();
        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(never) => match never {},
        };

        Self {
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    pub fn assert_status(&self, expected: u16) -> &Self {
        assert_eq!(
            self.status.as_u16(), expected,
            "Expected status {}, got {}. Body: {}",
            expected, self.status, self.text()
        );
        self
    }

    pub fn assert_header(&self, key: &str, expected: &str) -> &Self {
        let actual = self.header(key).unwrap_or("");
        assert_eq!(
            actual, expected,
            "Expected header '{}' to be '{}', got '{}'",
            key, expected, actual
        );
        self
    }

    pub fn assert_json<T: DeserializeOwned + PartialEq + std::fmt::Debug>(&self, expected: &T) -> &Self {
        match self.json::<T>() {
            Ok(actual) => assert_eq!(&actual, expected, "JSON body mismatch"),
            Err(err) => panic!("Failed to parse response body as JSON: {err}. Body: {}", self.text()),
        }
        self
    }
}
