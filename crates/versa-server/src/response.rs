//! Response types for Versa handlers
//!
//! Handlers return anything implementing [`IntoResponse`]. JSON responses
//! are the ones the pipeline migrates back to older versions, so handlers
//! that serve versioned bodies should return [`Json`] or [`Created`].
//!
//! | Type | Status | Content-Type |
//! |------|--------|--------------|
//! | `String` / `&str` | 200 | text/plain |
//! | `()` | 200 | - |
//! | [`Json<T>`] | 200 | application/json |
//! | [`Created<T>`] | 201 | application/json |
//! | [`NoContent`] | 204 | - |
//! | [`Html<T>`] | 200 | text/html |
//! | [`ApiError`] | varies | application/json |

use crate::error::{ApiError, ErrorResponse};
use crate::extract::Json;
use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, StatusCode};
use http_body_util::Full;
use serde::Serialize;

/// HTTP Response type
pub type Response = http::Response<Full<Bytes>>;

/// Trait for types that can be converted into an HTTP response
pub trait IntoResponse {
    /// Convert self into a Response
    fn into_response(self) -> Response;
}

pub(crate) fn build(status: StatusCode, content_type: Option<&'static str>, body: Bytes) -> Response {
    let mut response = http::Response::new(Full::new(body));
    *response.status_mut() = status;
    if let Some(content_type) = content_type {
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    }
    response
}

fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Response {
    match serde_json::to_vec(value) {
        Ok(body) => build(status, Some("application/json"), Bytes::from(body)),
        Err(err) => ApiError::internal(format!("Failed to serialize response: {}", err)).into_response(),
    }
}

impl IntoResponse for Response {
    fn into_response(self) -> Response {
        self
    }
}

impl IntoResponse for () {
    fn into_response(self) -> Response {
        build(StatusCode::OK, None, Bytes::new())
    }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response {
        build(StatusCode::OK, Some("text/plain; charset=utf-8"), Bytes::from(self))
    }
}

impl IntoResponse for String {
    fn into_response(self) -> Response {
        build(StatusCode::OK, Some("text/plain; charset=utf-8"), Bytes::from(self))
    }
}

impl IntoResponse for StatusCode {
    fn into_response(self) -> Response {
        build(self, None, Bytes::new())
    }
}

impl<R: IntoResponse> IntoResponse for (StatusCode, R) {
    fn into_response(self) -> Response {
        let mut response = self.1.into_response();
        *response.status_mut() = self.0;
        response
    }
}

impl<R: IntoResponse> IntoResponse for (StatusCode, HeaderMap, R) {
    fn into_response(self) -> Response {
        let mut response = self.2.into_response();
        *response.status_mut() = self.0;
        response.headers_mut().extend(self.1);
        response
    }
}

impl<T: IntoResponse, E: IntoResponse> IntoResponse for Result<T, E> {
    fn into_response(self) -> Response {
        match self {
            Ok(v) => v.into_response(),
            Err(e) => e.into_response(),
        }
    }
}

// Internal details are masked according to the detected environment
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        if status.is_server_error() {
            tracing::error!(
                error_type = %self.error_type,
                internal = self.internal.as_deref().unwrap_or(""),
                "{}",
                self.message
            );
        }
        json_response(status, &ErrorResponse::from(self))
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        json_response(StatusCode::OK, &self.0)
    }
}

/// 201 Created response wrapper
///
/// ```rust,ignore
/// async fn create_user(Json(body): Json<UserCreate>) -> Result<Created<User>> {
///     Ok(Created(store.insert(body)?))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Created<T>(pub T);

impl<T: Serialize> IntoResponse for Created<T> {
    fn into_response(self) -> Response {
        json_response(StatusCode::CREATED, &self.0)
    }
}

/// 204 No Content response
#[derive(Debug, Clone, Copy)]
pub struct NoContent;

impl IntoResponse for NoContent {
    fn into_response(self) -> Response {
        build(StatusCode::NO_CONTENT, None, Bytes::new())
    }
}

/// HTML response wrapper
#[derive(Debug, Clone)]
pub struct Html<T>(pub T);

impl<T: Into<String>> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        build(StatusCode::OK, Some("text/html; charset=utf-8"), Bytes::from(self.0.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::json;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_json_and_created() {
        let response = Json(json!({"name": "Ann"})).into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(body_json(response).await, json!({"name": "Ann"}));

        let response = Created(json!({"id": 1})).into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_api_error_envelope() {
        let response = ApiError::not_found("User 7 not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            json!({"error": {"type": "not_found", "message": "User 7 not found"}})
        );
    }

    #[test]
    fn test_tuple_overrides_status() {
        let response = (StatusCode::ACCEPTED, "queued").into_response();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(NoContent.into_response().status(), StatusCode::NO_CONTENT);
        let html = Html("<p>hi</p>").into_response();
        assert_eq!(html.headers()[header::CONTENT_TYPE], "text/html; charset=utf-8");
    }
}
