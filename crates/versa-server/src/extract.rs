//! Extractors for Versa handlers
//!
//! Extractors pull typed data out of the (already migrated) request.

use crate::error::{ApiError, Result};
use crate::request::Request;
use bytes::Bytes;
use http::HeaderMap;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::ops::Deref;
use std::str::FromStr;
use versa_core::ApiVersion;

/// Trait for extracting data from request parts (headers, path, query)
pub trait FromRequestParts: Sized {
    fn from_request_parts(req: &Request) -> Result<Self>;
}

/// Trait for extracting data from the full request (including body)
pub trait FromRequest: Sized {
    fn from_request(req: &mut Request) -> impl Future<Output = Result<Self>> + Send;
}

impl<T: FromRequestParts> FromRequest for T {
    async fn from_request(req: &mut Request) -> Result<Self> {
        T::from_request_parts(req)
    }
}

/// JSON body extractor, and JSON response wrapper
///
/// The body a handler receives is always in the head shape:
///
/// ```rust,ignore
/// async fn create_user(Json(body): Json<UserCreate>) -> Created<User> {
///     // body.addresses exists even when the client sent 2024-01-01's `address`
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Json<T>(pub T);

impl<T: DeserializeOwned + Send> FromRequest for Json<T> {
    async fn from_request(req: &mut Request) -> Result<Self> {
        let body = req
            .take_body()
            .ok_or_else(|| ApiError::internal("Body already consumed"))?;

        let value: T = serde_json::from_slice(&body)?;
        Ok(Json(value))
    }
}

impl<T> Deref for Json<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Query string extractor
#[derive(Debug, Clone)]
pub struct Query<T>(pub T);

impl<T: DeserializeOwned> FromRequestParts for Query<T> {
    fn from_request_parts(req: &Request) -> Result<Self> {
        let query = req.query_string().unwrap_or("");
        let value: T = serde_urlencoded::from_str(query)
            .map_err(|e| ApiError::bad_request(format!("Invalid query string: {}", e)))?;
        Ok(Query(value))
    }
}

impl<T> Deref for Query<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Path parameter extractor
///
/// Parses the first parameter of the route template. Use
/// [`Request::path_param`] through [`PathParams`] for routes with several.
#[derive(Debug, Clone)]
pub struct Path<T>(pub T);

impl<T: FromStr> FromRequestParts for Path<T>
where
    T::Err: std::fmt::Display,
{
    fn from_request_parts(req: &Request) -> Result<Self> {
        let (_, value) = req
            .path_params()
            .first()
            .ok_or_else(|| ApiError::internal("Missing path parameter"))?;

        value
            .parse::<T>()
            .map(Path)
            .map_err(|e| ApiError::bad_request(format!("Invalid path parameter: {}", e)))
    }
}

impl<T> Deref for Path<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// All path parameters, by name
#[derive(Debug, Clone, Default)]
pub struct PathParams(pub Vec<(String, String)>);

impl PathParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

impl FromRequestParts for PathParams {
    fn from_request_parts(req: &Request) -> Result<Self> {
        Ok(PathParams(req.path_params().to_vec()))
    }
}

/// State extractor
///
/// ```rust,ignore
/// async fn handler(State(store): State<UserStore>) -> impl IntoResponse { .. }
/// ```
#[derive(Debug, Clone)]
pub struct State<T>(pub T);

impl<T: Clone + Send + Sync + 'static> FromRequestParts for State<T> {
    fn from_request_parts(req: &Request) -> Result<Self> {
        req.state().get::<T>().cloned().map(State).ok_or_else(|| {
            ApiError::internal(format!(
                "State of type `{}` not found. Did you forget to call .state()?",
                std::any::type_name::<T>()
            ))
        })
    }
}

impl<T> Deref for State<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// The version the request was resolved to
///
/// Handlers should not need it for body shapes, since migrations take care
/// of those, but it is available for behavior that differs by version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedVersion(pub ApiVersion);

impl FromRequestParts for ResolvedVersion {
    fn from_request_parts(req: &Request) -> Result<Self> {
        Ok(ResolvedVersion(req.api_version()))
    }
}

impl Deref for ResolvedVersion {
    type Target = ApiVersion;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Raw body bytes extractor
#[derive(Debug, Clone)]
pub struct Body(pub Bytes);

impl FromRequest for Body {
    async fn from_request(req: &mut Request) -> Result<Self> {
        let body = req
            .take_body()
            .ok_or_else(|| ApiError::internal("Body already consumed"))?;
        Ok(Body(body))
    }
}

impl Deref for Body {
    type Target = Bytes;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts for HeaderMap {
    fn from_request_parts(req: &Request) -> Result<Self> {
        Ok(req.headers().clone())
    }
}

/// Makes any extractor optional - returns None instead of error on failure.
impl<T: FromRequestParts> FromRequestParts for Option<T> {
    fn from_request_parts(req: &Request) -> Result<Self> {
        Ok(T::from_request_parts(req).ok())
    }
}
