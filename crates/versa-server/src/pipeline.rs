//! Per-request versioning pipeline
//!
//! 1. pick the version from the request
//! 2. match the route in that version's table
//! 3. validate a JSON body against that version's request schema
//! 4. migrate the request up to head
//! 5. run the head handler
//! 6. migrate a JSON response back down
//! 7. stamp the resolved version on the response

use crate::error::ApiError;
use crate::handler::BoxedHandler;
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use crate::router::{RouteMatch, RouteTable};
use crate::strategy::{pick, Picked, VersionFallback, VersionStrategy};
use bytes::Bytes;
use http::request::Parts;
use http::{header, Extensions, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use http_body_util::{BodyExt, Full};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, field, info, info_span, Instrument, Span};
use versa_core::model::{RouteEntry, RouteId};
use versa_core::{
    migrate_request, migrate_response, validate_body, ApiVersion, MigrationTarget, RequestInfo, ResponseInfo,
    VersionBundle, VersionedModels,
};
use versa_openapi::{docs_index, openapi_json, OpenApiSpec};

const REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

pub(crate) struct ServiceInner {
    pub(crate) bundle: VersionBundle,
    pub(crate) models: VersionedModels,
    pub(crate) tables: Vec<(ApiVersion, RouteTable)>,
    pub(crate) handlers: HashMap<RouteId, BoxedHandler>,
    pub(crate) state: Arc<Extensions>,
    pub(crate) strategy: VersionStrategy,
    pub(crate) fallback: VersionFallback,
    pub(crate) version_header: HeaderName,
    pub(crate) body_limit: Option<usize>,
    pub(crate) docs: Option<Docs>,
}

/// A built app, ready to serve requests of every version
///
/// Cheap to clone; the server hands one clone to each connection.
#[derive(Clone)]
pub struct VersionedService {
    pub(crate) inner: Arc<ServiceInner>,
}

pub(crate) struct Docs {
    path: String,
    openapi_path: String,
    title: String,
    specs: Vec<(ApiVersion, OpenApiSpec)>,
}

impl Docs {
    pub(crate) fn new(path: &str, title: String, specs: Vec<(ApiVersion, OpenApiSpec)>) -> Self {
        let path = format!("/{}", path.trim_matches('/'));
        let openapi_path = format!("{}/openapi.json", path.trim_end_matches('/'));
        Self {
            path,
            openapi_path,
            title,
            specs,
        }
    }

    fn respond(&self, parts: &Parts) -> Option<Response> {
        if parts.method != Method::GET {
            return None;
        }

        let path = parts.uri.path();
        if path == self.path {
            let versions: Vec<ApiVersion> = self.specs.iter().map(|(version, _)| *version).collect();
            return Some(docs_index(&self.title, &self.openapi_path, &versions));
        }
        if path != self.openapi_path {
            return None;
        }

        let requested = serde_urlencoded::from_str::<Vec<(String, String)>>(parts.uri.query().unwrap_or(""))
            .ok()
            .and_then(|pairs| pairs.into_iter().find(|(k, _)| k == "version"))
            .map(|(_, v)| v);

        let spec = match requested {
            None => self.specs.first(),
            Some(raw) => raw
                .parse::<ApiVersion>()
                .ok()
                .and_then(|version| self.specs.iter().find(|(v, _)| *v == version)),
        };

        Some(match spec {
            Some((_, spec)) => openapi_json(spec),
            None => ApiError::not_found("Unknown API version").into_response(),
        })
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| {
            let essence = ct.split(';').next().unwrap_or("").trim();
            essence == "application/json" || essence.ends_with("+json")
        })
        .unwrap_or(false)
}

fn parse_query(query: Option<&str>) -> Vec<(String, String)> {
    serde_urlencoded::from_str(query.unwrap_or("")).unwrap_or_default()
}

pub(crate) fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(&REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

impl VersionedService {
    /// Declared versions, newest first
    pub fn versions(&self) -> Vec<ApiVersion> {
        self.inner.bundle.values()
    }

    pub fn bundle(&self) -> &VersionBundle {
        &self.inner.bundle
    }

    pub fn models(&self) -> &VersionedModels {
        &self.inner.models
    }

    /// Largest accepted request body in bytes, `None` when unlimited
    pub fn body_limit(&self) -> Option<usize> {
        self.inner.body_limit
    }

    fn check_body_limit(&self, headers: &HeaderMap, len: usize) -> Result<(), ApiError> {
        let Some(limit) = self.inner.body_limit else {
            return Ok(());
        };
        let declared = headers
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(0);
        if declared > limit || len > limit {
            return Err(ApiError::payload_too_large(limit));
        }
        Ok(())
    }

    /// Serve one request
    pub async fn call(&self, req: http::Request<Bytes>) -> Response {
        let start = Instant::now();
        let (parts, body) = req.into_parts();
        let method = parts.method.clone();
        let path = parts.uri.path().to_string();
        let request_id = request_id(&parts.headers);

        if let Some(response) = self.inner.docs.as_ref().and_then(|docs| docs.respond(&parts)) {
            log_request(&method, &path, None, response.status(), start);
            return response;
        }

        let span = info_span!(
            "request",
            method = %method,
            path = %path,
            request_id = %request_id,
            version = field::Empty,
            status = field::Empty,
        );

        async move {
            let mut version = None;
            let picked = self
                .check_body_limit(&parts.headers, body.len())
                .and_then(|()| pick(&self.inner.strategy, self.inner.fallback, &self.inner.bundle, &parts));
            let mut response = match picked {
                Ok(picked) => {
                    Span::current().record("version", field::display(picked.version));
                    version = Some(picked.version);
                    match self.dispatch(picked, parts, body).await {
                        Ok(response) => response,
                        Err(err) => err.with_request_id(request_id.clone()).into_response(),
                    }
                }
                Err(err) => err.with_request_id(request_id.clone()).into_response(),
            };

            if let Some(version) = version {
                if let Ok(value) = HeaderValue::from_str(&version.to_string()) {
                    response.headers_mut().insert(self.inner.version_header.clone(), value);
                }
            }
            if let Ok(value) = HeaderValue::from_str(&request_id) {
                response.headers_mut().insert(REQUEST_ID, value);
            }

            Span::current().record("status", response.status().as_u16());
            log_request(&method, &path, version, response.status(), start);
            response
        }
        .instrument(span)
        .await
    }

    async fn dispatch(&self, picked: Picked, mut parts: Parts, body: Bytes) -> Result<Response, ApiError> {
        let inner = &self.inner;
        let version = picked.version;
        let set = inner
            .models
            .get(version)
            .ok_or_else(|| ApiError::internal(format!("No models generated for version {version}")))?;
        let table = inner
            .tables
            .iter()
            .find(|(v, _)| *v == version)
            .map(|(_, table)| table)
            .ok_or_else(|| ApiError::internal(format!("No routes generated for version {version}")))?;

        let (id, params) = match table.at(&picked.path, &parts.method) {
            RouteMatch::Found { id, params } => (id, params),
            RouteMatch::NotFound => {
                return Err(ApiError::not_found(format!(
                    "No route found for {} {}",
                    parts.method, picked.path
                )))
            }
            RouteMatch::MethodNotAllowed { allowed } => {
                let allowed_str: Vec<&str> = allowed.iter().map(|m| m.as_str()).collect();
                let mut response = ApiError::new(
                    StatusCode::METHOD_NOT_ALLOWED,
                    "method_not_allowed",
                    format!("Method {} not allowed for {}", parts.method, picked.path),
                )
                .into_response();
                if let Ok(value) = HeaderValue::from_str(&allowed_str.join(", ")) {
                    response.headers_mut().insert(header::ALLOW, value);
                }
                return Ok(response);
            }
        };

        let route = set
            .route(id)
            .ok_or_else(|| ApiError::internal("Matched route is not part of this version"))?;
        let head = inner
            .models
            .head()
            .route(id)
            .ok_or_else(|| ApiError::internal("Matched route has no head definition"))?;
        let handler = inner
            .handlers
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::internal("Matched route has no handler"))?;

        // Validate against this version's shape
        let mut body_value = match &route.def.request_schema {
            Some(schema) => {
                let raw: Value = if body.is_empty() {
                    Value::Null
                } else {
                    serde_json::from_slice(&body)?
                };
                Some(validate_body(set, schema, &raw)?)
            }
            None if is_json(&parts.headers) && !body.is_empty() => Some(serde_json::from_slice(&body)?),
            None => None,
        };

        let mut body = body;
        if !inner.bundle.is_latest(version) {
            let target = request_target(inner, head, &parts.method);
            let mut info = RequestInfo {
                body: body_value.take().unwrap_or(Value::Null),
                headers: std::mem::take(&mut parts.headers),
                query: parse_query(parts.uri.query()),
                path: picked.path.clone(),
                method: parts.method.clone(),
            };
            let original_query = info.query.clone();

            migrate_request(&inner.bundle, version, &target, &mut info)
                .map_err(|e| ApiError::migration_failed(e.to_string()))?;

            parts.headers = info.headers;
            if info.query != original_query {
                parts.uri = with_query(&parts.uri, &info.query)?;
            }
            if !info.body.is_null() || route.def.request_schema.is_some() {
                body_value = Some(info.body);
            }
        }

        if let Some(value) = body_value {
            let bytes = serde_json::to_vec(&value)
                .map_err(|e| ApiError::internal("Failed to serialize migrated body").with_internal(e.to_string()))?;
            body = Bytes::from(bytes);
            parts.headers.remove(header::CONTENT_LENGTH);
            parts
                .headers
                .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        let request = Request::new(parts, body, inner.state.clone(), params, version);
        let mut response = handler(request).await;

        // A status changed by `endpoint(..).had(status_code)` applies to the default status
        if route.def.status_code != head.def.status_code && response.status().as_u16() == head.def.status_code {
            if let Ok(status) = StatusCode::from_u16(route.def.status_code) {
                *response.status_mut() = status;
            }
        }

        if inner.bundle.is_latest(version) || !is_json(response.headers()) {
            return Ok(response);
        }
        self.migrate_response_body(version, head, response).await
    }

    async fn migrate_response_body(
        &self,
        version: ApiVersion,
        head: &RouteEntry,
        response: Response,
    ) -> Result<Response, ApiError> {
        let inner = &self.inner;
        let (mut parts, body) = response.into_parts();
        let bytes = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(never) => match never {},
        };
        let Ok(value) = serde_json::from_slice::<Value>(&bytes) else {
            return Ok(http::Response::from_parts(parts, Full::new(bytes)));
        };

        let method = head.def.methods.iter().next().cloned().unwrap_or(Method::GET);
        let mut target = MigrationTarget::new(&head.def.path, method);
        if let Some(schema) = &head.def.response_schema {
            target = target.with_schema(schema, inner.models.head());
        }

        let mut info = ResponseInfo {
            body: value,
            status: parts.status,
            headers: std::mem::take(&mut parts.headers),
        };
        migrate_response(&inner.bundle, version, &target, &mut info).map_err(|e| {
            error!(error = %e, "Response migration failed");
            ApiError::internal("Response migration failed").with_internal(e.to_string())
        })?;

        let body = serde_json::to_vec(&info.body)
            .map_err(|e| ApiError::internal("Failed to serialize migrated response").with_internal(e.to_string()))?;
        parts.status = info.status;
        parts.headers = info.headers;
        parts.headers.remove(header::CONTENT_LENGTH);
        Ok(http::Response::from_parts(parts, Full::new(Bytes::from(body))))
    }
}

fn request_target(inner: &ServiceInner, head: &RouteEntry, method: &Method) -> MigrationTarget {
    // Head routes are registered one method each
    let method = head.def.methods.iter().next().cloned().unwrap_or_else(|| method.clone());
    let target = MigrationTarget::new(&head.def.path, method);
    match &head.def.request_schema {
        Some(schema) => target.with_schema(schema, inner.models.head()),
        None => target,
    }
}

fn with_query(uri: &Uri, query: &[(String, String)]) -> Result<Uri, ApiError> {
    let encoded = serde_urlencoded::to_string(query)
        .map_err(|e| ApiError::internal("Failed to encode migrated query").with_internal(e.to_string()))?;
    let path_and_query = if encoded.is_empty() {
        uri.path().to_string()
    } else {
        format!("{}?{}", uri.path(), encoded)
    };
    path_and_query
        .parse()
        .map_err(|_| ApiError::internal("Migrated query is not a valid URI"))
}

fn log_request(method: &Method, path: &str, version: Option<ApiVersion>, status: StatusCode, start: Instant) {
    let elapsed = start.elapsed();
    let version = version.map(|v| v.to_string()).unwrap_or_default();

    if status.is_server_error() {
        error!(
            method = %method,
            path = %path,
            version = %version,
            status = %status.as_u16(),
            duration_ms = %elapsed.as_millis(),
            "Request failed"
        );
    } else {
        info!(
            method = %method,
            path = %path,
            version = %version,
            status = %status.as_u16(),
            duration_ms = %elapsed.as_millis(),
            "Request completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_json() {
        let mut headers = HeaderMap::new();
        assert!(!is_json(&headers));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json; charset=utf-8"));
        assert!(is_json(&headers));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/problem+json"));
        assert!(is_json(&headers));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        assert!(!is_json(&headers));
    }

    #[test]
    fn test_with_query_rewrites_only_the_query() {
        let uri: Uri = "/users?page=1".parse().unwrap();
        let rewritten = with_query(&uri, &[("offset".to_string(), "0".to_string())]).unwrap();
        assert_eq!(rewritten.to_string(), "/users?offset=0");
        assert_eq!(with_query(&uri, &[]).unwrap().to_string(), "/users");
    }

    #[test]
    fn test_docs_paths() {
        let docs = Docs::new("docs/", "Users".to_string(), Vec::new());
        assert_eq!(docs.path, "/docs");
        assert_eq!(docs.openapi_path, "/docs/openapi.json");
    }
}
