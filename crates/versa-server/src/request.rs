//! Request types for Versa handlers

use bytes::Bytes;
use http::{request::Parts, Extensions, HeaderMap, Method, Uri};
use std::sync::Arc;
use versa_core::ApiVersion;

/// HTTP request as handed to a head handler
///
/// By the time a handler sees it the body has been validated against the
/// client's version and migrated up to the head shape.
pub struct Request {
    pub(crate) parts: Parts,
    pub(crate) body: Option<Bytes>,
    pub(crate) state: Arc<Extensions>,
    pub(crate) path_params: Vec<(String, String)>,
    pub(crate) api_version: ApiVersion,
}

impl Request {
    pub(crate) fn new(
        parts: Parts,
        body: Bytes,
        state: Arc<Extensions>,
        path_params: Vec<(String, String)>,
        api_version: ApiVersion,
    ) -> Self {
        Self {
            parts,
            body: Some(body),
            state,
            path_params,
            api_version,
        }
    }

    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    pub fn extensions(&self) -> &Extensions {
        &self.parts.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.parts.extensions
    }

    pub fn path(&self) -> &str {
        self.parts.uri.path()
    }

    pub fn query_string(&self) -> Option<&str> {
        self.parts.uri.query()
    }

    /// Take the body bytes (can only be called once)
    pub fn take_body(&mut self) -> Option<Bytes> {
        self.body.take()
    }

    /// Path parameters in template order
    pub fn path_params(&self) -> &[(String, String)] {
        &self.path_params
    }

    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn state(&self) -> &Arc<Extensions> {
        &self.state
    }

    /// Version the client is pinned to, after resolution
    pub fn api_version(&self) -> ApiVersion {
        self.api_version
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.parts.method)
            .field("uri", &self.parts.uri)
            .field("api_version", &self.api_version)
            .finish()
    }
}
