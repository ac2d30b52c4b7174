//! OpenAPI documentation for Versa
//!
//! Renders one OpenAPI 3.0 document per API version from the models that
//! `versa-core` generates, and an index page linking them.
//!
//! # Usage
//!
//! ```rust,ignore
//! let models = generate_versioned_models(&bundle, &registry)?;
//! for (version, set) in models.iter() {
//!     let doc = build_version_spec("Users API", version, set, false);
//!     println!("{}", doc.to_json());
//! }
//! ```

mod build;
mod docs;
mod schemas;
mod spec;

pub use build::{build_version_spec, path_params};
pub use docs::docs_html;
pub use schemas::{ErrorBodySchema, ErrorSchema, FieldErrorSchema};
pub use spec::{
    ApiInfo, MediaType, OpenApiSpec, Operation, Parameter, PathItem, RequestBody, ResponseSpec,
    SchemaRef,
};

use bytes::Bytes;
use http::{header, HeaderValue, Response, StatusCode};
use http_body_util::Full;

fn with_content_type(status: StatusCode, content_type: &'static str, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

/// Generate OpenAPI JSON response
pub fn openapi_json(spec: &OpenApiSpec) -> Response<Full<Bytes>> {
    match serde_json::to_string_pretty(&spec.to_json()) {
        Ok(json) => with_content_type(StatusCode::OK, "application/json", json),
        Err(_) => with_content_type(
            StatusCode::INTERNAL_SERVER_ERROR,
            "text/plain",
            "Failed to serialize OpenAPI spec",
        ),
    }
}

/// Generate the version index response
pub fn docs_index(title: &str, openapi_path: &str, versions: &[versa_core::ApiVersion]) -> Response<Full<Bytes>> {
    with_content_type(
        StatusCode::OK,
        "text/html; charset=utf-8",
        docs_html(title, openapi_path, versions),
    )
}
