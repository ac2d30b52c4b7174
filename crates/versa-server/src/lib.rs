//! Versioned HTTP server for Versa
//!
//! Serves every version of a [`VersionBundle`](versa_core::VersionBundle)
//! from a single set of head handlers. Each request is pinned to a version,
//! routed through that version's routes, validated against that version's
//! schemas and migrated to and from the head shapes.

mod app;
mod config;
mod error;
mod extract;
mod handler;
mod pipeline;
mod request;
mod response;
mod router;
mod server;
mod strategy;
mod test_client;

pub use app::{VersionedApp, DEFAULT_BODY_LIMIT};
pub use config::{init_tracing, load_dotenv, ConfigError, Environment, ServerConfig};
pub use error::{get_environment, ApiError, AppError, FieldError, Result};
pub use extract::{Body, FromRequest, FromRequestParts, Json, Path, PathParams, Query, ResolvedVersion, State};
pub use handler::Handler;
pub use pipeline::VersionedService;
pub use request::Request;
pub use response::{Created, Html, IntoResponse, NoContent, Response};
pub use router::{delete, get, patch, post, put, MethodRouter};
pub use strategy::{VersionFallback, VersionStrategy};
pub use test_client::{TestClient, TestRequest, TestResponse};
