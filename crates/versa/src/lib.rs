//! # Versa
//!
//! Date-based API versioning. Write handlers and models for the latest
//! version only, then describe how each older version differed. Versa
//! generates the schemas, routes and OpenAPI documents of every version and
//! migrates requests up to the latest shape and responses back down.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use versa::prelude::*;
//!
//! #[derive(Serialize, Deserialize, ToSchema)]
//! struct User {
//!     name: String,
//!     addresses: Vec<String>,
//! }
//!
//! async fn create_user(Json(user): Json<User>) -> Created<User> {
//!     Created(user)
//! }
//!
//! #[tokio::main]
//! async fn main() -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let versions = VersionBundle::new(vec![
//!         Version::parse("2024-06-01")?.change(
//!             VersionChange::new("AddressesBecameAList")
//!                 .description("`address` became `addresses`")
//!                 .instruction(schema("User").field("addresses").didnt_exist())
//!                 .instruction(schema("User").field("address").existed_as(FieldType::String, FieldInfo::new())),
//!         ),
//!         Version::parse("2024-01-01")?,
//!     ])?;
//!
//!     VersionedApp::new(versions, ModelRegistry::new().register::<User>())
//!         .route("/users", post(create_user).request_schema("User").response_schema("User").status(201))
//!         .docs("/docs")
//!         .run("127.0.0.1:8080")
//!         .await
//! }
//! ```
//!
//! ## Crates
//!
//! - [`versa_core`]: version bundles, instructions, model generation, migrations
//! - [`versa_server`]: the HTTP server that picks a version per request
//! - [`versa_openapi`]: one OpenAPI document per version

// Re-export core functionality
pub use versa_core::*;
pub use versa_server::*;

pub use versa_openapi as openapi;

/// Prelude module - import everything you need with `use versa::prelude::*`
pub mod prelude {
    // Versions and changes
    pub use versa_core::structure::{endpoint, enum_, schema, EndpointChange};
    pub use versa_core::{
        ApiVersion, MigrationError, ModelRegistry, RequestInfo, RequestMigration, ResponseInfo,
        ResponseMigration, Version, VersionBundle, VersionChange,
    };

    // Models
    pub use versa_core::model::{
        EnumDef, FieldAttr, FieldChange, FieldDef, FieldInfo, FieldType, RouteDef, SchemaDef,
    };

    // Server
    pub use versa_server::{
        delete, get, patch, post, put, ApiError, Created, Html, IntoResponse, Json, NoContent, Path,
        PathParams, Query, ResolvedVersion, Response, Result, ServerConfig, State, VersionFallback,
        VersionStrategy, VersionedApp, VersionedService,
    };

    // Re-export commonly used external types
    pub use http::{Method, StatusCode};
    pub use serde::{Deserialize, Serialize};
    pub use tracing::{debug, error, info, trace, warn};
    pub use utoipa::ToSchema;
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn prelude_imports_work() {
        let _: fn() -> Result<()> = || Ok(());
        let _ = VersionStrategy::header();
    }
}
