//! # Versa Core
//!
//! Version bundles, version changes and the per-version models derived from
//! a single head model, plus the request/response migration chains that let
//! head handlers serve every older version.
//!
//! This crate has no HTTP server. Use `versa` for the full stack.

pub mod changelog;
mod error;
pub mod generation;
pub mod migration;
pub mod model;
pub mod structure;
pub mod validate;
mod version;

// Public API
pub use changelog::{generate_changelog, Changelog, ChangelogEntry};
pub use error::{
    BundleError, FieldViolation, GenerationError, MigrationError, ModelError, ValidationError,
};
pub use generation::{generate_versioned_models, VersionedModels};
pub use migration::{
    migrate_request, migrate_response, MigrationTarget, RequestInfo, RequestMigration,
    ResponseInfo, ResponseMigration,
};
pub use model::{ModelRegistry, ModelSet};
pub use structure::{Version, VersionBundle, VersionChange};
pub use validate::validate_body;
pub use version::{ApiVersion, VersionParseError};
