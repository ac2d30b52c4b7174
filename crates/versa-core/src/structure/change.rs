//! Version changes

use super::AlterInstruction;
use crate::migration::{RequestMigration, ResponseMigration};

/// One self-contained change between a version and the version before it
///
/// Instructions describe how models looked before the change. Migrations
/// convert request bodies up to the newer shape and response bodies down to
/// the older one.
///
/// # Example
///
/// ```rust
/// use versa_core::model::{FieldInfo, FieldType};
/// use versa_core::migration::RequestMigration;
/// use versa_core::structure::{schema, VersionChange};
///
/// let change = VersionChange::new("AddressesBecameAList")
///     .description("`User.address` was replaced by `User.addresses`")
///     .instruction(schema("User").field("addresses").didnt_exist())
///     .instruction(
///         schema("User")
///             .field("address")
///             .existed_as(FieldType::String, FieldInfo::new()),
///     )
///     .request_migration(RequestMigration::for_schema("User").transform(|request| {
///         if let Some(address) = request.body.get("address").cloned() {
///             request.body["addresses"] = serde_json::json!([address]);
///         }
///         Ok(())
///     }));
/// assert_eq!(change.instructions().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct VersionChange {
    name: String,
    description: String,
    instructions: Vec<AlterInstruction>,
    request_migrations: Vec<RequestMigration>,
    response_migrations: Vec<ResponseMigration>,
    hidden: bool,
}

impl VersionChange {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            instructions: Vec::new(),
            request_migrations: Vec::new(),
            response_migrations: Vec::new(),
            hidden: false,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn instruction(mut self, instruction: impl Into<AlterInstruction>) -> Self {
        self.instructions.push(instruction.into());
        self
    }

    pub fn request_migration(mut self, migration: RequestMigration) -> Self {
        self.request_migrations.push(migration);
        self
    }

    pub fn response_migration(mut self, migration: ResponseMigration) -> Self {
        self.response_migrations.push(migration);
        self
    }

    /// Leave this change out of the changelog
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description_text(&self) -> &str {
        &self.description
    }

    pub fn instructions(&self) -> &[AlterInstruction] {
        &self.instructions
    }

    pub fn request_migrations(&self) -> &[RequestMigration] {
        &self.request_migrations
    }

    pub fn response_migrations(&self) -> &[ResponseMigration] {
        &self.response_migrations
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }
}
