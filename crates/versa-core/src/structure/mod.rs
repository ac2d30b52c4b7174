//! Declarative description of how the API changed between versions

mod change;
mod endpoint;
mod enums;
mod schema;
mod versions;

pub use change::VersionChange;
pub use endpoint::{endpoint, EndpointBuilder, EndpointChange, EndpointInstruction};
pub use enums::{enum_, EnumBuilder, EnumInstruction};
pub use schema::{schema, FieldBuilder, SchemaBuilder, SchemaInstruction};
pub use versions::{Version, VersionBundle};

use crate::error::GenerationError;
use crate::model::ModelSet;
use serde::{Deserialize, Serialize};

/// Any instruction a version change can carry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlterInstruction {
    Schema(SchemaInstruction),
    Enum(EnumInstruction),
    Endpoint(EndpointInstruction),
}

impl AlterInstruction {
    /// Apply to the models of the newer version, producing the older one
    pub(crate) fn apply(&self, set: &mut ModelSet, change: &str) -> Result<(), GenerationError> {
        match self {
            Self::Schema(instruction) => instruction.apply(set, change),
            Self::Enum(instruction) => instruction.apply(set, change),
            Self::Endpoint(instruction) => instruction.apply(set, change),
        }
    }
}

impl From<SchemaInstruction> for AlterInstruction {
    fn from(instruction: SchemaInstruction) -> Self {
        Self::Schema(instruction)
    }
}

impl From<EnumInstruction> for AlterInstruction {
    fn from(instruction: EnumInstruction) -> Self {
        Self::Enum(instruction)
    }
}

impl From<EndpointInstruction> for AlterInstruction {
    fn from(instruction: EndpointInstruction) -> Self {
        Self::Endpoint(instruction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldInfo, FieldType};
    use http::Method;
    use serde_json::json;

    #[test]
    fn test_tagged_serde_form() {
        let instruction: AlterInstruction = schema("User")
            .field("nickname")
            .existed_as(FieldType::String, FieldInfo::new().optional())
            .into();
        let value = serde_json::to_value(&instruction).unwrap();
        assert_eq!(value["kind"], json!("schema"));
        assert_eq!(value["action"], json!("field_existed_as"));
        assert_eq!(value["type"], json!({"type": "string"}));
        assert_eq!(serde_json::from_value::<AlterInstruction>(value).unwrap(), instruction);
    }

    #[test]
    fn test_parse_manifest_style_instructions() {
        let raw = json!([
            {"kind": "enum", "action": "didnt_have", "enum": "Status", "members": ["pending"]},
            {"kind": "endpoint", "action": "didnt_exist", "path": "/users/{id}/avatar", "methods": ["get"]},
            {"kind": "schema", "action": "had_name", "schema": "User", "name": "Account"}
        ]);
        let parsed: Vec<AlterInstruction> = serde_json::from_value(raw).unwrap();
        assert_eq!(
            parsed[1],
            AlterInstruction::Endpoint(endpoint("/users/{id}/avatar", Method::GET).didnt_exist())
        );
        assert_eq!(parsed[0], AlterInstruction::Enum(enum_("Status").didnt_have(["pending"])));
    }
}
