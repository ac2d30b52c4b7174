//! Human and machine readable changelog of a version bundle
//!
//! Instructions describe the previous version, so entries are phrased from
//! the newer version's side: a field that "didn't exist" before was added.

use crate::structure::{
    AlterInstruction, EndpointInstruction, EnumInstruction, SchemaInstruction, VersionBundle,
};
use crate::version::ApiVersion;
use serde::Serialize;
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Changelog {
    pub versions: Vec<ChangelogVersion>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangelogVersion {
    pub value: ApiVersion,
    pub changes: Vec<ChangelogChange>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangelogChange {
    pub name: String,
    pub description: String,
    pub instructions: Vec<ChangelogEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangelogEntry {
    SchemaFieldAdded { schema: String, field: String },
    SchemaFieldRemoved { schema: String, field: String },
    SchemaFieldChanged {
        schema: String,
        field: String,
        attributes: Vec<String>,
    },
    SchemaFieldAttributesAdded {
        schema: String,
        field: String,
        attributes: Vec<String>,
    },
    SchemaRenamed { schema: String, old_name: String },
    EnumMembersAdded {
        #[serde(rename = "enum")]
        name: String,
        members: Vec<String>,
    },
    EnumMembersRemoved {
        #[serde(rename = "enum")]
        name: String,
        members: Vec<String>,
    },
    EndpointAdded { path: String, methods: Vec<String> },
    EndpointRemoved { path: String, methods: Vec<String> },
    EndpointChanged {
        path: String,
        methods: Vec<String>,
        attributes: Vec<String>,
    },
}

impl ChangelogEntry {
    fn from_instruction(instruction: &AlterInstruction) -> Self {
        match instruction {
            AlterInstruction::Schema(instruction) => match instruction {
                SchemaInstruction::FieldExistedAs { schema, field, .. } => Self::SchemaFieldRemoved {
                    schema: schema.clone(),
                    field: field.clone(),
                },
                SchemaInstruction::FieldDidntExist { schema, field } => Self::SchemaFieldAdded {
                    schema: schema.clone(),
                    field: field.clone(),
                },
                SchemaInstruction::FieldHad { schema, field, change } => {
                    let mut attributes = Vec::new();
                    if change.name.is_some() {
                        attributes.push("name".to_string());
                    }
                    if change.ty.is_some() {
                        attributes.push("type".to_string());
                    }
                    attributes.extend(change.attrs.keys().cloned());
                    Self::SchemaFieldChanged {
                        schema: schema.clone(),
                        field: field.clone(),
                        attributes,
                    }
                }
                SchemaInstruction::FieldDidntHave {
                    schema,
                    field,
                    attributes,
                } => Self::SchemaFieldAttributesAdded {
                    schema: schema.clone(),
                    field: field.clone(),
                    attributes: attributes.clone(),
                },
                SchemaInstruction::HadName { schema, name } => Self::SchemaRenamed {
                    schema: schema.clone(),
                    old_name: name.clone(),
                },
            },
            AlterInstruction::Enum(instruction) => match instruction {
                EnumInstruction::HadMembers { name, members } => Self::EnumMembersRemoved {
                    name: name.clone(),
                    members: members.iter().map(|m| m.name.clone()).collect(),
                },
                EnumInstruction::DidntHave { name, members } => Self::EnumMembersAdded {
                    name: name.clone(),
                    members: members.clone(),
                },
            },
            AlterInstruction::Endpoint(instruction) => {
                let path = instruction.path().to_string();
                let methods = instruction.methods().iter().map(|m| m.to_string()).collect();
                match instruction {
                    EndpointInstruction::DidntExist { .. } => Self::EndpointAdded { path, methods },
                    EndpointInstruction::Existed { .. } => Self::EndpointRemoved { path, methods },
                    EndpointInstruction::Had { change, .. } => Self::EndpointChanged {
                        path,
                        methods,
                        attributes: change.attribute_names().into_iter().map(String::from).collect(),
                    },
                }
            }
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::SchemaFieldAdded { schema, field } => format!("`{schema}`: field `{field}` was added"),
            Self::SchemaFieldRemoved { schema, field } => format!("`{schema}`: field `{field}` was removed"),
            Self::SchemaFieldChanged {
                schema,
                field,
                attributes,
            } => format!("`{schema}`: field `{field}` changed {}", attributes.join(", ")),
            Self::SchemaFieldAttributesAdded {
                schema,
                field,
                attributes,
            } => format!("`{schema}`: field `{field}` gained {}", attributes.join(", ")),
            Self::SchemaRenamed { schema, old_name } => {
                format!("`{old_name}` was renamed to `{schema}`")
            }
            Self::EnumMembersAdded { name, members } => {
                format!("`{name}`: members {} were added", members.join(", "))
            }
            Self::EnumMembersRemoved { name, members } => {
                format!("`{name}`: members {} were removed or changed", members.join(", "))
            }
            Self::EndpointAdded { path, methods } => format!("`{} {path}` was added", methods.join(", ")),
            Self::EndpointRemoved { path, methods } => {
                format!("`{} {path}` was removed", methods.join(", "))
            }
            Self::EndpointChanged {
                path,
                methods,
                attributes,
            } => format!("`{} {path}` changed {}", methods.join(", "), attributes.join(", ")),
        }
    }
}

/// Build the changelog of every version except the oldest, newest first
pub fn generate_changelog(bundle: &VersionBundle) -> Changelog {
    let oldest = bundle.oldest();
    let versions = bundle
        .iter()
        .filter(|version| version.value() != oldest)
        .map(|version| ChangelogVersion {
            value: version.value(),
            changes: version
                .changes()
                .iter()
                .filter(|change| !change.is_hidden())
                .map(|change| ChangelogChange {
                    name: change.name().to_string(),
                    description: change.description_text().to_string(),
                    instructions: change
                        .instructions()
                        .iter()
                        .map(ChangelogEntry::from_instruction)
                        .collect(),
                })
                .collect(),
        })
        .collect();
    Changelog { versions }
}

impl Changelog {
    pub fn to_markdown(&self) -> String {
        let mut out = String::from("# Changelog\n");
        for version in &self.versions {
            let _ = write!(out, "\n## {}\n", version.value);
            if version.changes.is_empty() {
                out.push_str("\nNo public changes.\n");
            }
            for change in &version.changes {
                let _ = write!(out, "\n### {}\n\n{}\n", change.name, change.description.trim());
                if !change.instructions.is_empty() {
                    out.push('\n');
                }
                for entry in &change.instructions {
                    let _ = writeln!(out, "- {}", entry.describe());
                }
            }
        }
        out
    }
}
