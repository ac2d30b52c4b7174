//! Instructions that alter enums in older versions

use crate::error::GenerationError;
use crate::model::{EnumMember, ModelSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub fn enum_(name: impl Into<String>) -> EnumBuilder {
    EnumBuilder { name: name.into() }
}

pub struct EnumBuilder {
    name: String,
}

impl EnumBuilder {
    /// The enum had these members (added, or with a different value)
    pub fn had_members<I, S, V>(self, members: I) -> EnumInstruction
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<Value>,
    {
        EnumInstruction::HadMembers {
            name: self.name,
            members: members
                .into_iter()
                .map(|(name, value)| EnumMember::new(name, value))
                .collect(),
        }
    }

    pub fn didnt_have<I, S>(self, members: I) -> EnumInstruction
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        EnumInstruction::DidntHave {
            name: self.name,
            members: members.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EnumInstruction {
    HadMembers {
        #[serde(rename = "enum")]
        name: String,
        members: Vec<EnumMember>,
    },
    DidntHave {
        #[serde(rename = "enum")]
        name: String,
        members: Vec<String>,
    },
}

impl EnumInstruction {
    pub fn enum_name(&self) -> &str {
        match self {
            Self::HadMembers { name, .. } | Self::DidntHave { name, .. } => name,
        }
    }

    pub(crate) fn apply(&self, set: &mut ModelSet, change: &str) -> Result<(), GenerationError> {
        let def = set
            .enum_mut(self.enum_name())
            .ok_or_else(|| GenerationError::UnknownEnum {
                enum_name: self.enum_name().to_string(),
                change: change.to_string(),
            })?;

        match self {
            Self::HadMembers { name, members } => {
                for member in members {
                    match def.members.iter_mut().find(|m| m.name == member.name) {
                        Some(existing) if existing.value == member.value => {
                            return Err(GenerationError::EnumMemberUnchanged {
                                enum_name: name.clone(),
                                member: member.name.clone(),
                                change: change.to_string(),
                            });
                        }
                        Some(existing) => existing.value = member.value.clone(),
                        None => def.members.push(member.clone()),
                    }
                }
            }
            Self::DidntHave { name, members } => {
                for member in members {
                    let Some(idx) = def.members.iter().position(|m| &m.name == member) else {
                        return Err(GenerationError::EnumMemberMissing {
                            enum_name: name.clone(),
                            member: member.clone(),
                            change: change.to_string(),
                        });
                    };
                    def.members.remove(idx);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EnumDef, ModelRegistry};
    use serde_json::json;

    fn set() -> ModelSet {
        ModelRegistry::new()
            .enum_def(EnumDef::new("Status").string_members(["active", "banned"]))
            .head()
    }

    #[test]
    fn test_had_members_adds_and_updates() {
        let mut set = set();
        enum_("Status")
            .had_members([("pending", json!("pending")), ("banned", json!("blocked"))])
            .apply(&mut set, "Pending")
            .unwrap();
        let status = set.enum_def("Status").unwrap();
        assert_eq!(status.values(), vec![json!("active"), json!("blocked"), json!("pending")]);
    }

    #[test]
    fn test_had_members_same_value_is_error() {
        let mut set = set();
        let err = enum_("Status")
            .had_members([("active", "active")])
            .apply(&mut set, "C")
            .unwrap_err();
        assert!(matches!(err, GenerationError::EnumMemberUnchanged { .. }));
    }

    #[test]
    fn test_didnt_have() {
        let mut set = set();
        enum_("Status").didnt_have(["banned"]).apply(&mut set, "C").unwrap();
        assert_eq!(set.enum_def("Status").unwrap().values(), vec![json!("active")]);

        let err = enum_("Status").didnt_have(["banned"]).apply(&mut set, "C").unwrap_err();
        assert_eq!(
            err.to_string(),
            "You tried to delete a member \"banned\" from \"Status\" in \"C\" but it doesn't have such a member."
        );
    }

    #[test]
    fn test_unknown_enum() {
        let mut set = set();
        let err = enum_("Color").didnt_have(["red"]).apply(&mut set, "C").unwrap_err();
        assert!(matches!(err, GenerationError::UnknownEnum { .. }));
    }
}
