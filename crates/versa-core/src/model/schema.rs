//! Schema and enum definitions

use super::field::FieldDef;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// An object schema as seen in one API version
///
/// Schemas are keyed by their head name everywhere inside Versa. Older
/// versions can expose the same schema under a different name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exposed_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    /// Inherited fields this schema does not have
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub hidden_fields: BTreeSet<String>,
    /// Inherited fields this schema exposes under another name, keyed by the parent's name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub renamed_fields: BTreeMap<String, String>,
}

impl SchemaDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            exposed_name: None,
            parent: None,
            description: None,
            fields: Vec::new(),
            hidden_fields: BTreeSet::new(),
            renamed_fields: BTreeMap::new(),
        }
    }

    /// Inherit every field of `parent`
    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Name used in documents and error messages for this version
    pub fn exposed_name(&self) -> &str {
        self.exposed_name.as_deref().unwrap_or(&self.name)
    }

    /// Field declared directly on this schema (inherited fields are not searched)
    pub fn own_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn own_field_mut(&mut self, name: &str) -> Option<&mut FieldDef> {
        self.fields.iter_mut().find(|f| f.name == name)
    }

    pub fn remove_own_field(&mut self, name: &str) -> Option<FieldDef> {
        let idx = self.fields.iter().position(|f| f.name == name)?;
        Some(self.fields.remove(idx))
    }
}

/// A single enum member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumMember {
    pub name: String,
    pub value: Value,
}

impl EnumMember {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// An enumeration of allowed values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exposed_name: Option<String>,
    #[serde(default)]
    pub members: Vec<EnumMember>,
}

impl EnumDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            exposed_name: None,
            members: Vec::new(),
        }
    }

    pub fn member(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.members.push(EnumMember::new(name, value));
        self
    }

    /// Add members whose value equals their name
    pub fn string_members<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let name = name.into();
            self.members.push(EnumMember::new(name.clone(), name));
        }
        self
    }

    pub fn exposed_name(&self) -> &str {
        self.exposed_name.as_deref().unwrap_or(&self.name)
    }

    pub fn get(&self, member: &str) -> Option<&EnumMember> {
        self.members.iter().find(|m| m.name == member)
    }

    pub fn contains_value(&self, value: &Value) -> bool {
        self.members.iter().any(|m| &m.value == value)
    }

    pub fn values(&self) -> Vec<Value> {
        self.members.iter().map(|m| m.value.clone()).collect()
    }
}
