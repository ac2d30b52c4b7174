//! Instructions that alter schemas in older versions

use crate::error::GenerationError;
use crate::model::{FieldAttr, FieldChange, FieldDef, FieldInfo, FieldType, ModelSet};
use serde::{Deserialize, Serialize};

/// Start describing how a schema looked in the previous version
///
/// # Example
///
/// ```rust
/// use versa_core::model::{FieldInfo, FieldType};
/// use versa_core::structure::schema;
///
/// let instruction = schema("User")
///     .field("nickname")
///     .existed_as(FieldType::String, FieldInfo::new().optional());
/// ```
pub fn schema(name: impl Into<String>) -> SchemaBuilder {
    SchemaBuilder { schema: name.into() }
}

pub struct SchemaBuilder {
    schema: String,
}

impl SchemaBuilder {
    pub fn field(self, name: impl Into<String>) -> FieldBuilder {
        FieldBuilder {
            schema: self.schema,
            field: name.into(),
        }
    }

    /// The schema was exposed under another name
    pub fn had_name(self, name: impl Into<String>) -> SchemaInstruction {
        SchemaInstruction::HadName {
            schema: self.schema,
            name: name.into(),
        }
    }
}

pub struct FieldBuilder {
    schema: String,
    field: String,
}

impl FieldBuilder {
    /// The field existed with this type and info
    pub fn existed_as(self, ty: FieldType, info: FieldInfo) -> SchemaInstruction {
        SchemaInstruction::FieldExistedAs {
            schema: self.schema,
            field: self.field,
            ty,
            info,
        }
    }

    pub fn didnt_exist(self) -> SchemaInstruction {
        SchemaInstruction::FieldDidntExist {
            schema: self.schema,
            field: self.field,
        }
    }

    pub fn had(self, change: FieldChange) -> SchemaInstruction {
        SchemaInstruction::FieldHad {
            schema: self.schema,
            field: self.field,
            change,
        }
    }

    /// The field did not carry these attributes
    pub fn didnt_have<I: IntoIterator<Item = FieldAttr>>(self, attributes: I) -> SchemaInstruction {
        SchemaInstruction::FieldDidntHave {
            schema: self.schema,
            field: self.field,
            attributes: attributes.into_iter().map(|a| a.as_str().to_string()).collect(),
        }
    }
}

/// A change to one schema, applied when going to the previous version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SchemaInstruction {
    FieldExistedAs {
        schema: String,
        field: String,
        #[serde(rename = "type")]
        ty: FieldType,
        #[serde(default)]
        info: FieldInfo,
    },
    FieldDidntExist {
        schema: String,
        field: String,
    },
    FieldHad {
        schema: String,
        field: String,
        change: FieldChange,
    },
    FieldDidntHave {
        schema: String,
        field: String,
        attributes: Vec<String>,
    },
    HadName {
        schema: String,
        name: String,
    },
}

impl SchemaInstruction {
    /// Head name of the schema this instruction targets
    pub fn schema(&self) -> &str {
        match self {
            Self::FieldExistedAs { schema, .. }
            | Self::FieldDidntExist { schema, .. }
            | Self::FieldHad { schema, .. }
            | Self::FieldDidntHave { schema, .. }
            | Self::HadName { schema, .. } => schema,
        }
    }

    pub(crate) fn apply(&self, set: &mut ModelSet, change: &str) -> Result<(), GenerationError> {
        let name = self.schema();
        if set.schema(name).is_none() {
            return Err(GenerationError::UnknownSchema {
                schema: name.to_string(),
                change: change.to_string(),
            });
        }

        match self {
            Self::FieldExistedAs {
                schema,
                field,
                ty,
                info,
            } => {
                if has_field(set, schema, field) {
                    return Err(GenerationError::FieldAlreadyExists {
                        schema: schema.clone(),
                        field: field.clone(),
                        change: change.to_string(),
                    });
                }
                if let Some(def) = set.schema_mut(schema) {
                    def.fields
                        .push(FieldDef::new(field.clone(), ty.clone()).with_info(info.clone()));
                }
                Ok(())
            }

            Self::FieldDidntExist { schema, field } => {
                let inherited = inherited_name(set, schema, field);
                let Some(def) = set.schema_mut(schema) else {
                    return Ok(());
                };
                let removed = def.remove_own_field(field).is_some();
                if let Some(from) = &inherited {
                    def.renamed_fields.remove(from);
                    def.hidden_fields.insert(from.clone());
                }
                if removed || inherited.is_some() {
                    Ok(())
                } else {
                    Err(GenerationError::DeleteMissingField {
                        schema: schema.clone(),
                        field: field.clone(),
                        change: change.to_string(),
                    })
                }
            }

            Self::FieldHad {
                schema,
                field,
                change: field_change,
            } => apply_field_had(set, schema, field, field_change, change),

            Self::FieldDidntHave {
                schema,
                field,
                attributes,
            } => {
                let mut target = own_copy(set, schema, field).ok_or_else(|| {
                    GenerationError::ChangeMissingField {
                        schema: schema.clone(),
                        field: field.clone(),
                        change: change.to_string(),
                    }
                })?;

                for raw in attributes {
                    let attr = parse_attr(raw, change)?;
                    if target.info.get(attr).is_none() {
                        return Err(GenerationError::FieldAttributeMissing {
                            schema: schema.clone(),
                            field: field.clone(),
                            attribute: raw.clone(),
                            change: change.to_string(),
                        });
                    }
                    target.info.clear(attr);
                }

                store_own(set, schema, target);
                Ok(())
            }

            Self::HadName { schema, name } => {
                let current = set.schema(schema).map(|s| s.exposed_name().to_string());
                if current.as_deref() == Some(name.as_str()) {
                    return Err(GenerationError::SchemaNameUnchanged {
                        schema: schema.clone(),
                        change: change.to_string(),
                    });
                }
                let other = set
                    .schema_by_exposed_name(name)
                    .map(|s| s.name.clone())
                    .or_else(|| set.enums().find(|e| e.exposed_name() == name).map(|e| e.name.clone()));
                if let Some(other) = other {
                    return Err(GenerationError::SchemaNameTaken {
                        schema: schema.clone(),
                        name: name.clone(),
                        other,
                        change: change.to_string(),
                    });
                }
                if let Some(def) = set.schema_mut(schema) {
                    def.exposed_name = Some(name.clone());
                }
                Ok(())
            }
        }
    }
}

fn apply_field_had(
    set: &mut ModelSet,
    schema: &str,
    field: &str,
    field_change: &FieldChange,
    change: &str,
) -> Result<(), GenerationError> {
    let mut target = own_copy(set, schema, field).ok_or_else(|| GenerationError::ChangeMissingField {
        schema: schema.to_string(),
        field: field.to_string(),
        change: change.to_string(),
    })?;

    if let Some(new_name) = &field_change.name {
        if new_name == field {
            return Err(GenerationError::FieldNameUnchanged {
                schema: schema.to_string(),
                field: field.to_string(),
                change: change.to_string(),
            });
        }
        if has_field(set, schema, new_name) {
            return Err(GenerationError::FieldNameTaken {
                schema: schema.to_string(),
                field: field.to_string(),
                new_name: new_name.clone(),
                change: change.to_string(),
            });
        }
    }

    if let Some(ty) = &field_change.ty {
        if &target.ty == ty {
            return Err(GenerationError::FieldTypeUnchanged {
                schema: schema.to_string(),
                field: field.to_string(),
                ty: ty.clone(),
                change: change.to_string(),
            });
        }
        target.ty = ty.clone();
    }

    for (raw, value) in &field_change.attrs {
        let attr = parse_attr(raw, change)?;
        if target.info.get(attr).is_some_and(|current| same_value(&current, value)) {
            return Err(GenerationError::FieldAttributeUnchanged {
                schema: schema.to_string(),
                field: field.to_string(),
                attribute: raw.clone(),
                value: value.clone(),
                change: change.to_string(),
            });
        }
        target
            .info
            .set(attr, value.clone())
            .map_err(|value| GenerationError::InvalidAttributeValue {
                schema: schema.to_string(),
                field: field.to_string(),
                attribute: raw.clone(),
                value,
                change: change.to_string(),
            })?;
    }

    let inherited = inherited_name(set, schema, field);
    store_own(set, schema, target);

    if let Some(new_name) = &field_change.name {
        if let Some(def) = set.schema_mut(schema) {
            if let Some(from) = inherited {
                def.renamed_fields.insert(from, new_name.clone());
            }
            if let Some(own) = def.own_field_mut(field) {
                own.name = new_name.clone();
            }
        }
    }
    Ok(())
}

fn parse_attr(raw: &str, change: &str) -> Result<FieldAttr, GenerationError> {
    raw.parse().map_err(|attribute| GenerationError::UnknownAttribute {
        attribute,
        change: change.to_string(),
    })
}

/// JSON equality that treats `1` and `1.0` as the same number
fn same_value(a: &serde_json::Value, b: &serde_json::Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn has_field(set: &ModelSet, schema: &str, field: &str) -> bool {
    set.effective_fields(schema)
        .is_some_and(|fields| fields.iter().any(|f| f.name == field))
}

/// Name the parent uses for `field` when `schema` inherits it
fn inherited_name(set: &ModelSet, schema: &str, field: &str) -> Option<String> {
    let def = set.schema(schema)?;
    if let Some((from, _)) = def.renamed_fields.iter().find(|(_, to)| *to == field) {
        return Some(from.clone());
    }
    if def.hidden_fields.contains(field) || def.renamed_fields.contains_key(field) {
        return None;
    }
    let parent = def.parent.as_deref()?;
    set.effective_fields(parent)?
        .iter()
        .any(|f| f.name == field)
        .then(|| field.to_string())
}

/// The schema's own declaration of `field`, or a copy of the inherited one
fn own_copy(set: &ModelSet, schema: &str, field: &str) -> Option<FieldDef> {
    set.effective_fields(schema)?
        .into_iter()
        .find(|f| f.name == field)
}

fn store_own(set: &mut ModelSet, schema: &str, field: FieldDef) {
    let Some(def) = set.schema_mut(schema) else {
        return;
    };
    match def.own_field_mut(&field.name) {
        Some(slot) => *slot = field,
        None => def.fields.push(field),
    }
}
