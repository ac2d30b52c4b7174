//! JSON Schema (OpenAPI 3.0 dialect) import and export
//!
//! Export flattens inheritance and writes every reference with the exposed
//! name of the target in the version being rendered. Import accepts what
//! `utoipa` produces for `#[derive(ToSchema)]` types, plus the common 3.1
//! spellings (`"type": ["string", "null"]`, numeric `exclusiveMinimum`).

use super::field::{FieldDef, FieldInfo, FieldType};
use super::registry::ModelSet;
use super::schema::{EnumDef, EnumMember, SchemaDef};
use crate::error::ModelError;
use serde_json::{json, Map, Value};

const REF_PREFIX: &str = "#/components/schemas/";

impl SchemaDef {
    /// Render the effective (flattened) schema as seen in `set`
    pub fn to_json_schema(&self, set: &ModelSet) -> Value {
        let fields = set
            .effective_fields(&self.name)
            .unwrap_or_else(|| self.fields.clone());

        let mut properties = Map::new();
        let mut required = Vec::new();
        for field in &fields {
            properties.insert(field.wire_name().to_string(), field_to_json(field, set));
            if field.info.is_required() {
                required.push(Value::String(field.wire_name().to_string()));
            }
        }

        let mut schema = Map::new();
        schema.insert("type".into(), json!("object"));
        schema.insert("title".into(), json!(self.exposed_name()));
        if let Some(description) = &self.description {
            schema.insert("description".into(), json!(description));
        }
        schema.insert("properties".into(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".into(), Value::Array(required));
        }
        Value::Object(schema)
    }

    /// Import an object schema
    pub fn from_json_schema(name: &str, value: &Value) -> Result<SchemaDef, ModelError> {
        let import_err = |reason: String| ModelError::Import {
            name: name.to_string(),
            reason,
        };

        let object = value
            .as_object()
            .ok_or_else(|| import_err("schema is not an object".into()))?;

        let mut def = SchemaDef::new(name);
        if let Some(description) = object.get("description").and_then(Value::as_str) {
            def.description = Some(description.to_string());
        }

        // `allOf: [{$ref: Parent}, {properties...}]` is how inheritance is spelled
        let mut bodies = vec![object];
        if let Some(all_of) = object.get("allOf").and_then(Value::as_array) {
            for part in all_of {
                if let Some(parent) = part.get("$ref").and_then(Value::as_str) {
                    if def.parent.is_some() {
                        return Err(import_err("more than one parent schema".into()));
                    }
                    def.parent = Some(ref_name(parent).to_string());
                } else if let Some(part) = part.as_object() {
                    bodies.push(part);
                }
            }
        }

        for body in bodies {
            let required: Vec<&str> = body
                .get("required")
                .and_then(Value::as_array)
                .map(|r| r.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default();

            let Some(properties) = body.get("properties").and_then(Value::as_object) else {
                continue;
            };
            for (key, prop) in properties {
                let mut field = field_from_json(key, prop).map_err(import_err)?;
                if !required.contains(&key.as_str()) {
                    field.info.required = false;
                }
                def.fields.push(field);
            }
        }

        Ok(def)
    }
}

impl EnumDef {
    pub fn to_json_schema(&self) -> Value {
        let values = self.values();
        let ty = match values.first() {
            Some(Value::Number(n)) if n.is_i64() || n.is_u64() => "integer",
            Some(Value::Number(_)) => "number",
            Some(Value::Bool(_)) => "boolean",
            _ => "string",
        };
        json!({
            "type": ty,
            "title": self.exposed_name(),
            "enum": values,
        })
    }

    /// Import a schema carrying an `enum` keyword, `None` when it has none
    pub fn from_json_schema(name: &str, value: &Value) -> Option<EnumDef> {
        let values = value.get("enum")?.as_array()?;
        let mut def = EnumDef::new(name);
        for value in values {
            let member = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            def.members.push(EnumMember::new(member, value.clone()));
        }
        Some(def)
    }
}

/// `#/components/schemas/User` -> `User`
pub fn ref_name(reference: &str) -> &str {
    reference.strip_prefix(REF_PREFIX).unwrap_or_else(|| {
        reference
            .rsplit_once('/')
            .map(|(_, name)| name)
            .unwrap_or(reference)
    })
}

fn ref_to(name: &str) -> Value {
    json!({ "$ref": format!("{REF_PREFIX}{name}") })
}

/// Render a field type, resolving references to their exposed names
pub fn type_to_json(ty: &FieldType, set: &ModelSet) -> Value {
    match ty {
        FieldType::String => json!({"type": "string"}),
        FieldType::Integer => json!({"type": "integer"}),
        FieldType::Number => json!({"type": "number"}),
        FieldType::Boolean => json!({"type": "boolean"}),
        FieldType::Any => json!({}),
        FieldType::Array(items) => json!({"type": "array", "items": type_to_json(items, set)}),
        FieldType::Map(values) => {
            json!({"type": "object", "additionalProperties": type_to_json(values, set)})
        }
        FieldType::Ref(name) => {
            let exposed = set.schema(name).map(|s| s.exposed_name()).unwrap_or(name);
            ref_to(exposed)
        }
        FieldType::Enum(name) => {
            let exposed = set.enum_def(name).map(|e| e.exposed_name()).unwrap_or(name);
            ref_to(exposed)
        }
        FieldType::Union(variants) => json!({
            "oneOf": variants.iter().map(|v| type_to_json(v, set)).collect::<Vec<_>>()
        }),
    }
}

fn field_to_json(field: &FieldDef, set: &ModelSet) -> Value {
    let info = &field.info;
    let base = type_to_json(&field.ty, set);

    let mut out = match base {
        // Siblings of `$ref` are ignored in 3.0, wrap when there is anything to add
        Value::Object(map) if map.contains_key("$ref") && has_metadata(info) => {
            let mut wrapper = Map::new();
            wrapper.insert("allOf".into(), json!([Value::Object(map)]));
            wrapper
        }
        Value::Object(map) => map,
        _ => Map::new(),
    };

    let mut put = |key: &str, value: Option<Value>| {
        if let Some(value) = value {
            out.insert(key.to_string(), value);
        }
    };

    put("title", info.title.clone().map(Value::from));
    put("description", info.description.clone().map(Value::from));
    put("default", info.default.clone());
    put("example", info.example.clone());

    if let Some(gt) = info.gt {
        put("minimum", Some(json!(gt)));
        put("exclusiveMinimum", Some(json!(true)));
    } else {
        put("minimum", info.ge.map(Value::from));
    }
    if let Some(lt) = info.lt {
        put("maximum", Some(json!(lt)));
        put("exclusiveMaximum", Some(json!(true)));
    } else {
        put("maximum", info.le.map(Value::from));
    }
    put("multipleOf", info.multiple_of.map(Value::from));
    put("minLength", info.min_length.map(Value::from));
    put("maxLength", info.max_length.map(Value::from));
    put("pattern", info.pattern.clone().map(Value::from));
    put("minItems", info.min_items.map(Value::from));
    put("maxItems", info.max_items.map(Value::from));
    put("uniqueItems", info.unique_items.then_some(json!(true)));
    put("deprecated", info.deprecated.then_some(json!(true)));
    put("nullable", info.nullable.then_some(json!(true)));

    Value::Object(out)
}

fn has_metadata(info: &FieldInfo) -> bool {
    info.title.is_some()
        || info.description.is_some()
        || info.default.is_some()
        || info.example.is_some()
        || info.deprecated
        || info.nullable
}

/// Parse a property schema into a field
fn field_from_json(name: &str, value: &Value) -> Result<FieldDef, String> {
    let (ty, nullable) = type_from_json(value)?;
    let mut info = FieldInfo::new();
    info.nullable = nullable;

    let str_of = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);
    let f64_of = |key: &str| value.get(key).and_then(Value::as_f64);
    let usize_of = |key: &str| {
        value
            .get(key)
            .and_then(Value::as_u64)
            .and_then(|n| usize::try_from(n).ok())
    };
    let flag_of = |key: &str| value.get(key).and_then(Value::as_bool).unwrap_or(false);

    info.title = str_of("title");
    info.description = str_of("description");
    info.default = value.get("default").cloned();
    info.example = value.get("example").cloned();
    info.pattern = str_of("pattern");
    info.min_length = usize_of("minLength");
    info.max_length = usize_of("maxLength");
    info.min_items = usize_of("minItems");
    info.max_items = usize_of("maxItems");
    info.unique_items = flag_of("uniqueItems");
    info.deprecated = flag_of("deprecated");
    info.multiple_of = f64_of("multipleOf");

    match value.get("exclusiveMinimum") {
        Some(Value::Bool(true)) => info.gt = f64_of("minimum"),
        Some(bound) if bound.is_number() => {
            info.gt = bound.as_f64();
            info.ge = f64_of("minimum");
        }
        _ => info.ge = f64_of("minimum"),
    }
    match value.get("exclusiveMaximum") {
        Some(Value::Bool(true)) => info.lt = f64_of("maximum"),
        Some(bound) if bound.is_number() => {
            info.lt = bound.as_f64();
            info.le = f64_of("maximum");
        }
        _ => info.le = f64_of("maximum"),
    }

    Ok(FieldDef::new(name, ty).with_info(info))
}

/// Parse a type, returning it with its nullability
pub fn type_from_json(value: &Value) -> Result<(FieldType, bool), String> {
    let Some(object) = value.as_object() else {
        return match value {
            Value::Bool(true) => Ok((FieldType::Any, false)),
            other => Err(format!("unsupported schema {other}")),
        };
    };

    let mut nullable = object.get("nullable").and_then(Value::as_bool).unwrap_or(false);

    if let Some(reference) = object.get("$ref").and_then(Value::as_str) {
        return Ok((FieldType::Ref(ref_name(reference).to_string()), nullable));
    }

    for key in ["allOf", "oneOf", "anyOf"] {
        let Some(variants) = object.get(key).and_then(Value::as_array) else {
            continue;
        };
        let mut types = Vec::new();
        for variant in variants {
            if variant.get("type").and_then(Value::as_str) == Some("null") {
                nullable = true;
                continue;
            }
            let (ty, inner_nullable) = type_from_json(variant)?;
            nullable |= inner_nullable;
            types.push(ty);
        }
        let ty = match types.len() {
            0 => FieldType::Any,
            1 => types.remove(0),
            _ if key == "allOf" => return Err("allOf with several members is not a field type".into()),
            _ => FieldType::Union(types),
        };
        return Ok((ty, nullable));
    }

    let ty_name = match object.get("type") {
        None => {
            if object.contains_key("properties") {
                return Err("inline object schemas must be registered as named schemas".into());
            }
            return Ok((FieldType::Any, nullable));
        }
        Some(Value::String(name)) => name.as_str(),
        Some(Value::Array(names)) => {
            let mut chosen = None;
            for name in names.iter().filter_map(Value::as_str) {
                if name == "null" {
                    nullable = true;
                } else if chosen.replace(name).is_some() {
                    return Err("multi-typed fields are not supported".into());
                }
            }
            chosen.unwrap_or("null")
        }
        Some(other) => return Err(format!("invalid type {other}")),
    };

    let ty = match ty_name {
        "string" => FieldType::String,
        "integer" => FieldType::Integer,
        "number" => FieldType::Number,
        "boolean" => FieldType::Boolean,
        "null" => {
            nullable = true;
            FieldType::Any
        }
        "array" => match object.get("items") {
            Some(items) => FieldType::array(type_from_json(items)?.0),
            None => FieldType::array(FieldType::Any),
        },
        "object" => {
            if object.contains_key("properties") {
                return Err("inline object schemas must be registered as named schemas".into());
            }
            match object.get("additionalProperties") {
                Some(values @ Value::Object(_)) => FieldType::map(type_from_json(values)?.0),
                _ => FieldType::map(FieldType::Any),
            }
        }
        other => return Err(format!("unknown type \"{other}\"")),
    };

    Ok((ty, nullable))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelRegistry;

    fn user_json() -> Value {
        json!({
            "type": "object",
            "required": ["name", "age"],
            "properties": {
                "name": {"type": "string", "maxLength": 32},
                "age": {"type": "integer", "format": "int32", "minimum": 0, "exclusiveMinimum": true},
                "nickname": {"type": "string", "nullable": true},
                "address": {"allOf": [{"$ref": "#/components/schemas/Address"}], "nullable": true},
                "tags": {"type": "array", "items": {"type": "string"}, "uniqueItems": true},
                "extra": {"type": "object", "additionalProperties": {"type": "number"}}
            }
        })
    }

    #[test]
    fn test_import_object_schema() {
        let def = SchemaDef::from_json_schema("User", &user_json()).unwrap();
        assert_eq!(def.fields.len(), 6);

        let age = def.own_field("age").unwrap();
        assert_eq!(age.ty, FieldType::Integer);
        assert_eq!(age.info.gt, Some(0.0));
        assert_eq!(age.info.ge, None);
        assert!(age.info.is_required());

        let nickname = def.own_field("nickname").unwrap();
        assert!(nickname.info.nullable);
        assert!(!nickname.info.is_required());

        let address = def.own_field("address").unwrap();
        assert_eq!(address.ty, FieldType::reference("Address"));
        assert!(address.info.nullable);

        assert!(def.own_field("tags").unwrap().info.unique_items);
        assert_eq!(def.own_field("extra").unwrap().ty, FieldType::map(FieldType::Number));
    }

    #[test]
    fn test_import_31_spellings() {
        let (ty, nullable) = type_from_json(&json!({"type": ["string", "null"]})).unwrap();
        assert_eq!(ty, FieldType::String);
        assert!(nullable);

        let field = field_from_json("n", &json!({"type": "number", "exclusiveMinimum": 1.5})).unwrap();
        assert_eq!(field.info.gt, Some(1.5));
    }

    #[test]
    fn test_import_rejects_inline_objects() {
        let err = SchemaDef::from_json_schema(
            "Bad",
            &json!({"properties": {"inner": {"type": "object", "properties": {"a": {"type": "string"}}}}}),
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::Import { .. }));
    }

    #[test]
    fn test_import_enum() {
        let def = EnumDef::from_json_schema("Status", &json!({"type": "string", "enum": ["active", "banned"]})).unwrap();
        assert_eq!(def.values(), vec![json!("active"), json!("banned")]);
        assert!(EnumDef::from_json_schema("User", &user_json()).is_none());
    }

    #[test]
    fn test_export_uses_exposed_names_and_wire_names() {
        let mut address = SchemaDef::new("Address").field(FieldDef::new("city", FieldType::String));
        address.exposed_name = Some("Location".into());

        let user = SchemaDef::new("User")
            .field(
                FieldDef::new("user_name", FieldType::String)
                    .with_info(FieldInfo::new().alias("userName").min_length(1)),
            )
            .field(
                FieldDef::new("home", FieldType::reference("Address"))
                    .with_info(FieldInfo::new().description("Home address")),
            )
            .field(FieldDef::new("score", FieldType::Number).with_info(FieldInfo::new().gt(0.0).with_default(1.0)));

        let set = ModelRegistry::new().schema(address).schema(user).head();
        let rendered = set.schema("User").unwrap().to_json_schema(&set);

        assert_eq!(rendered["properties"]["userName"]["minLength"], json!(1));
        assert_eq!(
            rendered["properties"]["home"]["allOf"][0]["$ref"],
            json!("#/components/schemas/Location")
        );
        assert_eq!(rendered["properties"]["score"]["exclusiveMinimum"], json!(true));
        assert_eq!(rendered["required"], json!(["userName", "home"]));
    }
}
