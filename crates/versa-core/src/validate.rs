//! Body validation against a versioned schema

use crate::error::{FieldViolation, ValidationError};
use crate::model::{FieldDef, FieldInfo, FieldType, ModelSet};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

static PATTERNS: OnceLock<Mutex<HashMap<String, Option<Regex>>>> = OnceLock::new();

fn pattern_matches(pattern: &str, value: &str) -> Option<bool> {
    let cache = PATTERNS.get_or_init(|| Mutex::new(HashMap::new()));
    let mut cache = cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    cache
        .entry(pattern.to_string())
        .or_insert_with(|| Regex::new(pattern).ok())
        .as_ref()
        .map(|re| re.is_match(value))
}

/// Validate `body` against `schema` as it looks in `set`
///
/// On success the body is returned normalized: aliased keys are renamed to
/// field names, absent optional fields receive their default, and keys the
/// schema does not declare are dropped.
pub fn validate_body(set: &ModelSet, schema: &str, body: &Value) -> Result<Value, ValidationError> {
    if set.schema(schema).is_none() {
        return Err(ValidationError::UnknownSchema(schema.to_string()));
    }

    let mut violations = Vec::new();
    let normalized = Validator { set }.object(schema, body, "", &mut violations);
    if violations.is_empty() {
        Ok(normalized)
    } else {
        Err(ValidationError::Invalid(violations))
    }
}

struct Validator<'a> {
    set: &'a ModelSet,
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

impl Validator<'_> {
    fn object(&self, schema: &str, value: &Value, path: &str, out: &mut Vec<FieldViolation>) -> Value {
        let Some(object) = value.as_object() else {
            out.push(FieldViolation::new(path, "type", "Expected an object"));
            return value.clone();
        };
        let Some(fields) = self.set.effective_fields(schema) else {
            return value.clone();
        };

        let mut normalized = Map::new();
        for field in &fields {
            let raw = object
                .get(field.wire_name())
                .or_else(|| object.get(&field.name));
            let field_path = join(path, field.wire_name());

            match raw {
                None if field.info.is_required() => {
                    out.push(FieldViolation::new(field_path, "missing", "Field is required"));
                }
                None => {
                    if let Some(default) = &field.info.default {
                        normalized.insert(field.name.clone(), default.clone());
                    }
                }
                Some(Value::Null) if field.info.nullable || field.ty == FieldType::Any => {
                    normalized.insert(field.name.clone(), Value::Null);
                }
                Some(Value::Null) => {
                    out.push(FieldViolation::new(field_path, "null", "Field may not be null"));
                }
                Some(value) => {
                    let checked = self.field(field, value, &field_path, out);
                    normalized.insert(field.name.clone(), checked);
                }
            }
        }
        Value::Object(normalized)
    }

    fn field(&self, field: &FieldDef, value: &Value, path: &str, out: &mut Vec<FieldViolation>) -> Value {
        let before = out.len();
        let checked = self.value(&field.ty, value, path, out);
        if out.len() == before {
            constraints(&field.info, &checked, path, out);
        }
        checked
    }

    fn value(&self, ty: &FieldType, value: &Value, path: &str, out: &mut Vec<FieldViolation>) -> Value {
        let mismatch = |out: &mut Vec<FieldViolation>| {
            out.push(FieldViolation::new(path, "type", format!("Expected {ty}")));
            value.clone()
        };

        match ty {
            FieldType::Any => value.clone(),
            FieldType::String if value.is_string() => value.clone(),
            FieldType::Boolean if value.is_boolean() => value.clone(),
            FieldType::Number if value.is_number() => value.clone(),
            FieldType::Integer if is_integer(value) => value.clone(),
            FieldType::Array(items) => match value.as_array() {
                Some(values) => Value::Array(
                    values
                        .iter()
                        .enumerate()
                        .map(|(idx, item)| self.value(items, item, &join(path, &idx.to_string()), out))
                        .collect(),
                ),
                None => mismatch(out),
            },
            FieldType::Map(values) => match value.as_object() {
                Some(entries) => Value::Object(
                    entries
                        .iter()
                        .map(|(key, item)| (key.clone(), self.value(values, item, &join(path, key), out)))
                        .collect(),
                ),
                None => mismatch(out),
            },
            FieldType::Ref(schema) => self.object(schema, value, path, out),
            FieldType::Enum(name) => match self.set.enum_def(name) {
                Some(def) if def.contains_value(value) => value.clone(),
                Some(def) => {
                    let allowed: Vec<String> = def.values().iter().map(Value::to_string).collect();
                    out.push(FieldViolation::new(
                        path,
                        "enum",
                        format!("Must be one of {}", allowed.join(", ")),
                    ));
                    value.clone()
                }
                None => value.clone(),
            },
            FieldType::Union(variants) => {
                for variant in variants {
                    let mut attempt = Vec::new();
                    let checked = self.value(variant, value, path, &mut attempt);
                    if attempt.is_empty() {
                        return checked;
                    }
                }
                mismatch(out)
            }
            _ => mismatch(out),
        }
    }
}

fn is_integer(value: &Value) -> bool {
    value.is_i64() || value.is_u64() || value.as_f64().is_some_and(|f| f.fract() == 0.0)
}

fn constraints(info: &FieldInfo, value: &Value, path: &str, out: &mut Vec<FieldViolation>) {
    let mut fail = |code: &str, message: String| out.push(FieldViolation::new(path, code, message));

    if let Some(n) = value.as_f64() {
        if let Some(gt) = info.gt.filter(|gt| n <= *gt) {
            fail("gt", format!("Must be greater than {gt}"));
        }
        if let Some(ge) = info.ge.filter(|ge| n < *ge) {
            fail("ge", format!("Must be greater than or equal to {ge}"));
        }
        if let Some(lt) = info.lt.filter(|lt| n >= *lt) {
            fail("lt", format!("Must be less than {lt}"));
        }
        if let Some(le) = info.le.filter(|le| n > *le) {
            fail("le", format!("Must be less than or equal to {le}"));
        }
        if let Some(step) = info.multiple_of.filter(|step| *step != 0.0) {
            let ratio = n / step;
            if (ratio - ratio.round()).abs() > 1e-9 {
                fail("multiple_of", format!("Must be a multiple of {step}"));
            }
        }
    }

    if let Some(s) = value.as_str() {
        let len = s.chars().count();
        if let Some(min) = info.min_length.filter(|min| len < *min) {
            fail("min_length", format!("Length must be at least {min} characters"));
        }
        if let Some(max) = info.max_length.filter(|max| len > *max) {
            fail("max_length", format!("Length must be at most {max} characters"));
        }
        if let Some(pattern) = &info.pattern {
            match pattern_matches(pattern, s) {
                Some(true) => {}
                Some(false) => fail("pattern", format!("Must match pattern {pattern}")),
                None => fail("pattern", format!("Invalid pattern {pattern}")),
            }
        }
    }

    if let Some(items) = value.as_array() {
        if let Some(min) = info.min_items.filter(|min| items.len() < *min) {
            fail("min_items", format!("Must contain at least {min} items"));
        }
        if let Some(max) = info.max_items.filter(|max| items.len() > *max) {
            fail("max_items", format!("Must contain at most {max} items"));
        }
        if info.unique_items {
            let duplicated = items
                .iter()
                .enumerate()
                .any(|(i, item)| items[..i].contains(item));
            if duplicated {
                fail("unique_items", "Items must be unique".to_string());
            }
        }
    }
}
