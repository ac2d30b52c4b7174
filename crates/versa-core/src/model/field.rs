//! Field types and field metadata

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Type of a schema field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "of", rename_all = "snake_case")]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    /// Any JSON value
    Any,
    Array(Box<FieldType>),
    /// Object with arbitrary keys and uniformly typed values
    Map(Box<FieldType>),
    /// Reference to another schema by its head name
    Ref(String),
    /// Reference to an enum by its head name
    Enum(String),
    Union(Vec<FieldType>),
}

impl FieldType {
    pub fn array(items: FieldType) -> Self {
        Self::Array(Box::new(items))
    }

    pub fn map(values: FieldType) -> Self {
        Self::Map(Box::new(values))
    }

    pub fn reference(schema: impl Into<String>) -> Self {
        Self::Ref(schema.into())
    }

    pub fn enumeration(name: impl Into<String>) -> Self {
        Self::Enum(name.into())
    }

    /// Visit every schema or enum name this type refers to
    pub fn referenced_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Ref(name) | Self::Enum(name) => out.push(name),
            Self::Array(inner) | Self::Map(inner) => inner.collect_names(out),
            Self::Union(variants) => variants.iter().for_each(|v| v.collect_names(out)),
            _ => {}
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Integer => write!(f, "integer"),
            Self::Number => write!(f, "number"),
            Self::Boolean => write!(f, "boolean"),
            Self::Any => write!(f, "any"),
            Self::Array(inner) => write!(f, "array<{inner}>"),
            Self::Map(inner) => write!(f, "map<{inner}>"),
            Self::Ref(name) | Self::Enum(name) => write!(f, "{name}"),
            Self::Union(variants) => {
                for (i, variant) in variants.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{variant}")?;
                }
                Ok(())
            }
        }
    }
}

/// Names of the metadata and constraint attributes a field carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldAttr {
    Default,
    Alias,
    Title,
    Description,
    Example,
    Gt,
    Ge,
    Lt,
    Le,
    MultipleOf,
    MinLength,
    MaxLength,
    Pattern,
    MinItems,
    MaxItems,
    UniqueItems,
    Deprecated,
    Nullable,
    Required,
}

impl FieldAttr {
    pub const ALL: [FieldAttr; 19] = [
        Self::Default,
        Self::Alias,
        Self::Title,
        Self::Description,
        Self::Example,
        Self::Gt,
        Self::Ge,
        Self::Lt,
        Self::Le,
        Self::MultipleOf,
        Self::MinLength,
        Self::MaxLength,
        Self::Pattern,
        Self::MinItems,
        Self::MaxItems,
        Self::UniqueItems,
        Self::Deprecated,
        Self::Nullable,
        Self::Required,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Alias => "alias",
            Self::Title => "title",
            Self::Description => "description",
            Self::Example => "example",
            Self::Gt => "gt",
            Self::Ge => "ge",
            Self::Lt => "lt",
            Self::Le => "le",
            Self::MultipleOf => "multiple_of",
            Self::MinLength => "min_length",
            Self::MaxLength => "max_length",
            Self::Pattern => "pattern",
            Self::MinItems => "min_items",
            Self::MaxItems => "max_items",
            Self::UniqueItems => "unique_items",
            Self::Deprecated => "deprecated",
            Self::Nullable => "nullable",
            Self::Required => "required",
        }
    }
}

impl fmt::Display for FieldAttr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldAttr {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|attr| attr.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// Metadata and validation constraints of a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gt: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ge: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lt: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub le: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    pub unique_items: bool,
    pub deprecated: bool,
    pub nullable: bool,
    pub required: bool,
}

impl Default for FieldInfo {
    fn default() -> Self {
        Self {
            default: None,
            alias: None,
            title: None,
            description: None,
            example: None,
            gt: None,
            ge: None,
            lt: None,
            le: None,
            multiple_of: None,
            min_length: None,
            max_length: None,
            pattern: None,
            min_items: None,
            max_items: None,
            unique_items: false,
            deprecated: false,
            nullable: false,
            required: true,
        }
    }
}

impl FieldInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// A field is required when it is flagged so and has no default
    pub fn is_required(&self) -> bool {
        self.required && self.default.is_none()
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self.required = false;
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn example(mut self, example: impl Into<Value>) -> Self {
        self.example = Some(example.into());
        self
    }

    pub fn gt(mut self, bound: f64) -> Self {
        self.gt = Some(bound);
        self
    }

    pub fn ge(mut self, bound: f64) -> Self {
        self.ge = Some(bound);
        self
    }

    pub fn lt(mut self, bound: f64) -> Self {
        self.lt = Some(bound);
        self
    }

    pub fn le(mut self, bound: f64) -> Self {
        self.le = Some(bound);
        self
    }

    pub fn min_length(mut self, len: usize) -> Self {
        self.min_length = Some(len);
        self
    }

    pub fn max_length(mut self, len: usize) -> Self {
        self.max_length = Some(len);
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    /// Current value of an attribute, `None` when it is unset
    ///
    /// Flags count as set only when they differ from their default.
    pub fn get(&self, attr: FieldAttr) -> Option<Value> {
        fn num(v: Option<f64>) -> Option<Value> {
            v.map(Value::from)
        }
        fn text(v: &Option<String>) -> Option<Value> {
            v.clone().map(Value::String)
        }
        fn count(v: Option<usize>) -> Option<Value> {
            v.map(Value::from)
        }

        match attr {
            FieldAttr::Default => self.default.clone(),
            FieldAttr::Alias => text(&self.alias),
            FieldAttr::Title => text(&self.title),
            FieldAttr::Description => text(&self.description),
            FieldAttr::Example => self.example.clone(),
            FieldAttr::Gt => num(self.gt),
            FieldAttr::Ge => num(self.ge),
            FieldAttr::Lt => num(self.lt),
            FieldAttr::Le => num(self.le),
            FieldAttr::MultipleOf => num(self.multiple_of),
            FieldAttr::MinLength => count(self.min_length),
            FieldAttr::MaxLength => count(self.max_length),
            FieldAttr::Pattern => text(&self.pattern),
            FieldAttr::MinItems => count(self.min_items),
            FieldAttr::MaxItems => count(self.max_items),
            FieldAttr::UniqueItems => self.unique_items.then_some(Value::Bool(true)),
            FieldAttr::Deprecated => self.deprecated.then_some(Value::Bool(true)),
            FieldAttr::Nullable => self.nullable.then_some(Value::Bool(true)),
            FieldAttr::Required => (!self.required).then_some(Value::Bool(false)),
        }
    }

    /// Set an attribute from a JSON value
    ///
    /// Returns `Err` with the offending value when it has the wrong shape.
    pub fn set(&mut self, attr: FieldAttr, value: Value) -> Result<(), Value> {
        fn num(value: Value) -> Result<Option<f64>, Value> {
            value.as_f64().map(Some).ok_or(value)
        }
        fn text(value: Value) -> Result<Option<String>, Value> {
            match value {
                Value::String(s) => Ok(Some(s)),
                other => Err(other),
            }
        }
        fn count(value: Value) -> Result<Option<usize>, Value> {
            value
                .as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .map(Some)
                .ok_or(value)
        }
        fn flag(value: Value) -> Result<bool, Value> {
            value.as_bool().ok_or(value)
        }

        match attr {
            FieldAttr::Default => {
                self.default = Some(value);
                self.required = false;
            }
            FieldAttr::Alias => self.alias = text(value)?,
            FieldAttr::Title => self.title = text(value)?,
            FieldAttr::Description => self.description = text(value)?,
            FieldAttr::Example => self.example = Some(value),
            FieldAttr::Gt => self.gt = num(value)?,
            FieldAttr::Ge => self.ge = num(value)?,
            FieldAttr::Lt => self.lt = num(value)?,
            FieldAttr::Le => self.le = num(value)?,
            FieldAttr::MultipleOf => self.multiple_of = num(value)?,
            FieldAttr::MinLength => self.min_length = count(value)?,
            FieldAttr::MaxLength => self.max_length = count(value)?,
            FieldAttr::Pattern => self.pattern = text(value)?,
            FieldAttr::MinItems => self.min_items = count(value)?,
            FieldAttr::MaxItems => self.max_items = count(value)?,
            FieldAttr::UniqueItems => self.unique_items = flag(value)?,
            FieldAttr::Deprecated => self.deprecated = flag(value)?,
            FieldAttr::Nullable => self.nullable = flag(value)?,
            FieldAttr::Required => self.required = flag(value)?,
        }
        Ok(())
    }

    /// Reset an attribute to its unset state
    pub fn clear(&mut self, attr: FieldAttr) {
        let defaults = FieldInfo::default();
        match attr {
            FieldAttr::Default => self.default = None,
            FieldAttr::Alias => self.alias = None,
            FieldAttr::Title => self.title = None,
            FieldAttr::Description => self.description = None,
            FieldAttr::Example => self.example = None,
            FieldAttr::Gt => self.gt = None,
            FieldAttr::Ge => self.ge = None,
            FieldAttr::Lt => self.lt = None,
            FieldAttr::Le => self.le = None,
            FieldAttr::MultipleOf => self.multiple_of = None,
            FieldAttr::MinLength => self.min_length = None,
            FieldAttr::MaxLength => self.max_length = None,
            FieldAttr::Pattern => self.pattern = None,
            FieldAttr::MinItems => self.min_items = None,
            FieldAttr::MaxItems => self.max_items = None,
            FieldAttr::UniqueItems => self.unique_items = defaults.unique_items,
            FieldAttr::Deprecated => self.deprecated = defaults.deprecated,
            FieldAttr::Nullable => self.nullable = defaults.nullable,
            FieldAttr::Required => self.required = defaults.required,
        }
    }
}

/// A named, typed field of a schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: FieldType,
    #[serde(default)]
    pub info: FieldInfo,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
            info: FieldInfo::default(),
        }
    }

    pub fn with_info(mut self, info: FieldInfo) -> Self {
        self.info = info;
        self
    }

    /// Key the field is read from and written to in JSON bodies
    pub fn wire_name(&self) -> &str {
        self.info.alias.as_deref().unwrap_or(&self.name)
    }
}

/// Changes to apply to a field, as declared by `schema(..).field(..).had(..)`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldChange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<FieldType>,
    /// Attribute name to new value. Names are checked when the change is applied.
    #[serde(skip_serializing_if = "std::collections::BTreeMap::is_empty")]
    pub attrs: std::collections::BTreeMap<String, Value>,
}

impl FieldChange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn ty(mut self, ty: FieldType) -> Self {
        self.ty = Some(ty);
        self
    }

    pub fn attr(mut self, attr: FieldAttr, value: impl Into<Value>) -> Self {
        self.attrs.insert(attr.as_str().to_string(), value.into());
        self
    }

    pub fn default_value(self, value: impl Into<Value>) -> Self {
        self.attr(FieldAttr::Default, value)
    }

    pub fn alias(self, alias: impl Into<String>) -> Self {
        self.attr(FieldAttr::Alias, alias.into())
    }

    pub fn description(self, description: impl Into<String>) -> Self {
        self.attr(FieldAttr::Description, description.into())
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.ty.is_none() && self.attrs.is_empty()
    }
}
