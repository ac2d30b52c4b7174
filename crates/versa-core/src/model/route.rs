//! Route descriptions
//!
//! Versa does not own handlers. A [`RouteDef`] describes how a head route
//! looks in a given version; the server maps it back to the head handler
//! through its [`RouteId`].

use http::Method;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A deduplicated set of HTTP methods, kept in insertion order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MethodSet(Vec<Method>);

impl MethodSet {
    pub fn new<I: IntoIterator<Item = Method>>(methods: I) -> Self {
        let mut set = Vec::new();
        for method in methods {
            if !set.contains(&method) {
                set.push(method);
            }
        }
        Self(set)
    }

    pub fn contains(&self, method: &Method) -> bool {
        self.0.contains(method)
    }

    pub fn intersects(&self, other: &MethodSet) -> bool {
        self.0.iter().any(|m| other.contains(m))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Method> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Compare ignoring order
    pub fn same_as(&self, other: &MethodSet) -> bool {
        self.len() == other.len() && self.0.iter().all(|m| other.contains(m))
    }
}

impl fmt::Display for MethodSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(|m| m.as_str()).collect();
        write!(f, "{}", names.join(", "))
    }
}

impl From<Method> for MethodSet {
    fn from(method: Method) -> Self {
        Self(vec![method])
    }
}

impl<const N: usize> From<[Method; N]> for MethodSet {
    fn from(methods: [Method; N]) -> Self {
        Self::new(methods)
    }
}

impl From<Vec<Method>> for MethodSet {
    fn from(methods: Vec<Method>) -> Self {
        Self::new(methods)
    }
}

impl FromIterator<Method> for MethodSet {
    fn from_iter<I: IntoIterator<Item = Method>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl Serialize for MethodSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter().map(|m| m.as_str()))
    }
}

impl<'de> Deserialize<'de> for MethodSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Vec::<String>::deserialize(deserializer)?;
        raw.iter()
            .map(|name| {
                Method::from_bytes(name.to_ascii_uppercase().as_bytes())
                    .map_err(|_| serde::de::Error::custom(format!("invalid HTTP method \"{name}\"")))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }
}

fn default_status() -> u16 {
    200
}

fn default_true() -> bool {
    true
}

/// Description of a route as it exists in one version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDef {
    pub path: String,
    pub methods: MethodSet,
    #[serde(default = "default_status")]
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default = "default_true")]
    pub include_in_schema: bool,
    /// Head name of the JSON request body schema
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_schema: Option<String>,
    /// Head name of the JSON response body schema
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<String>,
    /// Deleted from head but still served to older versions that restore it
    #[serde(default)]
    pub only_in_older_versions: bool,
}

impl RouteDef {
    pub fn new(path: impl Into<String>, methods: impl Into<MethodSet>) -> Self {
        Self {
            path: path.into(),
            methods: methods.into(),
            status_code: default_status(),
            summary: None,
            description: None,
            tags: Vec::new(),
            deprecated: false,
            include_in_schema: true,
            request_schema: None,
            response_schema: None,
            only_in_older_versions: false,
        }
    }

    pub fn request_schema(mut self, schema: impl Into<String>) -> Self {
        self.request_schema = Some(schema.into());
        self
    }

    pub fn response_schema(mut self, schema: impl Into<String>) -> Self {
        self.response_schema = Some(schema.into());
        self
    }

    pub fn status(mut self, status: u16) -> Self {
        self.status_code = status;
        self
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn only_in_older_versions(mut self) -> Self {
        self.only_in_older_versions = true;
        self
    }

    pub fn matches(&self, path: &str, methods: &MethodSet) -> bool {
        self.path == path && self.methods.intersects(methods)
    }
}

/// Position of a route in the head registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RouteId(pub usize);

/// A head route together with its shape and visibility in one version
#[derive(Debug, Clone, PartialEq)]
pub struct RouteEntry {
    pub id: RouteId,
    pub def: RouteDef,
    pub visible: bool,
}
