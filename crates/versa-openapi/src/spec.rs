//! OpenAPI document of a single API version

use http::Method;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use versa_core::ApiVersion;

/// `info` object; `version` is the API version date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiInfo {
    pub title: String,
    pub version: ApiVersion,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// OpenAPI 3.0 document for one version
#[derive(Debug, Clone)]
pub struct OpenApiSpec {
    pub info: ApiInfo,
    pub paths: BTreeMap<String, PathItem>,
    pub schemas: BTreeMap<String, serde_json::Value>,
}

/// Operations of one path, keyed by lowercase method name
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct PathItem(BTreeMap<String, Operation>);

impl PathItem {
    pub fn operation(&self, method: &Method) -> Option<&Operation> {
        self.0.get(&method.as_str().to_ascii_lowercase())
    }

    pub fn insert(&mut self, method: &Method, operation: Operation) {
        self.0.insert(method.as_str().to_ascii_lowercase(), operation);
    }

    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    pub responses: BTreeMap<String, ResponseSpec>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub schema: SchemaRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestBody {
    pub required: bool,
    pub content: BTreeMap<String, MediaType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaType {
    pub schema: SchemaRef,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ResponseSpec {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<BTreeMap<String, MediaType>>,
}

/// `$ref` to a component, or an inline schema
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaRef {
    Ref {
        #[serde(rename = "$ref")]
        reference: String,
    },
    Inline(serde_json::Value),
}

impl SchemaRef {
    pub fn component(name: &str) -> Self {
        Self::Ref {
            reference: format!("#/components/schemas/{name}"),
        }
    }
}

impl MediaType {
    pub fn json(schema: SchemaRef) -> BTreeMap<String, MediaType> {
        BTreeMap::from([("application/json".to_string(), MediaType { schema })])
    }
}

impl OpenApiSpec {
    pub fn new(title: impl Into<String>, version: ApiVersion) -> Self {
        Self {
            info: ApiInfo {
                title: title.into(),
                version,
                description: None,
            },
            paths: BTreeMap::new(),
            schemas: BTreeMap::new(),
        }
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.info.description = Some(desc.into());
        self
    }

    /// Add the operation of `method` on `path`, replacing an earlier one
    pub fn path(mut self, path: &str, method: &Method, operation: Operation) -> Self {
        self.paths.entry(path.to_string()).or_default().insert(method, operation);
        self
    }

    pub fn schema(mut self, name: &str, schema: serde_json::Value) -> Self {
        self.schemas.insert(name.to_string(), schema);
        self
    }

    /// Add the schema of a `utoipa::ToSchema` type under its own name
    pub fn register<T: for<'a> utoipa::ToSchema<'a>>(mut self) -> Self {
        let (name, schema) = T::schema();
        if let Ok(json_schema) = serde_json::to_value(schema) {
            self.schemas.insert(name.to_string(), json_schema);
        }
        self
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut spec = serde_json::json!({
            "openapi": "3.0.3",
            "info": self.info,
            "paths": self.paths,
        });

        if !self.schemas.is_empty() {
            spec["components"] = serde_json::json!({ "schemas": self.schemas });
        }

        spec
    }
}

impl Operation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn request_body(mut self, body: RequestBody) -> Self {
        self.request_body = Some(body);
        self
    }

    pub fn response(mut self, status: u16, response: ResponseSpec) -> Self {
        self.responses.insert(status.to_string(), response);
        self
    }

    pub fn deprecated(mut self, deprecated: bool) -> Self {
        self.deprecated = deprecated;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operations_keyed_by_method() {
        let version: ApiVersion = "2024-01-01".parse().unwrap();
        let spec = OpenApiSpec::new("Users", version)
            .path("/users", &Method::GET, Operation::new().summary("List"))
            .path("/users", &Method::POST, Operation::new().deprecated(true));

        let item = &spec.paths["/users"];
        assert_eq!(item.methods().collect::<Vec<_>>(), ["get", "post"]);
        assert_eq!(item.operation(&Method::GET).unwrap().summary.as_deref(), Some("List"));
        assert!(item.operation(&Method::DELETE).is_none());

        let json = spec.to_json();
        assert_eq!(json["info"]["version"], "2024-01-01");
        assert_eq!(json["paths"]["/users"]["post"]["deprecated"], true);
        assert!(json["paths"]["/users"]["get"].get("tags").is_none());
        assert!(json.get("components").is_none());
    }
}
