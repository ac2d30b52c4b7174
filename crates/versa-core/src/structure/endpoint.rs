//! Instructions that alter routes in older versions

use crate::error::GenerationError;
use crate::model::{MethodSet, ModelSet, RouteDef};
use serde::{Deserialize, Serialize};

/// Start describing an endpoint as it was in the previous version
///
/// A route matches when its path is equal and it serves at least one of
/// `methods`.
pub fn endpoint(path: impl Into<String>, methods: impl Into<MethodSet>) -> EndpointBuilder {
    EndpointBuilder {
        path: path.into(),
        methods: methods.into(),
    }
}

pub struct EndpointBuilder {
    path: String,
    methods: MethodSet,
}

impl EndpointBuilder {
    pub fn didnt_exist(self) -> EndpointInstruction {
        EndpointInstruction::DidntExist {
            path: self.path,
            methods: self.methods,
        }
    }

    /// Restore a route that head only keeps for older versions
    pub fn existed(self) -> EndpointInstruction {
        EndpointInstruction::Existed {
            path: self.path,
            methods: self.methods,
        }
    }

    pub fn had(self, change: EndpointChange) -> EndpointInstruction {
        EndpointInstruction::Had {
            path: self.path,
            methods: self.methods,
            change,
        }
    }
}

/// Route attributes that differed in the previous version
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointChange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub methods: Option<MethodSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_in_schema: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_schema: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<String>,
}

impl EndpointChange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn methods(mut self, methods: impl Into<MethodSet>) -> Self {
        self.methods = Some(methods.into());
        self
    }

    pub fn status_code(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn tags<I: IntoIterator<Item = S>, S: Into<String>>(mut self, tags: I) -> Self {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn deprecated(mut self, deprecated: bool) -> Self {
        self.deprecated = Some(deprecated);
        self
    }

    pub fn include_in_schema(mut self, include: bool) -> Self {
        self.include_in_schema = Some(include);
        self
    }

    pub fn request_schema(mut self, schema: impl Into<String>) -> Self {
        self.request_schema = Some(schema.into());
        self
    }

    pub fn response_schema(mut self, schema: impl Into<String>) -> Self {
        self.response_schema = Some(schema.into());
        self
    }

    /// Names of the attributes this change sets
    pub fn attribute_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        let mut check = |set: bool, name: &'static str| {
            if set {
                names.push(name);
            }
        };
        check(self.path.is_some(), "path");
        check(self.methods.is_some(), "methods");
        check(self.status_code.is_some(), "status_code");
        check(self.summary.is_some(), "summary");
        check(self.description.is_some(), "description");
        check(self.tags.is_some(), "tags");
        check(self.deprecated.is_some(), "deprecated");
        check(self.include_in_schema.is_some(), "include_in_schema");
        check(self.request_schema.is_some(), "request_schema");
        check(self.response_schema.is_some(), "response_schema");
        names
    }

    /// Apply to `route`, returning the first attribute that already had the value
    fn apply_to(&self, route: &mut RouteDef) -> Result<(), &'static str> {
        fn assign<T: PartialEq + Clone>(
            slot: &mut T,
            value: &Option<T>,
            name: &'static str,
        ) -> Result<(), &'static str> {
            if let Some(value) = value {
                if slot == value {
                    return Err(name);
                }
                *slot = value.clone();
            }
            Ok(())
        }
        fn assign_opt<T: PartialEq + Clone>(
            slot: &mut Option<T>,
            value: &Option<T>,
            name: &'static str,
        ) -> Result<(), &'static str> {
            if let Some(value) = value {
                if slot.as_ref() == Some(value) {
                    return Err(name);
                }
                *slot = Some(value.clone());
            }
            Ok(())
        }

        assign(&mut route.path, &self.path, "path")?;
        if let Some(methods) = &self.methods {
            if route.methods.same_as(methods) {
                return Err("methods");
            }
            route.methods = methods.clone();
        }
        assign(&mut route.status_code, &self.status_code, "status_code")?;
        assign_opt(&mut route.summary, &self.summary, "summary")?;
        assign_opt(&mut route.description, &self.description, "description")?;
        assign(&mut route.tags, &self.tags, "tags")?;
        assign(&mut route.deprecated, &self.deprecated, "deprecated")?;
        assign(&mut route.include_in_schema, &self.include_in_schema, "include_in_schema")?;
        assign_opt(&mut route.request_schema, &self.request_schema, "request_schema")?;
        assign_opt(&mut route.response_schema, &self.response_schema, "response_schema")?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EndpointInstruction {
    DidntExist {
        path: String,
        methods: MethodSet,
    },
    Existed {
        path: String,
        methods: MethodSet,
    },
    Had {
        path: String,
        methods: MethodSet,
        change: EndpointChange,
    },
}

impl EndpointInstruction {
    pub fn path(&self) -> &str {
        match self {
            Self::DidntExist { path, .. } | Self::Existed { path, .. } | Self::Had { path, .. } => path,
        }
    }

    pub fn methods(&self) -> &MethodSet {
        match self {
            Self::DidntExist { methods, .. }
            | Self::Existed { methods, .. }
            | Self::Had { methods, .. } => methods,
        }
    }

    pub(crate) fn apply(&self, set: &mut ModelSet, change: &str) -> Result<(), GenerationError> {
        let path = self.path();
        let methods = self.methods();
        let not_found = |action: &'static str| GenerationError::EndpointNotFound {
            path: path.to_string(),
            methods: methods.clone(),
            action,
            change: change.to_string(),
        };

        match self {
            Self::DidntExist { .. } => {
                let mut found = false;
                for route in set.routes.iter_mut().filter(|r| r.visible && r.def.matches(path, methods)) {
                    route.visible = false;
                    found = true;
                }
                if !found {
                    return Err(not_found("delete"));
                }
            }

            Self::Existed { .. } => {
                if set.routes.iter().any(|r| r.visible && r.def.matches(path, methods)) {
                    return Err(GenerationError::EndpointAlreadyExists {
                        path: path.to_string(),
                        methods: methods.clone(),
                        change: change.to_string(),
                    });
                }
                let mut found = false;
                for route in set.routes.iter_mut().filter(|r| r.def.matches(path, methods)) {
                    route.visible = true;
                    found = true;
                }
                if !found {
                    return Err(not_found("restore"));
                }
            }

            Self::Had { change: endpoint_change, .. } => {
                let mut found = false;
                for route in set.routes.iter_mut().filter(|r| r.visible && r.def.matches(path, methods)) {
                    found = true;
                    endpoint_change.apply_to(&mut route.def).map_err(|attribute| {
                        GenerationError::EndpointAttributeUnchanged {
                            path: path.to_string(),
                            methods: methods.clone(),
                            attribute,
                            change: change.to_string(),
                        }
                    })?;
                }
                if !found {
                    return Err(not_found("change"));
                }
                check_conflicts(set, change)?;
            }
        }
        Ok(())
    }
}

fn check_conflicts(set: &ModelSet, change: &str) -> Result<(), GenerationError> {
    let visible: Vec<_> = set.visible_routes().collect();
    for (i, a) in visible.iter().enumerate() {
        for b in &visible[i + 1..] {
            if a.def.matches(&b.def.path, &b.def.methods) {
                return Err(GenerationError::EndpointConflict {
                    path: a.def.path.clone(),
                    methods: a.def.methods.clone(),
                    change: change.to_string(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModelRegistry, RouteId};
    use http::Method;

    fn set() -> ModelSet {
        ModelRegistry::new()
            .route(RouteDef::new("/users", [Method::GET, Method::POST]).response_schema("User"))
            .route(RouteDef::new("/users/{id}", Method::GET))
            .route(RouteDef::new("/legacy", Method::GET).only_in_older_versions())
            .head()
    }

    #[test]
    fn test_didnt_exist_hides_matching_routes() {
        let mut set = set();
        endpoint("/users", Method::POST).didnt_exist().apply(&mut set, "C").unwrap();
        assert!(!set.route(RouteId(0)).unwrap().visible);

        let err = endpoint("/users", Method::POST).didnt_exist().apply(&mut set, "C").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Endpoint \"[POST] /users\" you tried to delete in \"C\" doesn't exist in a newer version."
        );
    }

    #[test]
    fn test_existed_restores_older_only_route() {
        let mut set = set();
        endpoint("/legacy", Method::GET).existed().apply(&mut set, "C").unwrap();
        assert!(set.route(RouteId(2)).unwrap().visible);

        let err = endpoint("/legacy", Method::GET).existed().apply(&mut set, "C").unwrap_err();
        assert!(matches!(err, GenerationError::EndpointAlreadyExists { .. }));

        let err = endpoint("/nowhere", Method::GET).existed().apply(&mut set, "C").unwrap_err();
        assert!(matches!(err, GenerationError::EndpointNotFound { action: "restore", .. }));
    }

    #[test]
    fn test_had_changes_attributes() {
        let mut set = set();
        endpoint("/users/{id}", Method::GET)
            .had(EndpointChange::new().path("/accounts/{id}").status_code(203))
            .apply(&mut set, "C")
            .unwrap();
        let route = &set.route(RouteId(1)).unwrap().def;
        assert_eq!(route.path, "/accounts/{id}");
        assert_eq!(route.status_code, 203);
    }

    #[test]
    fn test_had_same_value_is_error() {
        let mut set = set();
        let err = endpoint("/users", Method::GET)
            .had(EndpointChange::new().response_schema("User"))
            .apply(&mut set, "C")
            .unwrap_err();
        assert!(matches!(
            err,
            GenerationError::EndpointAttributeUnchanged {
                attribute: "response_schema",
                ..
            }
        ));
    }

    #[test]
    fn test_had_detects_conflicts() {
        let mut set = set();
        let err = endpoint("/users/{id}", Method::GET)
            .had(EndpointChange::new().path("/users"))
            .apply(&mut set, "C")
            .unwrap_err();
        assert!(matches!(err, GenerationError::EndpointConflict { .. }));
    }
}
