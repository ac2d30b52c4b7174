//! Head routes and per-version route tables (matchit)
//!
//! Routes are declared once, against the head schemas:
//!
//! ```rust,ignore
//! use versa_server::{get, post};
//!
//! let app = VersionedApp::new(bundle, registry)
//!     .route("/users", post(create_user).request_schema("UserCreate").response_schema("User").status(201))
//!     .route("/users/{id}", get(get_user).response_schema("User"));
//! ```
//!
//! Attribute builders such as [`MethodRouter::request_schema`] apply to the
//! method added last. Each version then gets its own table, built from the
//! routes visible in that version under the path they have there.

use crate::error::AppError;
use crate::handler::{into_boxed_handler, BoxedHandler, Handler};
use http::Method;
use matchit::Router as MatchitRouter;
use std::collections::{BTreeMap, HashMap};
use versa_core::model::{ModelSet, RouteDef, RouteId};
use versa_core::ApiVersion;

pub(crate) struct MethodEndpoint {
    pub(crate) method: Method,
    pub(crate) handler: BoxedHandler,
    pub(crate) def: RouteDef,
}

/// HTTP method router for a single path
#[derive(Default)]
pub struct MethodRouter {
    pub(crate) endpoints: Vec<MethodEndpoint>,
}

impl MethodRouter {
    pub fn new() -> Self {
        Self::default()
    }

    fn on<H, T>(mut self, method: Method, handler: H) -> Self
    where
        H: Handler<T>,
        T: 'static,
    {
        self.endpoints.push(MethodEndpoint {
            def: RouteDef::new(String::new(), method.clone()),
            method,
            handler: into_boxed_handler(handler),
        });
        self
    }

    fn last(mut self, f: impl FnOnce(&mut RouteDef)) -> Self {
        if let Some(endpoint) = self.endpoints.last_mut() {
            f(&mut endpoint.def);
        }
        self
    }

    pub fn get<H: Handler<T>, T: 'static>(self, handler: H) -> Self {
        self.on(Method::GET, handler)
    }

    pub fn post<H: Handler<T>, T: 'static>(self, handler: H) -> Self {
        self.on(Method::POST, handler)
    }

    pub fn put<H: Handler<T>, T: 'static>(self, handler: H) -> Self {
        self.on(Method::PUT, handler)
    }

    pub fn patch<H: Handler<T>, T: 'static>(self, handler: H) -> Self {
        self.on(Method::PATCH, handler)
    }

    pub fn delete<H: Handler<T>, T: 'static>(self, handler: H) -> Self {
        self.on(Method::DELETE, handler)
    }

    /// Head schema the JSON request body is validated against
    pub fn request_schema(self, schema: impl Into<String>) -> Self {
        let schema = schema.into();
        self.last(|def| def.request_schema = Some(schema))
    }

    /// Head schema of the JSON response body
    pub fn response_schema(self, schema: impl Into<String>) -> Self {
        let schema = schema.into();
        self.last(|def| def.response_schema = Some(schema))
    }

    /// Documented success status
    pub fn status(self, status: u16) -> Self {
        self.last(|def| def.status_code = status)
    }

    pub fn summary(self, summary: impl Into<String>) -> Self {
        let summary = summary.into();
        self.last(|def| def.summary = Some(summary))
    }

    pub fn description(self, description: impl Into<String>) -> Self {
        let description = description.into();
        self.last(|def| def.description = Some(description))
    }

    pub fn tag(self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        self.last(|def| def.tags.push(tag))
    }

    pub fn deprecated(self) -> Self {
        self.last(|def| def.deprecated = true)
    }

    /// Removed from head, still served to versions that restore it with
    /// `endpoint(..).existed()`
    pub fn only_in_older_versions(self) -> Self {
        self.last(|def| def.only_in_older_versions = true)
    }
}

/// Create a GET route handler
pub fn get<H: Handler<T>, T: 'static>(handler: H) -> MethodRouter {
    MethodRouter::new().get(handler)
}

/// Create a POST route handler
pub fn post<H: Handler<T>, T: 'static>(handler: H) -> MethodRouter {
    MethodRouter::new().post(handler)
}

/// Create a PUT route handler
pub fn put<H: Handler<T>, T: 'static>(handler: H) -> MethodRouter {
    MethodRouter::new().put(handler)
}

/// Create a PATCH route handler
pub fn patch<H: Handler<T>, T: 'static>(handler: H) -> MethodRouter {
    MethodRouter::new().patch(handler)
}

/// Create a DELETE route handler
pub fn delete<H: Handler<T>, T: 'static>(handler: H) -> MethodRouter {
    MethodRouter::new().delete(handler)
}

/// Routes visible in one version
pub(crate) struct RouteTable {
    inner: MatchitRouter<HashMap<Method, RouteId>>,
}

/// Result of route matching
#[derive(Debug, PartialEq)]
pub(crate) enum RouteMatch {
    Found {
        id: RouteId,
        params: Vec<(String, String)>,
    },
    NotFound,
    MethodNotAllowed {
        allowed: Vec<Method>,
    },
}

impl RouteTable {
    pub(crate) fn build(version: ApiVersion, set: &ModelSet) -> Result<Self, AppError> {
        let mut by_path: BTreeMap<&str, HashMap<Method, RouteId>> = BTreeMap::new();
        for route in set.visible_routes() {
            let methods = by_path.entry(route.def.path.as_str()).or_default();
            for method in route.def.methods.iter() {
                methods.insert(method.clone(), route.id);
            }
        }

        let mut inner = MatchitRouter::new();
        for (path, methods) in by_path {
            inner
                .insert(convert_path_params(path), methods)
                .map_err(|e| AppError::RouteConflict {
                    version,
                    path: path.to_string(),
                    details: e.to_string(),
                })?;
        }
        Ok(Self { inner })
    }

    pub(crate) fn at(&self, path: &str, method: &Method) -> RouteMatch {
        let Ok(matched) = self.inner.at(path) else {
            return RouteMatch::NotFound;
        };

        match matched.value.get(method) {
            Some(id) => RouteMatch::Found {
                id: *id,
                params: matched
                    .params
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            },
            None => {
                let mut allowed: Vec<Method> = matched.value.keys().cloned().collect();
                allowed.sort_by(|a, b| a.as_str().cmp(b.as_str()));
                RouteMatch::MethodNotAllowed { allowed }
            }
        }
    }
}

/// Convert {param} style to :param for matchit
fn convert_path_params(path: &str) -> String {
    let mut result = String::with_capacity(path.len());

    for ch in path.chars() {
        match ch {
            '{' => result.push(':'),
            '}' => {}
            _ => result.push(ch),
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use versa_core::model::ModelRegistry;

    fn version() -> ApiVersion {
        "2024-01-01".parse().unwrap()
    }

    async fn ok() -> &'static str {
        "ok"
    }

    #[test]
    fn test_builders_apply_to_last_method() {
        let router = get(ok)
            .response_schema("User")
            .post(ok)
            .request_schema("UserCreate")
            .status(201);

        assert_eq!(router.endpoints.len(), 2);
        let get_def = &router.endpoints[0].def;
        assert_eq!(get_def.response_schema.as_deref(), Some("User"));
        assert_eq!(get_def.status_code, 200);
        let post_def = &router.endpoints[1].def;
        assert_eq!(post_def.request_schema.as_deref(), Some("UserCreate"));
        assert!(post_def.response_schema.is_none());
        assert_eq!(post_def.status_code, 201);
    }

    #[test]
    fn test_table_matches_visible_routes() {
        let registry = ModelRegistry::new()
            .route(RouteDef::new("/users", Method::GET))
            .route(RouteDef::new("/users", Method::POST))
            .route(RouteDef::new("/users/{id}", Method::GET))
            .route(RouteDef::new("/legacy", Method::GET).only_in_older_versions());
        let table = RouteTable::build(version(), &registry.head()).unwrap();

        assert_eq!(
            table.at("/users/7", &Method::GET),
            RouteMatch::Found {
                id: RouteId(2),
                params: vec![("id".to_string(), "7".to_string())],
            }
        );
        assert_eq!(
            table.at("/users", &Method::DELETE),
            RouteMatch::MethodNotAllowed {
                allowed: vec![Method::GET, Method::POST],
            }
        );
        assert_eq!(table.at("/legacy", &Method::GET), RouteMatch::NotFound);
    }

    #[test]
    fn test_conflicting_templates_are_reported() {
        let registry = ModelRegistry::new()
            .route(RouteDef::new("/users/{id}", Method::GET))
            .route(RouteDef::new("/users/{user_id}", Method::DELETE));

        let err = RouteTable::build(version(), &registry.head()).err().unwrap();
        assert!(matches!(err, AppError::RouteConflict { .. }));
    }

    #[test]
    fn test_convert_path_params() {
        assert_eq!(convert_path_params("/orgs/{org}/users/{id}"), "/orgs/:org/users/:id");
        assert_eq!(convert_path_params("/health"), "/health");
    }
}
