//! Request and response migrations
//!
//! Handlers only understand head shapes. A request sent by an older client
//! is walked forward through every newer version's request migrations; the
//! head response is walked back through the response migrations.

use crate::error::MigrationError;
use crate::model::{MethodSet, ModelSet};
use crate::structure::VersionBundle;
use crate::version::ApiVersion;
use http::{HeaderMap, Method, StatusCode};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A request as seen by request migrations
#[derive(Debug, Clone)]
pub struct RequestInfo {
    pub body: Value,
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    pub path: String,
    pub method: Method,
}

impl RequestInfo {
    pub fn new(method: Method, path: impl Into<String>, body: Value) -> Self {
        Self {
            body,
            headers: HeaderMap::new(),
            query: Vec::new(),
            path: path.into(),
            method,
        }
    }

    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A response as seen by response migrations
#[derive(Debug, Clone)]
pub struct ResponseInfo {
    pub body: Value,
    pub status: StatusCode,
    pub headers: HeaderMap,
}

impl ResponseInfo {
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self {
            body,
            status,
            headers: HeaderMap::new(),
        }
    }
}

pub type RequestTransform = Arc<dyn Fn(&mut RequestInfo) -> Result<(), MigrationError> + Send + Sync>;
pub type ResponseTransform = Arc<dyn Fn(&mut ResponseInfo) -> Result<(), MigrationError> + Send + Sync>;

/// What a migration applies to
#[derive(Debug, Clone, PartialEq)]
pub enum MigrationScope {
    /// Bodies of the named head schema, optionally its subtypes too
    Schema { name: String, with_subtypes: bool },
    /// A route, by head path template and methods
    Path { path: String, methods: MethodSet },
}

impl MigrationScope {
    pub fn matches(&self, target: &MigrationTarget) -> bool {
        match self {
            Self::Schema { name, with_subtypes } => match target.lineage.first() {
                Some(schema) if !with_subtypes => schema == name,
                Some(_) => target.lineage.iter().any(|s| s == name),
                None => false,
            },
            Self::Path { path, methods } => path == &target.path && methods.contains(&target.method),
        }
    }
}

/// The route and body schema a request or response belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationTarget {
    pub path: String,
    pub method: Method,
    /// Head body schema followed by its ancestors, empty when there is no schema
    pub lineage: Vec<String>,
}

impl MigrationTarget {
    pub fn new(path: impl Into<String>, method: Method) -> Self {
        Self {
            path: path.into(),
            method,
            lineage: Vec::new(),
        }
    }

    /// Attach the body schema, resolving its ancestors in `head`
    pub fn with_schema(mut self, schema: &str, head: &ModelSet) -> Self {
        let mut lineage = vec![schema.to_string()];
        let mut current = head.schema(schema).and_then(|s| s.parent.clone());
        while let Some(parent) = current {
            if lineage.contains(&parent) {
                break;
            }
            current = head.schema(&parent).and_then(|s| s.parent.clone());
            lineage.push(parent);
        }
        self.lineage = lineage;
        self
    }

    pub fn schema(&self) -> Option<&str> {
        self.lineage.first().map(String::as_str)
    }
}

/// Converts a request from the older shape of a version change to the newer one
#[derive(Clone)]
pub struct RequestMigration {
    scope: MigrationScope,
    transform: RequestTransform,
}

impl RequestMigration {
    pub fn for_schema(name: impl Into<String>) -> Self {
        Self::scoped(MigrationScope::Schema {
            name: name.into(),
            with_subtypes: false,
        })
    }

    pub fn for_path(path: impl Into<String>, methods: impl Into<MethodSet>) -> Self {
        Self::scoped(MigrationScope::Path {
            path: path.into(),
            methods: methods.into(),
        })
    }

    fn scoped(scope: MigrationScope) -> Self {
        Self {
            scope,
            transform: Arc::new(|_| Ok(())),
        }
    }

    /// Also apply to bodies of schemas inheriting from the target schema
    pub fn with_subtypes(mut self) -> Self {
        if let MigrationScope::Schema { with_subtypes, .. } = &mut self.scope {
            *with_subtypes = true;
        }
        self
    }

    pub fn transform<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut RequestInfo) -> Result<(), MigrationError> + Send + Sync + 'static,
    {
        self.transform = Arc::new(f);
        self
    }

    pub fn scope(&self) -> &MigrationScope {
        &self.scope
    }

    pub fn apply(&self, request: &mut RequestInfo) -> Result<(), MigrationError> {
        (self.transform)(request)
    }
}

impl fmt::Debug for RequestMigration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestMigration")
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

/// Converts a response from the newer shape of a version change to the older one
#[derive(Clone)]
pub struct ResponseMigration {
    scope: MigrationScope,
    migrate_http_errors: bool,
    transform: ResponseTransform,
}

impl ResponseMigration {
    pub fn for_schema(name: impl Into<String>) -> Self {
        Self::scoped(MigrationScope::Schema {
            name: name.into(),
            with_subtypes: false,
        })
    }

    pub fn for_path(path: impl Into<String>, methods: impl Into<MethodSet>) -> Self {
        Self::scoped(MigrationScope::Path {
            path: path.into(),
            methods: methods.into(),
        })
    }

    fn scoped(scope: MigrationScope) -> Self {
        Self {
            scope,
            migrate_http_errors: false,
            transform: Arc::new(|_| Ok(())),
        }
    }

    pub fn with_subtypes(mut self) -> Self {
        if let MigrationScope::Schema { with_subtypes, .. } = &mut self.scope {
            *with_subtypes = true;
        }
        self
    }

    /// Also run for responses with a status of 300 or above
    pub fn migrate_http_errors(mut self) -> Self {
        self.migrate_http_errors = true;
        self
    }

    pub fn transform<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut ResponseInfo) -> Result<(), MigrationError> + Send + Sync + 'static,
    {
        self.transform = Arc::new(f);
        self
    }

    pub fn scope(&self) -> &MigrationScope {
        &self.scope
    }

    pub fn migrates_http_errors(&self) -> bool {
        self.migrate_http_errors
    }

    pub fn apply(&self, response: &mut ResponseInfo) -> Result<(), MigrationError> {
        (self.transform)(response)
    }
}

impl fmt::Debug for ResponseMigration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseMigration")
            .field("scope", &self.scope)
            .field("migrate_http_errors", &self.migrate_http_errors)
            .finish_non_exhaustive()
    }
}

/// Bring a request sent for `from` up to the latest version
pub fn migrate_request(
    bundle: &VersionBundle,
    from: ApiVersion,
    target: &MigrationTarget,
    request: &mut RequestInfo,
) -> Result<(), MigrationError> {
    for version in bundle.versions_newer_than(from) {
        for change in version.changes() {
            for migration in change.request_migrations() {
                if !migration.scope().matches(target) {
                    continue;
                }
                debug!(
                    version = %version.value(),
                    change = change.name(),
                    path = %target.path,
                    "Applying request migration"
                );
                migration.apply(request)?;
            }
        }
    }
    Ok(())
}

/// Bring a head response down to the shape of version `to`
pub fn migrate_response(
    bundle: &VersionBundle,
    to: ApiVersion,
    target: &MigrationTarget,
    response: &mut ResponseInfo,
) -> Result<(), MigrationError> {
    let path: Vec<_> = bundle.versions_newer_than(to).collect();
    for version in path.into_iter().rev() {
        for change in version.changes() {
            for migration in change.response_migrations() {
                if response.status.as_u16() >= 300 && !migration.migrates_http_errors() {
                    continue;
                }
                if !migration.scope().matches(target) {
                    continue;
                }
                debug!(
                    version = %version.value(),
                    change = change.name(),
                    status = response.status.as_u16(),
                    "Applying response migration"
                );
                migration.apply(response)?;
            }
        }
    }
    Ok(())
}
