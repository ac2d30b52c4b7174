//! VersionedApp builder

use crate::config::ServerConfig;
use crate::error::AppError;
use crate::handler::BoxedHandler;
use crate::pipeline::{Docs, ServiceInner, VersionedService};
use crate::router::{MethodRouter, RouteTable};
use crate::server::Server;
use crate::strategy::{VersionFallback, VersionStrategy};
use http::{Extensions, HeaderName};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use versa_core::model::{ModelRegistry, RouteId};
use versa_core::{generate_versioned_models, VersionBundle};
use versa_openapi::build_version_spec;

/// Default request body limit: 1MB
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Main application builder
///
/// Handlers are written once against the head schemas; the app serves every
/// version of the bundle from them.
///
/// ```rust,ignore
/// use versa_server::{get, post, VersionedApp};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
///     VersionedApp::new(versions(), models())
///         .route("/users", post(create_user).request_schema("UserCreate").response_schema("User"))
///         .route("/users/{id}", get(get_user).response_schema("User"))
///         .docs("/docs")
///         .run("127.0.0.1:8080")
///         .await
/// }
/// ```
pub struct VersionedApp {
    bundle: VersionBundle,
    registry: ModelRegistry,
    handlers: HashMap<RouteId, BoxedHandler>,
    errors: Vec<AppError>,
    state: Extensions,
    strategy: VersionStrategy,
    fallback: VersionFallback,
    docs_path: Option<String>,
    title: String,
    body_limit: Option<usize>,
}

impl VersionedApp {
    pub fn new(bundle: VersionBundle, registry: ModelRegistry) -> Self {
        Self {
            bundle,
            registry,
            handlers: HashMap::new(),
            errors: Vec::new(),
            state: Extensions::new(),
            strategy: VersionStrategy::default(),
            fallback: VersionFallback::default(),
            docs_path: None,
            title: "API".to_string(),
            body_limit: Some(DEFAULT_BODY_LIMIT),
        }
    }

    /// Add the handlers of `path`, described against head schemas
    pub fn route(mut self, path: &str, method_router: MethodRouter) -> Self {
        for endpoint in method_router.endpoints {
            let duplicate = self
                .registry
                .routes()
                .iter()
                .any(|def| def.path == path && def.methods.contains(&endpoint.method));
            if duplicate {
                self.errors.push(AppError::DuplicateRoute {
                    path: path.to_string(),
                    method: endpoint.method,
                });
                continue;
            }

            let mut def = endpoint.def;
            def.path = path.to_string();
            let id = self.registry.add_route(def);
            self.handlers.insert(id, endpoint.handler);
        }
        self
    }

    /// Add application state
    pub fn state<S: Clone + Send + Sync + 'static>(mut self, state: S) -> Self {
        self.state.insert(state);
        self
    }

    pub fn strategy(mut self, strategy: VersionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn fallback(mut self, fallback: VersionFallback) -> Self {
        self.fallback = fallback;
        self
    }

    /// Serve the version index at `path` and each version's OpenAPI
    /// document at `{path}/openapi.json?version=`
    pub fn docs(mut self, path: impl Into<String>) -> Self {
        self.docs_path = Some(path.into());
        self
    }

    /// Title of the generated documents
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Reject request bodies larger than `limit` bytes with 413
    ///
    /// The default limit is [`DEFAULT_BODY_LIMIT`].
    pub fn body_limit(mut self, limit: usize) -> Self {
        self.body_limit = Some(limit);
        self
    }

    /// Accept request bodies of any size
    pub fn no_body_limit(mut self) -> Self {
        self.body_limit = None;
        self
    }

    /// Apply the header name and default version from `config`
    pub fn configure(mut self, config: &ServerConfig) -> Self {
        if let VersionStrategy::Header { .. } = self.strategy {
            self.strategy = VersionStrategy::header_with_name(&config.version_header);
        }
        if let Some(version) = config.default_version {
            self.fallback = VersionFallback::Fixed(version);
        }
        self
    }

    /// Generate every version and assemble the service
    pub fn build(mut self) -> Result<VersionedService, AppError> {
        if let Some(err) = self.errors.drain(..).next() {
            return Err(err);
        }

        if let VersionFallback::Fixed(version) = self.fallback {
            if self.bundle.resolve(version).is_none() {
                return Err(AppError::UnknownFallbackVersion(version));
            }
        }

        for (idx, def) in self.registry.routes().iter().enumerate() {
            if !self.handlers.contains_key(&RouteId(idx)) {
                return Err(AppError::MissingHandler {
                    path: def.path.clone(),
                    methods: def.methods.to_string(),
                });
            }
        }

        let models = generate_versioned_models(&self.bundle, &self.registry)?;

        let mut tables = Vec::new();
        for (version, set) in models.iter() {
            tables.push((version, RouteTable::build(version, set)?));
        }

        let docs = self.docs_path.map(|path| {
            let specs = models
                .iter()
                .map(|(version, set)| (version, build_version_spec(&self.title, version, set, false)))
                .collect();
            Docs::new(&path, self.title.clone(), specs)
        });

        let version_header = match &self.strategy {
            VersionStrategy::Header { name } => {
                HeaderName::try_from(name.as_str()).unwrap_or(HeaderName::from_static("x-api-version"))
            }
            _ => HeaderName::from_static("x-api-version"),
        };

        info!(
            versions = self.bundle.versions().len(),
            latest = %self.bundle.latest(),
            routes = self.registry.routes().len(),
            "Generated API versions"
        );

        Ok(VersionedService {
            inner: Arc::new(ServiceInner {
                bundle: self.bundle,
                models,
                tables,
                handlers: self.handlers,
                state: Arc::new(self.state),
                strategy: self.strategy,
                fallback: self.fallback,
                version_header,
                body_limit: self.body_limit,
                docs,
            }),
        })
    }

    /// Build the service and serve it on `addr`
    pub async fn run(self, addr: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let service = self.build()?;
        Server::new(service).run(addr).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::{get, post};
    use http::Method;
    use versa_core::model::RouteDef;
    use versa_core::structure::{endpoint, Version, VersionChange};

    async fn ok() -> &'static str {
        "ok"
    }

    fn bundle() -> VersionBundle {
        VersionBundle::new(vec![
            Version::parse("2024-06-01").unwrap().change(
                VersionChange::new("RemoveLegacy")
                    .description("The legacy endpoint was removed")
                    .instruction(endpoint("/legacy", Method::GET).existed()),
            ),
            Version::parse("2024-01-01").unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn test_build_generates_every_version() {
        let service = VersionedApp::new(bundle(), ModelRegistry::new())
            .route("/users", get(ok).post(ok))
            .route("/legacy", get(ok).only_in_older_versions())
            .build()
            .unwrap();

        assert_eq!(service.versions(), vec!["2024-06-01".parse().unwrap(), "2024-01-01".parse().unwrap()]);
    }

    #[test]
    fn test_duplicate_route_is_rejected() {
        let err = VersionedApp::new(bundle(), ModelRegistry::new())
            .route("/users", get(ok))
            .route("/users", post(ok).get(ok))
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, AppError::DuplicateRoute { method, .. } if method == Method::GET));
    }

    #[test]
    fn test_registry_route_without_handler() {
        let registry = ModelRegistry::new().route(RouteDef::new("/orphan", Method::GET));
        let err = VersionedApp::new(bundle(), registry).build().err().unwrap();
        assert!(matches!(err, AppError::MissingHandler { .. }));
    }

    #[test]
    fn test_generation_errors_surface() {
        // `/legacy` is restored by the bundle but never declared
        let err = VersionedApp::new(bundle(), ModelRegistry::new()).build().err().unwrap();
        assert!(err.to_string().contains("/legacy"), "{err}");
    }

    #[test]
    fn test_fixed_fallback_must_resolve() {
        let err = VersionedApp::new(bundle(), ModelRegistry::new())
            .route("/legacy", get(ok).only_in_older_versions())
            .fallback(VersionFallback::Fixed("2020-01-01".parse().unwrap()))
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, AppError::UnknownFallbackVersion(_)));
    }

    #[test]
    fn test_body_limit_settings() {
        let app = VersionedApp::new(bundle(), ModelRegistry::new());
        assert_eq!(app.body_limit, Some(DEFAULT_BODY_LIMIT));
        assert_eq!(app.body_limit(16).body_limit, Some(16));

        let service = VersionedApp::new(bundle(), ModelRegistry::new())
            .route("/legacy", get(ok).only_in_older_versions())
            .no_body_limit()
            .build()
            .unwrap();
        assert_eq!(service.body_limit(), None);
    }

    #[test]
    fn test_configure_from_server_config() {
        let config = ServerConfig {
            version_header: "Api-Version".to_string(),
            default_version: Some("2024-01-01".parse().unwrap()),
            ..ServerConfig::default()
        };
        let app = VersionedApp::new(bundle(), ModelRegistry::new()).configure(&config);
        assert_eq!(app.strategy, VersionStrategy::header_with_name("api-version"));
        assert_eq!(app.fallback, VersionFallback::Fixed("2024-01-01".parse().unwrap()));
    }
}
