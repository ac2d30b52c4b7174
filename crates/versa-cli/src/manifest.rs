//! Versioning manifest
//!
//! A manifest describes a whole API in TOML: the head schemas (an OpenAPI
//! components file), the head routes and every version with its changes.
//!
//! ```toml
//! title = "Users API"
//! head_schemas = "schemas.json"
//!
//! [[routes]]
//! path = "/users"
//! methods = ["POST"]
//! request_schema = "UserCreate"
//!
//! [[versions]]
//! value = "2024-06-01"
//!
//! [[versions.changes]]
//! name = "AddressesBecameAList"
//! description = "`address` became `addresses`"
//! instructions = [
//!     { kind = "schema", action = "field_didnt_exist", schema = "UserCreate", field = "addresses" },
//! ]
//!
//! [[versions]]
//! value = "2024-01-01"
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use versa_core::model::RouteDef;
use versa_core::structure::AlterInstruction;
use versa_core::{ApiVersion, ModelRegistry, Version, VersionBundle, VersionChange};

fn default_title() -> String {
    "API".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default = "default_title")]
    pub title: String,
    pub head_schemas: PathBuf,
    #[serde(default)]
    pub routes: Vec<RouteDef>,
    pub versions: Vec<VersionEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VersionEntry {
    pub value: ApiVersion,
    #[serde(default)]
    pub changes: Vec<ChangeEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChangeEntry {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub instructions: Vec<AlterInstruction>,
}

/// A manifest resolved into a bundle and a head registry
pub struct Project {
    pub title: String,
    pub bundle: VersionBundle,
    pub registry: ModelRegistry,
}

impl Manifest {
    pub fn parse(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("Invalid manifest")
    }

    pub fn bundle(&self) -> Result<VersionBundle> {
        let versions = self
            .versions
            .iter()
            .map(|entry| {
                entry
                    .changes
                    .iter()
                    .map(ChangeEntry::to_change)
                    .fold(Version::new(entry.value), Version::change)
            })
            .collect();
        Ok(VersionBundle::new(versions)?)
    }

    /// Build the head registry from already loaded components
    pub fn registry(&self, components: &serde_json::Value) -> Result<ModelRegistry> {
        let mut registry = ModelRegistry::from_json_schema_components(components)?;
        for route in &self.routes {
            for schema in route.request_schema.iter().chain(&route.response_schema) {
                if registry.get_schema(schema).is_none() {
                    bail!("Route {} refers to unknown schema \"{}\"", route.path, schema);
                }
            }
            registry.add_route(route.clone());
        }
        registry.validate()?;
        Ok(registry)
    }
}

impl ChangeEntry {
    fn to_change(&self) -> VersionChange {
        let change = self
            .instructions
            .iter()
            .cloned()
            .fold(VersionChange::new(&self.name).description(&self.description), VersionChange::instruction);
        if self.hidden {
            change.hidden()
        } else {
            change
        }
    }
}

/// Read a manifest and everything it points to
///
/// `head_schemas` is resolved relative to the manifest's directory.
pub async fn load(path: &Path) -> Result<Project> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read manifest {}", path.display()))?;
    let manifest = Manifest::parse(&raw).with_context(|| format!("In {}", path.display()))?;

    let schemas_path = path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(&manifest.head_schemas);
    let schemas = tokio::fs::read_to_string(&schemas_path)
        .await
        .with_context(|| format!("Failed to read head schemas {}", schemas_path.display()))?;
    let components: serde_json::Value = serde_json::from_str(&schemas)
        .with_context(|| format!("Invalid JSON in {}", schemas_path.display()))?;

    let bundle = manifest.bundle()?;
    let registry = manifest.registry(&components)?;
    tracing::debug!(
        versions = bundle.versions().len(),
        routes = registry.routes().len(),
        "Loaded manifest"
    );

    Ok(Project {
        title: manifest.title,
        bundle,
        registry,
    })
}
