//! Per-version model generation

use crate::error::GenerationError;
use crate::model::{FieldDef, ModelRegistry, ModelSet, SchemaDef};
use crate::structure::VersionBundle;
use crate::version::ApiVersion;
use tracing::debug;

/// Models of every version in a bundle, newest first
#[derive(Debug, Clone)]
pub struct VersionedModels {
    sets: Vec<(ApiVersion, ModelSet)>,
}

impl VersionedModels {
    pub fn get(&self, version: ApiVersion) -> Option<&ModelSet> {
        self.sets
            .iter()
            .find(|(value, _)| *value == version)
            .map(|(_, set)| set)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ApiVersion, &ModelSet)> {
        self.sets.iter().map(|(value, set)| (*value, set))
    }

    /// Models of the latest version
    pub fn head(&self) -> &ModelSet {
        &self.sets[0].1
    }

    pub fn schema(&self, version: ApiVersion, name: &str) -> Option<&SchemaDef> {
        self.get(version)?.schema(name)
    }

    pub fn effective_fields(&self, version: ApiVersion, name: &str) -> Option<Vec<FieldDef>> {
        self.get(version)?.effective_fields(name)
    }
}

/// Derive the models of every version from the head registry
///
/// The latest version gets the head models. Each older version is produced
/// by applying the instructions of the next newer version's changes, in
/// declaration order.
pub fn generate_versioned_models(
    bundle: &VersionBundle,
    registry: &ModelRegistry,
) -> Result<VersionedModels, GenerationError> {
    registry.validate()?;

    let mut current = registry.head();
    let mut sets = Vec::with_capacity(bundle.versions().len());

    for version in bundle {
        sets.push((version.value(), current.clone()));

        for change in version.changes() {
            for instruction in change.instructions() {
                instruction.apply(&mut current, change.name())?;
            }
        }

        debug!(
            version = %version.value(),
            schemas = current.schemas.len(),
            routes = current.visible_routes().count(),
            "Generated models for version"
        );
    }

    Ok(VersionedModels { sets })
}
