//! Head model registry and per-version model sets

use super::field::{FieldDef, FieldType};
use super::route::{RouteDef, RouteEntry, RouteId};
use super::schema::{EnumDef, SchemaDef};
use crate::error::ModelError;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

/// Schemas, enums and routes as they look in one API version
///
/// Every map is keyed by head name so that the same key finds a schema in
/// all versions, whatever it is exposed as.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelSet {
    pub(crate) schemas: BTreeMap<String, SchemaDef>,
    pub(crate) enums: BTreeMap<String, EnumDef>,
    pub(crate) routes: Vec<RouteEntry>,
}

impl ModelSet {
    pub fn schema(&self, name: &str) -> Option<&SchemaDef> {
        self.schemas.get(name)
    }

    pub fn enum_def(&self, name: &str) -> Option<&EnumDef> {
        self.enums.get(name)
    }

    pub fn schemas(&self) -> impl Iterator<Item = &SchemaDef> {
        self.schemas.values()
    }

    pub fn enums(&self) -> impl Iterator<Item = &EnumDef> {
        self.enums.values()
    }

    /// All routes, including the ones hidden in this version
    pub fn routes(&self) -> &[RouteEntry] {
        &self.routes
    }

    pub fn visible_routes(&self) -> impl Iterator<Item = &RouteEntry> {
        self.routes.iter().filter(|r| r.visible)
    }

    pub fn route(&self, id: RouteId) -> Option<&RouteEntry> {
        self.routes.iter().find(|r| r.id == id)
    }

    /// Head name of the schema exposed as `exposed` in this version
    pub fn schema_by_exposed_name(&self, exposed: &str) -> Option<&SchemaDef> {
        self.schemas.values().find(|s| s.exposed_name() == exposed)
    }

    /// Fields of `name` with inheritance resolved
    ///
    /// Parent fields come first, minus the ones the schema hides and under
    /// the names it renames them to. A child field that shadows a parent
    /// field takes the parent field's position.
    pub fn effective_fields(&self, name: &str) -> Option<Vec<FieldDef>> {
        let mut seen = HashSet::new();
        self.collect_fields(name, &mut seen)
    }

    fn collect_fields(&self, name: &str, seen: &mut HashSet<String>) -> Option<Vec<FieldDef>> {
        let schema = self.schemas.get(name)?;
        if !seen.insert(name.to_string()) {
            return None;
        }

        let mut fields = match &schema.parent {
            Some(parent) => self.collect_fields(parent, seen).unwrap_or_default(),
            None => Vec::new(),
        };
        fields.retain(|f| !schema.hidden_fields.contains(&f.name));
        for field in &mut fields {
            if let Some(renamed) = schema.renamed_fields.get(&field.name) {
                field.name = renamed.clone();
            }
        }
        for own in &schema.fields {
            match fields.iter_mut().find(|f| f.name == own.name) {
                Some(slot) => *slot = own.clone(),
                None => fields.push(own.clone()),
            }
        }
        Some(fields)
    }

    /// Whether `schema` is `ancestor` or inherits from it
    pub fn is_subtype(&self, schema: &str, ancestor: &str) -> bool {
        let mut current = Some(schema);
        let mut hops = 0;
        while let Some(name) = current {
            if name == ancestor {
                return true;
            }
            hops += 1;
            if hops > self.schemas.len() {
                return false;
            }
            current = self.schemas.get(name).and_then(|s| s.parent.as_deref());
        }
        false
    }

    /// Names of every schema that inherits from `name`, directly or not
    pub fn descendants(&self, name: &str) -> Vec<String> {
        self.schemas
            .keys()
            .filter(|candidate| candidate.as_str() != name && self.is_subtype(candidate, name))
            .cloned()
            .collect()
    }

    pub(crate) fn schema_mut(&mut self, name: &str) -> Option<&mut SchemaDef> {
        self.schemas.get_mut(name)
    }

    pub(crate) fn enum_mut(&mut self, name: &str) -> Option<&mut EnumDef> {
        self.enums.get_mut(name)
    }
}

/// The head (latest) version of every schema, enum and route
///
/// # Example
///
/// ```rust
/// use versa_core::model::{FieldDef, FieldType, ModelRegistry, SchemaDef};
///
/// let registry = ModelRegistry::new().schema(
///     SchemaDef::new("User").field(FieldDef::new("name", FieldType::String)),
/// );
/// assert!(registry.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    schemas: BTreeMap<String, SchemaDef>,
    enums: BTreeMap<String, EnumDef>,
    routes: Vec<RouteDef>,
    errors: Vec<ModelError>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema (builder form)
    pub fn schema(mut self, def: SchemaDef) -> Self {
        self.insert_schema(def);
        self
    }

    /// Register an enum (builder form)
    pub fn enum_def(mut self, def: EnumDef) -> Self {
        self.insert_enum(def);
        self
    }

    pub fn insert_schema(&mut self, def: SchemaDef) {
        if self.schemas.contains_key(&def.name) || self.enums.contains_key(&def.name) {
            self.errors.push(ModelError::DuplicateSchema(def.name.clone()));
            return;
        }
        self.schemas.insert(def.name.clone(), def);
    }

    pub fn insert_enum(&mut self, def: EnumDef) {
        if self.enums.contains_key(&def.name) || self.schemas.contains_key(&def.name) {
            self.errors.push(ModelError::DuplicateEnum(def.name.clone()));
            return;
        }
        self.enums.insert(def.name.clone(), def);
    }

    /// Register a type that implements `utoipa::ToSchema`
    ///
    /// Types it refers to must be registered as well.
    pub fn register<T: for<'a> utoipa::ToSchema<'a>>(mut self) -> Self {
        let (name, schema) = T::schema();
        match serde_json::to_value(schema) {
            Ok(json) => self.import(name, &json),
            Err(e) => self.errors.push(ModelError::Import {
                name: name.to_string(),
                reason: e.to_string(),
            }),
        }
        self
    }

    /// Import every entry of an OpenAPI `components` object
    ///
    /// Accepts either the whole `components` object or its `schemas` map.
    pub fn from_json_schema_components(value: &Value) -> Result<Self, ModelError> {
        let schemas = value
            .get("schemas")
            .unwrap_or(value)
            .as_object()
            .ok_or_else(|| ModelError::Import {
                name: "components".to_string(),
                reason: "expected an object of schemas".to_string(),
            })?;

        let mut registry = Self::new();
        for (name, schema) in schemas {
            registry.import(name, schema);
        }
        registry.validate()?;
        Ok(registry)
    }

    fn import(&mut self, name: &str, json: &Value) {
        if let Some(def) = EnumDef::from_json_schema(name, json) {
            self.insert_enum(def);
            return;
        }
        match SchemaDef::from_json_schema(name, json) {
            Ok(def) => self.insert_schema(def),
            Err(e) => self.errors.push(e),
        }
    }

    /// Add a head route and return its id
    pub fn add_route(&mut self, def: RouteDef) -> RouteId {
        self.routes.push(def);
        RouteId(self.routes.len() - 1)
    }

    pub fn route(mut self, def: RouteDef) -> Self {
        self.add_route(def);
        self
    }

    pub fn get_schema(&self, name: &str) -> Option<&SchemaDef> {
        self.schemas.get(name)
    }

    pub fn get_enum(&self, name: &str) -> Option<&EnumDef> {
        self.enums.get(name)
    }

    pub fn routes(&self) -> &[RouteDef] {
        &self.routes
    }

    /// Check that the head model is self-consistent
    pub fn validate(&self) -> Result<(), ModelError> {
        if let Some(err) = self.errors.first() {
            return Err(err.clone());
        }

        for schema in self.schemas.values() {
            let Some(parent) = &schema.parent else {
                continue;
            };
            if !self.schemas.contains_key(parent) {
                return Err(ModelError::UnknownParent {
                    schema: schema.name.clone(),
                    parent: parent.clone(),
                });
            }

            let mut seen = HashSet::from([schema.name.as_str()]);
            let mut current = Some(parent.as_str());
            while let Some(name) = current {
                if !seen.insert(name) {
                    return Err(ModelError::ParentCycle(schema.name.clone()));
                }
                current = self.schemas.get(name).and_then(|s| s.parent.as_deref());
            }
        }
        Ok(())
    }

    /// Snapshot of the head version
    ///
    /// References imported as schema refs that point at enums are fixed up,
    /// and routes that only exist in older versions start hidden.
    pub fn head(&self) -> ModelSet {
        let mut schemas = self.schemas.clone();
        for schema in schemas.values_mut() {
            for field in &mut schema.fields {
                retarget_enum_refs(&mut field.ty, &self.enums);
            }
        }

        let routes = self
            .routes
            .iter()
            .enumerate()
            .map(|(idx, def)| RouteEntry {
                id: RouteId(idx),
                def: def.clone(),
                visible: !def.only_in_older_versions,
            })
            .collect();

        ModelSet {
            schemas,
            enums: self.enums.clone(),
            routes,
        }
    }
}

fn retarget_enum_refs(ty: &mut FieldType, enums: &BTreeMap<String, EnumDef>) {
    match ty {
        FieldType::Ref(name) if enums.contains_key(name.as_str()) => {
            let name = std::mem::take(name);
            *ty = FieldType::Enum(name);
        }
        FieldType::Array(inner) | FieldType::Map(inner) => retarget_enum_refs(inner, enums),
        FieldType::Union(variants) => variants.iter_mut().for_each(|v| retarget_enum_refs(v, enums)),
        _ => {}
    }
}
