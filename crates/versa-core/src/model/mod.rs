//! Schema, enum and route model shared by every version

mod field;
pub mod json_schema;
mod registry;
mod route;
mod schema;

pub use field::{FieldAttr, FieldChange, FieldDef, FieldInfo, FieldType};
pub use registry::{ModelRegistry, ModelSet};
pub use route::{MethodSet, RouteDef, RouteEntry, RouteId};
pub use schema::{EnumDef, EnumMember, SchemaDef};
