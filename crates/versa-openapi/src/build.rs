//! Render one OpenAPI document per API version

use crate::schemas::{ErrorBodySchema, ErrorSchema, FieldErrorSchema};
use crate::spec::{MediaType, OpenApiSpec, Operation, Parameter, RequestBody, ResponseSpec, SchemaRef};
use versa_core::model::{ModelSet, RouteDef};
use versa_core::ApiVersion;

/// Build the document of `version` from its generated models
///
/// Schemas and enums appear under the name they are exposed as in this
/// version. Only visible routes with `include_in_schema` are documented.
/// When `deprecated` is set every operation is marked deprecated.
pub fn build_version_spec(title: &str, version: ApiVersion, set: &ModelSet, deprecated: bool) -> OpenApiSpec {
    let mut spec = OpenApiSpec::new(title, version)
        .register::<ErrorSchema>()
        .register::<ErrorBodySchema>()
        .register::<FieldErrorSchema>();

    for schema in set.schemas() {
        spec = spec.schema(schema.exposed_name(), schema.to_json_schema(set));
    }
    for enum_def in set.enums() {
        spec = spec.schema(enum_def.exposed_name(), enum_def.to_json_schema());
    }

    for route in set.visible_routes().filter(|r| r.def.include_in_schema) {
        for method in route.def.methods.iter() {
            let operation = operation_for(&route.def, set, deprecated);
            spec = spec.path(&route.def.path, method, operation);
        }
    }

    spec
}

fn exposed(set: &ModelSet, head_name: &str) -> String {
    set.schema(head_name)
        .map(|s| s.exposed_name().to_string())
        .unwrap_or_else(|| head_name.to_string())
}

/// `{id}` segments of a route template
pub fn path_params(path: &str) -> Vec<&str> {
    path.split('/')
        .filter_map(|segment| segment.strip_prefix('{')?.strip_suffix('}'))
        .collect()
}

fn operation_for(route: &RouteDef, set: &ModelSet, deprecated: bool) -> Operation {
    let mut operation = Operation::new().deprecated(route.deprecated || deprecated);
    if let Some(summary) = &route.summary {
        operation = operation.summary(summary.clone());
    }
    if let Some(description) = &route.description {
        operation = operation.description(description.clone());
    }
    if !route.tags.is_empty() {
        operation = operation.tags(route.tags.clone());
    }

    for name in path_params(&route.path) {
        operation = operation.parameter(Parameter {
            name: name.to_string(),
            location: "path".to_string(),
            required: true,
            description: None,
            schema: SchemaRef::Inline(serde_json::json!({"type": "string"})),
        });
    }

    let success = ResponseSpec {
        description: "Successful response".to_string(),
        content: route
            .response_schema
            .as_deref()
            .map(|name| MediaType::json(SchemaRef::component(&exposed(set, name)))),
    };
    operation = operation.response(route.status_code, success);

    if let Some(name) = &route.request_schema {
        operation = operation
            .request_body(RequestBody {
                required: true,
                content: MediaType::json(SchemaRef::component(&exposed(set, name))),
            })
            .response(
                422,
                ResponseSpec {
                    description: "Validation error".to_string(),
                    content: Some(MediaType::json(SchemaRef::component("ErrorSchema"))),
                },
            );
    }

    operation.response(
        400,
        ResponseSpec {
            description: "Missing, invalid or unsupported API version".to_string(),
            content: Some(MediaType::json(SchemaRef::component("ErrorSchema"))),
        },
    )
}
