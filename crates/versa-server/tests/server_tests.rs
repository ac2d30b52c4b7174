//! End-to-end tests for the versioning pipeline
//!
//! A small users API with three versions, served through `TestClient`.

use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use versa_core::model::{EnumDef, FieldAttr, FieldChange, FieldDef, FieldInfo, FieldType, ModelRegistry, SchemaDef};
use versa_core::structure::{endpoint, enum_, schema, EndpointChange, Version, VersionChange};
use versa_core::{MigrationError, RequestMigration, ResponseMigration, VersionBundle};
use versa_server::{
    get, post, ApiError, Created, Json, NoContent, Path, ResolvedVersion, State, TestClient, TestRequest,
    VersionFallback, VersionStrategy, VersionedApp, VersionedService, DEFAULT_BODY_LIMIT,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct UserCreate {
    name: String,
    addresses: Vec<String>,
    role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct User {
    id: u64,
    name: String,
    addresses: Vec<String>,
    role: String,
}

#[derive(Clone, Default)]
struct Store(Arc<Mutex<Vec<User>>>);

async fn create_user(State(store): State<Store>, Json(body): Json<UserCreate>) -> Created<User> {
    let mut users = store.0.lock().unwrap();
    let user = User {
        id: users.len() as u64 + 1,
        name: body.name,
        addresses: body.addresses,
        role: body.role,
    };
    users.push(user.clone());
    Created(user)
}

async fn get_user(State(store): State<Store>, Path(id): Path<u64>) -> Result<Json<User>, ApiError> {
    store
        .0
        .lock()
        .unwrap()
        .iter()
        .find(|u| u.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("User {id} not found")))
}

async fn legacy_ping(ResolvedVersion(version): ResolvedVersion) -> String {
    format!("pong from {version}")
}

async fn delete_user() -> NoContent {
    NoContent
}

fn registry() -> ModelRegistry {
    ModelRegistry::new()
        .enum_def(EnumDef::new("Role").string_members(["admin", "member", "guest"]))
        .schema(
            SchemaDef::new("UserCreate")
                .field(FieldDef::new("name", FieldType::String).with_info(FieldInfo::new().max_length(20)))
                .field(FieldDef::new("addresses", FieldType::array(FieldType::String)))
                .field(
                    FieldDef::new("role", FieldType::enumeration("Role"))
                        .with_info(FieldInfo::new().with_default("member")),
                ),
        )
        .schema(
            SchemaDef::new("User")
                .parent("UserCreate")
                .field(FieldDef::new("id", FieldType::Integer)),
        )
}

fn bundle() -> VersionBundle {
    VersionBundle::new(vec![
        Version::parse("2024-06-01").unwrap().change(
            VersionChange::new("AddressesBecameAList")
                .description("`address` became `addresses`, a list")
                .instruction(schema("UserCreate").field("addresses").didnt_exist())
                .instruction(
                    schema("UserCreate")
                        .field("address")
                        .existed_as(FieldType::String, FieldInfo::new()),
                )
                .instruction(endpoint("/ping", Method::GET).existed())
                .request_migration(RequestMigration::for_schema("UserCreate").transform(|request| {
                    let address = request.body["address"].take();
                    if address.as_str() == Some("nowhere") {
                        return Err(MigrationError::rejected("\"nowhere\" is not an address"));
                    }
                    if let Some(body) = request.body.as_object_mut() {
                        body.remove("address");
                        body.insert("addresses".into(), json!([address]));
                    }
                    Ok(())
                }))
                .response_migration(ResponseMigration::for_schema("UserCreate").with_subtypes().transform(
                    |response| {
                        let first = response.body["addresses"][0].take();
                        if let Some(body) = response.body.as_object_mut() {
                            body.remove("addresses");
                            body.insert("address".into(), first);
                        }
                        Ok(())
                    },
                ))
                .response_migration(
                    ResponseMigration::for_path("/users/{id}", Method::GET)
                        .migrate_http_errors()
                        .transform(|response| {
                            if response.status.as_u16() == 404 {
                                response.body = json!({"detail": response.body["error"]["message"].take()});
                            }
                            Ok(())
                        }),
                ),
        ),
        Version::parse("2024-01-01").unwrap().change(
            VersionChange::new("GuestsAndRenamedCollection")
                .description("Guests were introduced and `/accounts` became `/users`")
                .instruction(enum_("Role").didnt_have(["guest"]))
                .instruction(
                    schema("UserCreate")
                        .field("name")
                        .had(FieldChange::new().attr(FieldAttr::MaxLength, 50)),
                )
                .instruction(endpoint("/users/{id}", Method::GET).had(EndpointChange::new().path("/accounts/{id}")))
                .instruction(endpoint("/users", Method::POST).had(EndpointChange::new().status_code(200))),
        ),
        Version::parse("2023-01-01").unwrap(),
    ])
    .unwrap()
}

fn app() -> VersionedApp {
    VersionedApp::new(bundle(), registry())
        .title("Users")
        .route(
            "/users",
            post(create_user)
                .request_schema("UserCreate")
                .response_schema("User")
                .status(201),
        )
        .route(
            "/users/{id}",
            get(get_user).response_schema("User").delete(delete_user).status(204),
        )
        .route("/ping", get(legacy_ping).only_in_older_versions())
        .state(Store::default())
        .docs("/docs")
}

fn client() -> TestClient {
    TestClient::new(app().build().unwrap())
}

fn service() -> VersionedService {
    app().build().unwrap()
}

// ============================================================================
// Head clients
// ============================================================================

#[tokio::test]
async fn test_latest_client_uses_head_shapes() {
    let client = client();

    let response = client
        .request(TestRequest::post("/users").json(&json!({"name": "Ada", "addresses": ["1 Loop Rd"]})))
        .await;
    response.assert_status(201).assert_header("x-api-version", "2024-06-01");
    response.assert_json(&json!({"id": 1, "name": "Ada", "addresses": ["1 Loop Rd"], "role": "member"}));
    assert!(response.header("x-request-id").is_some());

    let response = client.get("/users/1").await;
    response.assert_status(200);
    assert_eq!(response.json::<User>().unwrap().addresses, ["1 Loop Rd"]);
}

#[tokio::test]
async fn test_route_removed_from_head_is_absent() {
    let response = client().get("/ping").await;
    response.assert_status(404);
}

// ============================================================================
// Older clients
// ============================================================================

#[tokio::test]
async fn test_old_client_request_and_response_are_migrated() {
    let client = client();

    let response = client
        .request(
            TestRequest::post("/users")
                .version("2024-03-15")
                .json(&json!({"name": "Ada", "address": "1 Loop Rd"})),
        )
        .await;
    response.assert_status(201).assert_header("x-api-version", "2024-01-01");
    response.assert_json(&json!({"id": 1, "name": "Ada", "address": "1 Loop Rd", "role": "member"}));

    // The same user, read by a head client
    let head: User = client.get("/users/1").await.json().unwrap();
    assert_eq!(head.addresses, ["1 Loop Rd"]);
}

#[tokio::test]
async fn test_oldest_client_sees_renamed_path_and_status() {
    let client = client();

    let response = client
        .request(
            TestRequest::post("/users")
                .version("2023-01-01")
                .json(&json!({"name": "A name of thirty characters..", "address": "Here"})),
        )
        .await;
    response.assert_status(200);

    client
        .request(TestRequest::get("/accounts/1").version("2023-01-01"))
        .await
        .assert_status(200)
        .assert_json(&json!({"id": 1, "name": "A name of thirty characters..", "address": "Here", "role": "member"}));

    // Only GET moved; DELETE still lives at the head path
    client
        .request(TestRequest::get("/users/1").version("2023-01-01"))
        .await
        .assert_status(405)
        .assert_header("allow", "DELETE");
}

#[tokio::test]
async fn test_older_constraints_are_validated() {
    let client = client();

    let response = client
        .request(
            TestRequest::post("/users")
                .version("2023-01-01")
                .json(&json!({"name": "Ada", "address": "Here", "role": "guest"})),
        )
        .await;
    response.assert_status(422);
    let body: Value = response.json().unwrap();
    assert_eq!(body["error"]["type"], "validation_error");
    assert_eq!(body["error"]["fields"][0]["field"], "role");
    assert_eq!(body["error"]["fields"][0]["code"], "enum");

    // `guest` exists from 2024-01-01 on
    client
        .request(
            TestRequest::post("/users")
                .version("2024-01-01")
                .json(&json!({"name": "Ada", "address": "Here", "role": "guest"})),
        )
        .await
        .assert_status(201);

    // Names up to 50 characters were accepted before 2024-01-01
    let long_name = "x".repeat(30);
    client
        .request(TestRequest::post("/users").version("2024-01-01").json(&json!({"name": long_name, "address": "Here"})))
        .await
        .assert_status(422);
}

#[tokio::test]
async fn test_restored_endpoint_served_to_old_versions() {
    let response = client()
        .request(TestRequest::get("/ping").version("2024-01-01"))
        .await;
    response.assert_status(200);
    assert_eq!(response.text(), "pong from 2024-01-01");
}

#[tokio::test]
async fn test_error_responses_migrated_only_when_opted_in() {
    let response = client()
        .request(TestRequest::get("/users/9").version("2024-01-01"))
        .await;
    response.assert_status(404).assert_json(&json!({"detail": "User 9 not found"}));
}

#[tokio::test]
async fn test_rejected_request_migration() {
    let response = client()
        .request(
            TestRequest::post("/users")
                .version("2024-01-01")
                .json(&json!({"name": "Ada", "address": "nowhere"})),
        )
        .await;
    response.assert_status(400);
    let body: Value = response.json().unwrap();
    assert_eq!(body["error"]["type"], "migration_failed");
    assert_eq!(body["error"]["message"], "\"nowhere\" is not an address");
}

// ============================================================================
// Version picking
// ============================================================================

#[tokio::test]
async fn test_version_errors() {
    let client = client();

    let response = client.request(TestRequest::get("/users/1").version("yesterday")).await;
    response.assert_status(400);
    assert_eq!(response.json::<Value>().unwrap()["error"]["type"], "invalid_api_version");

    let response = client.request(TestRequest::get("/users/1").version("2022-12-31")).await;
    response.assert_status(400);
    assert_eq!(response.json::<Value>().unwrap()["error"]["type"], "unsupported_api_version");
    assert!(response.header("x-api-version").is_none());
}

#[tokio::test]
async fn test_reject_fallback() {
    let client = TestClient::new(app().fallback(VersionFallback::Reject).build().unwrap());
    let response = client.get("/users/1").await;
    response.assert_status(400);
    assert_eq!(response.json::<Value>().unwrap()["error"]["type"], "missing_api_version");
}

#[tokio::test]
async fn test_path_strategy() {
    let client = TestClient::new(app().strategy(VersionStrategy::path()).build().unwrap());

    client
        .request(TestRequest::post("/2024-01-01/users").json(&json!({"name": "Ada", "address": "Here"})))
        .await
        .assert_status(201);
    client
        .get("/2023-06-01/accounts/1")
        .await
        .assert_status(200)
        .assert_header("x-api-version", "2023-01-01");
}

#[tokio::test]
async fn test_method_not_allowed_lists_version_methods() {
    let response = client()
        .request(TestRequest::patch("/users/1").version("2024-06-01"))
        .await;
    response.assert_status(405).assert_header("allow", "DELETE, GET");
}

// ============================================================================
// Request bodies
// ============================================================================

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let client = TestClient::new(app().body_limit(64).build().unwrap());

    let response = client
        .request(TestRequest::post("/users").json(&json!({"name": "Ada", "addresses": ["x".repeat(80)]})))
        .await;
    response.assert_status(413);
    let body: Value = response.json().unwrap();
    assert_eq!(body["error"]["type"], "payload_too_large");
    assert_eq!(body["error"]["message"], "Request body exceeds limit of 64 bytes");
    assert!(response.header("x-request-id").is_some());

    // A declared length over the limit is enough
    client
        .request(
            TestRequest::post("/users")
                .header("content-length", "4096")
                .json(&json!({"name": "Ada", "addresses": []})),
        )
        .await
        .assert_status(413);

    client
        .request(TestRequest::post("/users").json(&json!({"name": "Ada", "addresses": []})))
        .await
        .assert_status(201);
}

#[tokio::test]
async fn test_default_body_limit() {
    let service = service();
    assert_eq!(service.body_limit(), Some(DEFAULT_BODY_LIMIT));

    let response = TestClient::new(service)
        .request(TestRequest::post("/users").body(vec![b' '; DEFAULT_BODY_LIMIT + 1]))
        .await;
    response.assert_status(413);
}

// ============================================================================
// Docs
// ============================================================================

#[tokio::test]
async fn test_docs_per_version() {
    let client = client();

    let index = client.get("/docs").await;
    index.assert_status(200);
    assert!(index.text().contains("/docs/openapi.json?version=2023-01-01"));

    let head: Value = client.get("/docs/openapi.json").await.json().unwrap();
    assert_eq!(head["info"]["version"], "2024-06-01");
    assert!(head["paths"].get("/ping").is_none());

    let oldest: Value = client.get("/docs/openapi.json?version=2023-01-01").await.json().unwrap();
    assert!(oldest["paths"]["/accounts/{id}"]["get"].is_object());
    assert!(oldest["paths"]["/ping"]["get"].is_object());

    client
        .get("/docs/openapi.json?version=2023-06-01")
        .await
        .assert_status(404);
}

#[test]
fn test_service_exposes_generated_models() {
    let service = service();
    let oldest = service.models().get("2023-01-01".parse().unwrap()).unwrap();
    assert_eq!(oldest.enum_def("Role").unwrap().members.len(), 2);
    assert_eq!(service.versions().len(), 3);
}
