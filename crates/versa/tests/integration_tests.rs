//! Integration tests for the versa facade
//!
//! Models come from `#[derive(ToSchema)]` types; versions are picked through
//! a query parameter.

use serde_json::{json, Value};
use versa::prelude::*;
use versa::{TestClient, TestRequest};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
struct Product {
    title: String,
    price_cents: i64,
}

#[derive(Debug, Deserialize)]
struct Search {
    search: Option<String>,
}

async fn list_products(Query(search): Query<Search>) -> Json<Vec<Product>> {
    let all = vec![
        Product { title: "Kettle".into(), price_cents: 2500 },
        Product { title: "Teapot".into(), price_cents: 1800 },
    ];
    let needle = search.search.unwrap_or_default().to_lowercase();
    Json(
        all.into_iter()
            .filter(|p| p.title.to_lowercase().contains(&needle))
            .collect(),
    )
}

async fn create_product(Json(product): Json<Product>) -> Created<Product> {
    Created(product)
}

fn versions() -> VersionBundle {
    VersionBundle::new(vec![
        Version::parse("2025-03-01").unwrap().change(
            VersionChange::new("PricesInCents")
                .description("`price` (a decimal) was replaced by `price_cents`")
                .instruction(schema("Product").field("price_cents").didnt_exist())
                .instruction(schema("Product").field("price").existed_as(FieldType::Number, FieldInfo::new()))
                .request_migration(RequestMigration::for_schema("Product").transform(|request| {
                    let price = request.body["price"].as_f64().unwrap_or_default();
                    if let Some(body) = request.body.as_object_mut() {
                        body.remove("price");
                        body.insert("price_cents".into(), json!((price * 100.0).round() as i64));
                    }
                    Ok(())
                }))
                .response_migration(ResponseMigration::for_schema("Product").transform(|response| {
                    if let Some(body) = response.body.as_object_mut() {
                        let cents = body.remove("price_cents").and_then(|v| v.as_i64()).unwrap_or_default();
                        body.insert("price".into(), json!(cents as f64 / 100.0));
                    }
                    Ok(())
                })),
        ),
        Version::parse("2024-09-01").unwrap().change(
            VersionChange::new("SearchParameterRenamed")
                .description("The `q` query parameter became `search`")
                .request_migration(RequestMigration::for_path("/products", Method::GET).transform(|request| {
                    for (key, _) in request.query.iter_mut() {
                        if *key == "q" {
                            *key = "search".to_string();
                        }
                    }
                    Ok(())
                }))
                .response_migration(ResponseMigration::for_path("/products", Method::GET).transform(|response| {
                    response.body = json!({"items": response.body.take()});
                    Ok(())
                })),
        ),
        Version::parse("2024-01-01").unwrap(),
    ])
    .unwrap()
}

fn client() -> TestClient {
    let service = VersionedApp::new(versions(), ModelRegistry::new().register::<Product>())
        .strategy(VersionStrategy::query())
        .fallback(VersionFallback::Oldest)
        .route("/products", get(list_products).post(create_product))
        .route("/products/new", post(create_product).request_schema("Product").response_schema("Product").status(201))
        .build()
        .unwrap();
    TestClient::new(service)
}

#[tokio::test]
async fn test_fallback_to_oldest_version() {
    let response = client().get("/products?q=kettle").await;
    response.assert_status(200).assert_header("x-api-version", "2024-01-01");
    response.assert_json(&json!({"items": [{"title": "Kettle", "price_cents": 2500}]}));
}

#[tokio::test]
async fn test_query_migration_between_versions() {
    let client = client();

    let middle: Value = client.get("/products?version=2024-09-01&search=tea").await.json().unwrap();
    assert_eq!(middle, json!([{"title": "Teapot", "price_cents": 1800}]));

    // Head ignores the retired parameter
    let head: Value = client.get("/products?version=2025-03-01&q=tea").await.json().unwrap();
    assert_eq!(head.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_body_migrations_with_derived_schema() {
    let client = client();

    let response = client
        .request(TestRequest::post("/products/new?version=2024-09-01").json(&json!({"title": "Mug", "price": 4.5})))
        .await;
    response.assert_status(201).assert_json(&json!({"title": "Mug", "price": 4.5}));

    let response = client
        .request(TestRequest::post("/products/new?version=2025-03-01").json(&json!({"title": "Mug", "price_cents": 450})))
        .await;
    response.assert_status(201).assert_json(&json!({"title": "Mug", "price_cents": 450}));

    // The old shape is not accepted by head
    client
        .request(TestRequest::post("/products/new?version=2025-03-01").json(&json!({"title": "Mug", "price": 4.5})))
        .await
        .assert_status(422);
}

#[test]
fn test_changelog_from_facade() {
    let markdown = versa::generate_changelog(&versions()).to_markdown();
    assert!(markdown.contains("PricesInCents"));
    assert!(markdown.contains("SearchParameterRenamed"));
}
