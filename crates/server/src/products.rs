//! Product catalog routes.
//!
//! - `GET    /products`       list, optionally `?max_price=<number>`
//! - `GET    /products/{id}`  fetch one
//! - `POST   /products`       create
//! - `PATCH  /products/{id}`  partial update
//! - `DELETE /products/{id}`  remove
//!
//! Bodies are read as raw bytes and decoded into a [`ProductCandidate`] so
//! that malformed or mistyped payloads answer 422 with itemized violations,
//! and so that PATCH can answer 404 before the body is looked at.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use shelf_core::{CreateProductInput, Product, ProductCandidate, ProductId, UpdateProductInput};
use shelf_db::repositories::ProductRepository;
use tracing::info;

use crate::error::ApiError;

#[derive(Clone)]
pub struct CatalogState {
    products: Arc<dyn ProductRepository>,
}

pub fn router(products: Arc<dyn ProductRepository>) -> Router {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/{id}",
            get(get_product).patch(update_product).delete(delete_product),
        )
        .with_state(CatalogState { products })
}

/// First `max_price` pair wins. Decoding into pairs never rejects a request,
/// so repeated or odd keys still reach the handler.
fn max_price_param(pairs: &[(String, String)]) -> Option<&str> {
    pairs.iter().find(|(key, _)| key == "max_price").map(|(_, value)| value.as_str())
}

/// Unparsable or non-finite values mean "no filter".
fn parse_max_price(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|value| value.trim().parse::<f64>().ok()).filter(|value| value.is_finite())
}

fn parse_id(raw_id: &str) -> Result<ProductId, ApiError> {
    raw_id.parse::<ProductId>().map_err(|_| ApiError::not_found(raw_id))
}

async fn list_products(
    State(state): State<CatalogState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let max_price = parse_max_price(max_price_param(&pairs));
    let products = state.products.list(max_price).await?;
    Ok(Json(products))
}

async fn get_product(
    State(state): State<CatalogState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let id = parse_id(&raw_id)?;
    match state.products.find_by_id(id).await? {
        Some(product) => Ok(Json(product)),
        None => Err(ApiError::not_found(&raw_id)),
    }
}

async fn create_product(
    State(state): State<CatalogState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let input = CreateProductInput::try_from(ProductCandidate::from_json_slice(&body)?)?;
    let product = state.products.create(input).await?;

    info!(
        event_name = "catalog.product.created",
        product_id = %product.id,
        "product created"
    );

    Ok((StatusCode::CREATED, Json(product)))
}

async fn update_product(
    State(state): State<CatalogState>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&raw_id)?;
    if state.products.find_by_id(id).await?.is_none() {
        return Err(ApiError::not_found(&raw_id));
    }

    let changes = UpdateProductInput::try_from(ProductCandidate::from_json_slice(&body)?)?;

    // The row can vanish between the check above and this write.
    if !state.products.update(id, changes).await? {
        return Err(ApiError::not_found(&raw_id));
    }

    info!(event_name = "catalog.product.updated", product_id = %id, "product updated");
    Ok(StatusCode::OK)
}

async fn delete_product(
    State(state): State<CatalogState>,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&raw_id)?;
    match state.products.delete(id).await? {
        0 => Err(ApiError::not_found(&raw_id)),
        _ => {
            info!(event_name = "catalog.product.deleted", product_id = %id, "product deleted");
            Ok(StatusCode::NO_CONTENT)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use shelf_core::{CreateProductInput, Product, ProductId, UpdateProductInput};
    use shelf_db::repositories::{InMemoryProductRepository, ProductRepository, RepositoryError};
    use shelf_db::{connect_with_settings, migrations, DbPool};
    use tower::ServiceExt;

    use super::{max_price_param, parse_max_price};

    async fn setup() -> (DbPool, Router) {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        (pool.clone(), crate::routes::router(pool))
    }

    async fn insert(pool: &DbPool, name: &str, price: f64) -> i64 {
        sqlx::query("INSERT INTO products (name, price) VALUES (?, ?)")
            .bind(name)
            .bind(price)
            .execute(pool)
            .await
            .expect("insert product")
            .last_insert_rowid()
    }

    async fn row_count(pool: &DbPool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(pool)
            .await
            .expect("count products")
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Vec<u8>) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("build request");

        let response = app.clone().oneshot(request).await.expect("route request");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("read body");
        (status, bytes.to_vec())
    }

    fn json_body(bytes: &[u8]) -> Value {
        serde_json::from_slice(bytes).expect("response should be JSON")
    }

    fn error_messages(bytes: &[u8]) -> Vec<(String, String)> {
        json_body(bytes)["errors"]
            .as_array()
            .expect("errors array")
            .iter()
            .map(|item| {
                (
                    item["field"].as_str().unwrap_or_default().to_string(),
                    item["message"].as_str().unwrap_or_default().to_string(),
                )
            })
            .collect()
    }

    #[test]
    fn max_price_parsing_ignores_garbage() {
        assert_eq!(parse_max_price(Some("20")), Some(20.0));
        assert_eq!(parse_max_price(Some("19.99")), Some(19.99));
        assert_eq!(parse_max_price(Some("20;DROP TABLE products")), None);
        assert_eq!(parse_max_price(Some("NaN")), None);
        assert_eq!(parse_max_price(Some("inf")), None);
        assert_eq!(parse_max_price(Some("")), None);
        assert_eq!(parse_max_price(None), None);
    }

    #[test]
    fn first_max_price_pair_is_used() {
        let pairs = vec![
            ("sort".to_string(), "name".to_string()),
            ("max_price".to_string(), "20".to_string()),
            ("max_price".to_string(), "30".to_string()),
        ];

        assert_eq!(max_price_param(&pairs), Some("20"));
        assert_eq!(max_price_param(&[]), None);
    }

    #[tokio::test]
    async fn root_says_hello() {
        let (_pool, app) = setup().await;

        let (status, body) = send(&app, "GET", "/", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"hello");
    }

    #[tokio::test]
    async fn list_returns_all_products_with_fields() {
        let (pool, app) = setup().await;
        insert(&pool, "laptop", 1500.0).await;
        insert(&pool, "socks", 5.95).await;

        let (status, body) = send(&app, "GET", "/products", None).await;
        let items = json_body(&body);
        let items = items.as_array().expect("array body");

        assert_eq!(status, StatusCode::OK);
        assert_eq!(items.len(), 2);
        for item in items {
            assert!(item["id"].is_i64());
            assert!(item["name"].is_string());
            assert!(item["price"].is_number());
        }
    }

    #[tokio::test]
    async fn list_on_empty_table_is_an_empty_array() {
        let (_pool, app) = setup().await;

        let (status, body) = send(&app, "GET", "/products", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body), json!([]));
    }

    #[tokio::test]
    async fn list_applies_max_price_filter() {
        let (pool, app) = setup().await;
        insert(&pool, "laptop", 1500.0).await;
        insert(&pool, "socks", 5.95).await;
        insert(&pool, "usb fan", 19.99).await;

        let (status, body) = send(&app, "GET", "/products?max_price=20", None).await;
        let names: Vec<String> = json_body(&body)
            .as_array()
            .expect("array body")
            .iter()
            .map(|item| item["name"].as_str().unwrap_or_default().to_string())
            .collect();

        assert_eq!(status, StatusCode::OK);
        assert_eq!(names, vec!["socks".to_string(), "usb fan".to_string()]);
    }

    #[tokio::test]
    async fn injected_max_price_is_treated_as_unparsable() {
        let (pool, app) = setup().await;
        insert(&pool, "laptop", 1500.0).await;
        insert(&pool, "socks", 5.95).await;
        insert(&pool, "usb fan", 19.99).await;

        let (status, body) =
            send(&app, "GET", "/products?max_price=20;DROP%20TABLE%20products", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body).as_array().map(Vec::len), Some(3));
        assert_eq!(row_count(&pool).await, 3);
    }

    #[tokio::test]
    async fn repeated_or_undecodable_max_price_never_fails_the_request() {
        let (pool, app) = setup().await;
        insert(&pool, "laptop", 1500.0).await;
        insert(&pool, "socks", 5.95).await;
        insert(&pool, "usb fan", 19.99).await;

        let (status, body) =
            send(&app, "GET", "/products?max_price=20&max_price=30", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body).as_array().map(Vec::len), Some(2));

        let (status, body) = send(&app, "GET", "/products?max_price=%ZZ&max_price", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body).as_array().map(Vec::len), Some(3));
    }

    #[tokio::test]
    async fn get_returns_stored_product() {
        let (pool, app) = setup().await;
        let id = insert(&pool, "laptop", 999.99).await;

        let (status, body) = send(&app, "GET", &format!("/products/{id}"), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body), json!({ "id": id, "name": "laptop", "price": 999.99 }));
    }

    #[tokio::test]
    async fn get_missing_product_is_404_with_empty_body() {
        let (_pool, app) = setup().await;

        for uri in ["/products/999999", "/products/-1", "/products/abc", "/products/1%3BDROP"] {
            let (status, body) = send(&app, "GET", uri, None).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "uri {uri}");
            assert!(body.is_empty(), "uri {uri}");
        }
    }

    #[tokio::test]
    async fn create_then_get_round_trips_fields() {
        let (_pool, app) = setup().await;

        let (status, body) =
            send(&app, "POST", "/products", Some(json!({ "name": "computer", "price": 500 })))
                .await;
        let created = json_body(&body);

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["name"], "computer");
        assert_eq!(created["price"], 500.0);
        let id = created["id"].as_i64().expect("assigned id");

        let (status, body) = send(&app, "GET", &format!("/products/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body), created);
    }

    #[tokio::test]
    async fn create_rejects_empty_name() {
        let (pool, app) = setup().await;

        let (status, body) =
            send(&app, "POST", "/products", Some(json!({ "name": "", "price": 18 }))).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(error_messages(&body)
            .iter()
            .any(|(field, message)| field == "name" && message.contains("empty")));
        assert_eq!(row_count(&pool).await, 0);
    }

    #[tokio::test]
    async fn create_rejects_long_name() {
        let (_pool, app) = setup().await;

        let payload = json!({ "name": "a".repeat(200), "price": 18 });
        let (status, body) = send(&app, "POST", "/products", Some(payload)).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(error_messages(&body).iter().any(|(field, message)| field == "name"
            && message.contains("must be less than or equal to 50 characters long")));
    }

    #[tokio::test]
    async fn create_rejects_missing_and_invalid_prices() {
        let (_pool, app) = setup().await;

        let cases = [
            (json!({ "name": "test" }), "required"),
            (json!({ "name": "test", "price": -1 }), "must be greater than or equal to 0"),
            (json!({ "name": "test", "price": "notanumber" }), "must be a number"),
        ];

        for (payload, expected) in cases {
            let (status, body) = send(&app, "POST", "/products", Some(payload)).await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "expected 422 for {expected}");
            assert!(
                error_messages(&body)
                    .iter()
                    .any(|(field, message)| field == "price" && message.contains(expected)),
                "expected price violation containing `{expected}`"
            );
        }
    }

    #[tokio::test]
    async fn create_rejects_nul_characters_in_name() {
        let (pool, app) = setup().await;

        let (status, body) =
            send(&app, "POST", "/products", Some(json!({ "name": "\u{0}socks", "price": 1 })))
                .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(error_messages(&body).iter().any(|(field, _)| field == "name"));
        assert_eq!(row_count(&pool).await, 0);
    }

    #[tokio::test]
    async fn create_rejects_malformed_json() {
        let (_pool, app) = setup().await;

        let request = Request::builder()
            .method("POST")
            .uri("/products")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"name\": "))
            .expect("build request");
        let response = app.oneshot(request).await.expect("route request");

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn patch_updates_only_supplied_fields() {
        let (pool, app) = setup().await;
        let id = insert(&pool, "laptop", 999.99).await;

        let (status, body) =
            send(&app, "PATCH", &format!("/products/{id}"), Some(json!({ "name": "testupdate" })))
                .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());
        let (name, price): (String, f64) =
            sqlx::query_as("SELECT name, price FROM products WHERE id = ?")
                .bind(id)
                .fetch_one(&pool)
                .await
                .expect("fetch updated row");
        assert_eq!(name, "testupdate");
        assert_eq!(price, 999.99);
    }

    #[tokio::test]
    async fn patch_ignores_fields_outside_the_allow_list() {
        let (pool, app) = setup().await;
        let id = insert(&pool, "laptop", 999.99).await;

        let payload = json!({ "id": 4242, "price": 10, "stock": 3 });
        let (status, _) = send(&app, "PATCH", &format!("/products/{id}"), Some(payload)).await;

        assert_eq!(status, StatusCode::OK);
        let (status, body) = send(&app, "GET", &format!("/products/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body), json!({ "id": id, "name": "laptop", "price": 10.0 }));
    }

    #[tokio::test]
    async fn patch_rejects_invalid_fields() {
        let (pool, app) = setup().await;
        let id = insert(&pool, "laptop", 999.99).await;

        let (status, body) = send(
            &app,
            "PATCH",
            &format!("/products/{id}"),
            Some(json!({ "name": "", "price": -1 })),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let messages = error_messages(&body);
        assert!(messages
            .iter()
            .any(|(field, message)| field == "name" && message.contains("empty")));
        assert!(messages.iter().any(|(field, message)| field == "price"
            && message.contains("must be greater than or equal to 0")));
    }

    #[tokio::test]
    async fn patch_missing_product_is_404_even_with_invalid_body() {
        let (_pool, app) = setup().await;

        let (status, body) =
            send(&app, "PATCH", "/products/99999", Some(json!({ "name": "", "price": -1 }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.is_empty());

        let (status, body) = send(&app, "PATCH", "/products/99999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn delete_twice_returns_204_then_404() {
        let (pool, app) = setup().await;
        let id = insert(&pool, "laptop", 999.99).await;

        let (first, first_body) = send(&app, "DELETE", &format!("/products/{id}"), None).await;
        let (second, second_body) = send(&app, "DELETE", &format!("/products/{id}"), None).await;

        assert_eq!(first, StatusCode::NO_CONTENT);
        assert!(first_body.is_empty());
        assert_eq!(second, StatusCode::NOT_FOUND);
        assert!(second_body.is_empty());
        assert_eq!(row_count(&pool).await, 0);
    }

    #[tokio::test]
    async fn store_failure_is_a_generic_500() {
        let (pool, app) = setup().await;
        pool.close().await;

        let requests = [
            ("GET", "/products", None),
            ("GET", "/products/1", None),
            ("POST", "/products", Some(json!({ "name": "socks", "price": 5.95 }))),
            ("PATCH", "/products/1", Some(json!({ "price": 2 }))),
            ("DELETE", "/products/1", None),
        ];
        for (method, uri, payload) in requests {
            let (status, body) = send(&app, method, uri, payload).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{method} {uri}");
            assert_eq!(body, b"something wrong happened", "{method} {uri}");
        }
    }

    #[tokio::test]
    async fn catalog_router_works_against_in_memory_repository() {
        let app = super::router(Arc::new(InMemoryProductRepository::default()));

        let (status, body) =
            send(&app, "POST", "/products", Some(json!({ "name": "socks", "price": 5.95 }))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json_body(&body)["id"], 1);

        let (status, body) = send(&app, "GET", "/products?max_price=5", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body), json!([]));

        let (status, _) = send(&app, "DELETE", "/products/1", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    /// Loses every row between the existence check and the write.
    struct VanishingRepository(InMemoryProductRepository);

    #[async_trait::async_trait]
    impl ProductRepository for VanishingRepository {
        async fn list(&self, max_price: Option<f64>) -> Result<Vec<Product>, RepositoryError> {
            self.0.list(max_price).await
        }

        async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
            self.0.find_by_id(id).await
        }

        async fn create(&self, input: CreateProductInput) -> Result<Product, RepositoryError> {
            self.0.create(input).await
        }

        async fn update(
            &self,
            id: ProductId,
            changes: UpdateProductInput,
        ) -> Result<bool, RepositoryError> {
            self.0.delete(id).await?;
            self.0.update(id, changes).await
        }

        async fn delete(&self, id: ProductId) -> Result<u64, RepositoryError> {
            self.0.delete(id).await
        }
    }

    #[tokio::test]
    async fn patch_reports_404_when_row_vanishes_before_the_write() {
        let repository = VanishingRepository(InMemoryProductRepository::default());
        let app = super::router(Arc::new(repository));

        let (status, _) =
            send(&app, "POST", "/products", Some(json!({ "name": "socks", "price": 5.95 }))).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) =
            send(&app, "PATCH", "/products/1", Some(json!({ "price": 6.5 }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.is_empty());

        let (status, _) = send(&app, "GET", "/products/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
