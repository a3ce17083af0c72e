use std::sync::Arc;

use axum::{routing::get, Router};
use shelf_db::repositories::{ProductRepository, SqlProductRepository};
use shelf_db::DbPool;
use tower_http::trace::TraceLayer;

use crate::{health, products};

/// Full HTTP surface backed by the SQL product store.
pub fn router(db_pool: DbPool) -> Router {
    let products: Arc<dyn ProductRepository> =
        Arc::new(SqlProductRepository::new(db_pool.clone()));

    catalog_router(products).merge(health::router(db_pool)).layer(TraceLayer::new_for_http())
}

/// Greeting and product routes over any repository implementation.
pub fn catalog_router(products: Arc<dyn ProductRepository>) -> Router {
    Router::new().route("/", get(hello)).merge(products::router(products))
}

async fn hello() -> &'static str {
    "hello"
}
