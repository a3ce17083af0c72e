use async_trait::async_trait;
use thiserror::Error;

use shelf_core::domain::product::{CreateProductInput, Product, ProductId, UpdateProductInput};

pub mod memory;
pub mod product;

pub use memory::InMemoryProductRepository;
pub use product::SqlProductRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// All products ordered by id, optionally limited to `price <= max_price`.
    async fn list(&self, max_price: Option<f64>) -> Result<Vec<Product>, RepositoryError>;

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    async fn create(&self, input: CreateProductInput) -> Result<Product, RepositoryError>;

    /// Returns `false` when no product has `id`.
    async fn update(
        &self,
        id: ProductId,
        changes: UpdateProductInput,
    ) -> Result<bool, RepositoryError>;

    /// Returns the number of rows removed.
    async fn delete(&self, id: ProductId) -> Result<u64, RepositoryError>;
}
