use std::collections::BTreeMap;

use tokio::sync::RwLock;

use shelf_core::domain::product::{CreateProductInput, Product, ProductId, UpdateProductInput};

use super::{ProductRepository, RepositoryError};

/// Store-free backend with the same contract as [`super::SqlProductRepository`].
#[derive(Default)]
pub struct InMemoryProductRepository {
    state: RwLock<InMemoryCatalog>,
}

#[derive(Default)]
struct InMemoryCatalog {
    last_id: i64,
    products: BTreeMap<ProductId, Product>,
}

#[async_trait::async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn list(&self, max_price: Option<f64>) -> Result<Vec<Product>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .products
            .values()
            .filter(|product| max_price.map_or(true, |max| product.price <= max))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.products.get(&id).cloned())
    }

    async fn create(&self, input: CreateProductInput) -> Result<Product, RepositoryError> {
        let mut state = self.state.write().await;
        state.last_id += 1;
        let product = input.into_product(ProductId(state.last_id));
        state.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn update(
        &self,
        id: ProductId,
        changes: UpdateProductInput,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.state.write().await;
        match state.products.get_mut(&id) {
            Some(product) => {
                changes.apply_to(product);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: ProductId) -> Result<u64, RepositoryError> {
        let mut state = self.state.write().await;
        Ok(u64::from(state.products.remove(&id).is_some()))
    }
}
