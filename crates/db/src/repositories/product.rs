use sqlx::{QueryBuilder, Sqlite};

use shelf_core::domain::product::{CreateProductInput, Product, ProductId, UpdateProductInput};

use super::{ProductRepository, RepositoryError};
use crate::DbPool;

pub struct SqlProductRepository {
    pool: DbPool,
}

impl SqlProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    price: f64,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self { id: ProductId(row.id), name: row.name, price: row.price }
    }
}

#[async_trait::async_trait]
impl ProductRepository for SqlProductRepository {
    async fn list(&self, max_price: Option<f64>) -> Result<Vec<Product>, RepositoryError> {
        let mut query_builder =
            QueryBuilder::<Sqlite>::new("SELECT id, name, price FROM products");
        if let Some(max_price) = max_price {
            query_builder.push(" WHERE price <= ");
            query_builder.push_bind(max_price);
        }
        query_builder.push(" ORDER BY id ASC");

        let rows = query_builder.build_query_as::<ProductRow>().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            "SELECT id, name, price FROM products WHERE id = ?",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    async fn create(&self, input: CreateProductInput) -> Result<Product, RepositoryError> {
        let result = sqlx::query("INSERT INTO products (name, price) VALUES (?, ?)")
            .bind(&input.name)
            .bind(input.price)
            .execute(&self.pool)
            .await?;

        Ok(input.into_product(ProductId(result.last_insert_rowid())))
    }

    async fn update(
        &self,
        id: ProductId,
        changes: UpdateProductInput,
    ) -> Result<bool, RepositoryError> {
        if changes.is_empty() {
            let exists: i64 =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM products WHERE id = ?)")
                    .bind(id.0)
                    .fetch_one(&self.pool)
                    .await?;
            return Ok(exists != 0);
        }

        // Only allow-listed columns ever reach the SET clause.
        let mut query_builder = QueryBuilder::<Sqlite>::new("UPDATE products SET ");
        let mut assignments = query_builder.separated(", ");
        if let Some(name) = changes.name {
            assignments.push("name = ");
            assignments.push_bind_unseparated(name);
        }
        if let Some(price) = changes.price {
            assignments.push("price = ");
            assignments.push_bind_unseparated(price);
        }
        query_builder.push(" WHERE id = ");
        query_builder.push_bind(id.0);

        let result = query_builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: ProductId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
