use crate::connection::DbPool;
use crate::repositories::RepositoryError;

/// Demo catalog used by `shelf seed` and local smoke testing.
const DEMO_PRODUCTS: &[DemoProduct] = &[
    DemoProduct { name: "laptop", price: 1500.0 },
    DemoProduct { name: "socks", price: 5.95 },
    DemoProduct { name: "usb fan", price: 19.99 },
];

struct DemoProduct {
    name: &'static str,
    price: f64,
}

/// Deterministic product fixtures. Loading twice inserts nothing new.
pub struct DemoCatalog;

impl DemoCatalog {
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;
        let mut inserted = 0;

        for product in DEMO_PRODUCTS {
            let result = sqlx::query(
                "INSERT INTO products (name, price)
                 SELECT ?1, ?2
                 WHERE NOT EXISTS (SELECT 1 FROM products WHERE name = ?1)",
            )
            .bind(product.name)
            .bind(product.price)
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;

        Ok(SeedResult {
            inserted,
            products: DEMO_PRODUCTS.iter().map(|product| (product.name, product.price)).collect(),
        })
    }

    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        for product in DEMO_PRODUCTS {
            let present: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM products WHERE name = ?1 AND price = ?2)",
            )
            .bind(product.name)
            .bind(product.price)
            .fetch_one(pool)
            .await?;
            checks.push((product.name, present != 0));
        }

        let all_present = checks.iter().all(|(_, passed)| *passed);
        Ok(VerificationResult { all_present, checks })
    }
}

#[derive(Debug)]
pub struct SeedResult {
    pub inserted: u64,
    pub products: Vec<(&'static str, f64)>,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}
