use axum::Router;
use shelf_core::config::{AppConfig, StartupMode};
use shelf_db::{connect_lazy_with_settings, connect_with_settings, migrations, DbPool};
use thiserror::Error;
use tracing::{info, warn};

use crate::routes;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
}

impl Application {
    pub fn router(&self) -> Router {
        routes::router(self.db_pool.clone())
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

/// Connects the store and applies pending migrations.
///
/// In [`StartupMode::Degraded`] a store that cannot be reached is logged and
/// replaced by a lazy pool, so the listener still comes up and store-backed
/// routes answer 500 until the store is available.
pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        startup_mode = ?config.database.startup,
        "starting application bootstrap"
    );

    let connected = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await;

    let db_pool = match (connected, config.database.startup) {
        (Ok(pool), _) => {
            info!(
                event_name = "system.bootstrap.database_connected",
                correlation_id = "bootstrap",
                "database connection established"
            );
            migrations::run_pending(&pool).await.map_err(BootstrapError::Migration)?;
            info!(
                event_name = "system.bootstrap.migrations_applied",
                correlation_id = "bootstrap",
                "database migrations applied"
            );
            pool
        }
        (Err(error), StartupMode::FailFast) => return Err(BootstrapError::DatabaseConnect(error)),
        (Err(error), StartupMode::Degraded) => {
            warn!(
                event_name = "system.bootstrap.database_unavailable",
                correlation_id = "bootstrap",
                error = %error,
                "database unreachable; serving in degraded mode without migrations"
            );
            connect_lazy_with_settings(
                &config.database.url,
                config.database.max_connections,
                config.database.timeout_secs,
            )
            .map_err(BootstrapError::DatabaseConnect)?
        }
    };

    Ok(Application { config, db_pool })
}
