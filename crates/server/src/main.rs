mod args;
mod bootstrap;
mod error;
mod health;
mod products;
mod routes;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use shelf_core::config::AppConfig;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

fn init_logging(config: &AppConfig) {
    use shelf_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Logging depends on config, so config is loaded first.
    let options = args::ServerArgs::parse().into_load_options();
    let config = AppConfig::load(options)?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;
    let address = app.config.listen_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        "shelf-server listening"
    );

    let shutdown = Arc::new(Notify::new());
    let signal = shutdown.clone();
    let server = axum::serve(listener, app.router())
        .with_graceful_shutdown(async move { signal.notified().await });
    let mut server = tokio::spawn(async move { server.await });

    tokio::select! {
        result = &mut server => {
            result??;
            app.db_pool.close().await;
            return Ok(());
        }
        signal = tokio::signal::ctrl_c() => signal?,
    }

    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        grace_secs = app.config.server.graceful_shutdown_secs,
        "shelf-server stopping"
    );
    shutdown.notify_one();

    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    match drain(server, grace).await {
        Drained::Clean => {}
        Drained::Failed(error) => tracing::error!(
            event_name = "system.server.error",
            correlation_id = "shutdown",
            error = %error,
            "server exited with an error while draining"
        ),
        Drained::TimedOut => tracing::warn!(
            event_name = "system.server.shutdown_timeout",
            correlation_id = "shutdown",
            "in-flight requests did not finish within the grace period"
        ),
    }

    app.db_pool.close().await;
    tracing::info!(
        event_name = "system.server.stopped",
        correlation_id = "shutdown",
        "shelf-server stopped"
    );

    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum Drained {
    Clean,
    Failed(String),
    TimedOut,
}

/// Waits up to `grace` for the server task; aborts it on timeout.
async fn drain(mut server: JoinHandle<std::io::Result<()>>, grace: Duration) -> Drained {
    match tokio::time::timeout(grace, &mut server).await {
        Ok(Ok(Ok(()))) => Drained::Clean,
        Ok(Ok(Err(error))) => Drained::Failed(error.to_string()),
        Ok(Err(error)) => Drained::Failed(error.to_string()),
        Err(_) => {
            server.abort();
            Drained::TimedOut
        }
    }
}
