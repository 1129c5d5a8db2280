use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;
use klassmata::klassmata_config::{ServerConfig, StoreBackend};
use klassmata::klassmata_db::{
    InviteStore, MemoryInviteStore, PgInviteStore, init_db_pool, run_migrations,
};
use klassmata::router::init_router;
use klassmata::state::AppState;
use klassmata_observability::{init_metrics, init_tracing, shutdown_tracer};
use tracing::{info, warn};

async fn open_store(backend: StoreBackend) -> anyhow::Result<Arc<dyn InviteStore>> {
    match backend {
        StoreBackend::Postgres => {
            let database_url =
                std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
            let pool = init_db_pool(&database_url)
                .await
                .context("Failed to connect to database")?;
            run_migrations(&pool)
                .await
                .context("Failed to run migrations")?;
            info!("Connected to PostgreSQL");
            Ok(Arc::new(PgInviteStore::new(pool)))
        }
        StoreBackend::Memory => {
            warn!("Using in-memory store, data is lost on restart");
            Ok(Arc::new(MemoryInviteStore::new()))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    init_tracing();
    let metrics = init_metrics();

    let server_config = ServerConfig::from_env();
    let store = open_store(server_config.store_backend).await?;
    let state = AppState::from_env(store);
    let app = init_router(state, metrics);

    let listener = tokio::net::TcpListener::bind(&server_config.addr)
        .await
        .with_context(|| format!("Failed to bind {}", server_config.addr))?;

    info!(addr = %server_config.addr, "Server running");
    info!("Swagger UI available at /swagger-ui, Scalar at /scalar");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    shutdown_tracer().await;
    Ok(())
}
