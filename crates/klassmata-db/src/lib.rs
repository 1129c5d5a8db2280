//! # KlassMata DB
//!
//! Persistence for schools, users and teacher invites.
//!
//! - [`store`]: the [`InviteStore`] trait every backend implements
//! - [`postgres`]: [`PgInviteStore`], backed by SQLx and PostgreSQL
//! - [`memory`]: [`MemoryInviteStore`], an in-process store with the same
//!   semantics, used by tests and `STORE_BACKEND=memory`
//! - [`error`]: [`StoreError`]
//!
//! # Example
//!
//! ```ignore
//! use klassmata_db::{PgInviteStore, init_db_pool, run_migrations};
//!
//! let pool = init_db_pool(&database_url).await?;
//! run_migrations(&pool).await?;
//! let store = PgInviteStore::new(pool);
//! ```

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

use sqlx::postgres::PgPoolOptions;

pub use error::StoreError;
pub use memory::MemoryInviteStore;
pub use postgres::PgInviteStore;
pub use store::{InviteStore, NewInvite};

// Re-export PgPool for convenience
pub use sqlx::PgPool;

/// Migrations embedded from the workspace `migrations/` directory.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

/// Opens a PostgreSQL connection pool.
///
/// This function should typically be called once during application startup.
/// The returned pool is cheaply cloneable.
pub async fn init_db_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

/// Applies any pending migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}
