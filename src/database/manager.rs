use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::info;

use crate::config;

/// Errors from DatabaseManager
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

static POOL: OnceCell<PgPool> = OnceCell::const_new();

/// Centralized connection handling for the application database.
///
/// The pool is created lazily on first use, so an unreachable store does
/// not prevent the server from starting; requests that need the database
/// surface the error when they run.
pub struct DatabaseManager;

impl DatabaseManager {
    /// Get the shared connection pool, creating it on first call.
    pub async fn pool() -> Result<PgPool, DatabaseError> {
        POOL.get_or_try_init(Self::connect).await.cloned()
    }

    async fn connect() -> Result<PgPool, DatabaseError> {
        let url = std::env::var("DATABASE_URL")
            .map_err(|_| DatabaseError::ConfigMissing("DATABASE_URL"))?;

        let db_config = &config::config().database;
        let pool = PgPoolOptions::new()
            .max_connections(db_config.max_connections)
            .acquire_timeout(Duration::from_secs(db_config.connection_timeout_secs))
            .connect(&url)
            .await?;

        info!("Created database pool");
        Ok(pool)
    }

    /// Run pending migrations, then seed the first account if needed.
    ///
    /// Failure here is deliberately non-fatal for the caller: the server
    /// still serves its health endpoint and reports the store as degraded.
    pub async fn prepare() -> Result<(), DatabaseError> {
        let pool = Self::pool().await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| DatabaseError::MigrationError(e.to_string()))?;
        info!("Database migrations complete");

        crate::database::bootstrap::ensure_seed(&pool).await
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check() -> Result<(), DatabaseError> {
        let pool = Self::pool().await?;
        sqlx::query("SELECT 1").execute(&pool).await?;
        Ok(())
    }
}
