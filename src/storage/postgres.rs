//! PostgreSQL implementation of the order database.
//!
//! Product and order rows are read `FOR UPDATE`, and every transaction sets
//! a local `lock_timeout` so a stuck competitor surfaces as a retryable
//! lock error rather than an indefinite wait.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tracing::info;

use super::sql::postgres::Postgres;
use super::sql::SqlOrderDatabase;
use crate::config::StorageConfig;
use crate::interfaces::Result;

/// PostgreSQL order database.
pub type PostgresOrderDatabase = SqlOrderDatabase<Postgres>;

impl SqlOrderDatabase<Postgres> {
    pub async fn connect(config: &StorageConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(&config.postgres.uri)
            .await?;
        info!("Connected to PostgreSQL");

        Ok(Self::new(pool, config.lock_timeout_ms))
    }

    /// Apply pending schema migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations/postgres").run(self.pool()).await?;
        Ok(())
    }
}
