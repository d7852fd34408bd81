//! Storage implementations.
//!
//! - `sqlite`: SQLite via sqlx (default feature)
//! - `postgres`: PostgreSQL via sqlx (`postgres` feature)
//! - `mock`: in-memory, always available

use std::sync::Arc;

use tracing::{error, info};

use crate::config::{StorageConfig, StorageType};

pub mod mock;
pub mod schema;
pub mod sql;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use crate::interfaces::{
    OrderDatabase, OrderStore, ProductCatalog, Result, StorageError, StoreTransaction,
};
pub use mock::MockOrderDatabase;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteOrderDatabase;

#[cfg(feature = "postgres")]
pub use postgres::PostgresOrderDatabase;

/// Initialize storage based on configuration.
///
/// Connects to the configured backend and applies pending migrations.
pub async fn init_storage(config: &StorageConfig) -> Result<Arc<dyn OrderDatabase>> {
    match config.storage_type {
        #[cfg(feature = "sqlite")]
        StorageType::Sqlite => {
            info!(path = %config.sqlite.path, "Storage: sqlite");
            let db = SqliteOrderDatabase::connect(config).await?;
            db.migrate().await?;
            Ok(Arc::new(db))
        }
        #[cfg(not(feature = "sqlite"))]
        StorageType::Sqlite => {
            error!("SQLite storage requested but 'sqlite' feature is not enabled");
            Err(StorageError::Unsupported("sqlite".to_string()))
        }
        #[cfg(feature = "postgres")]
        StorageType::Postgres => {
            info!("Storage: postgres");
            let db = PostgresOrderDatabase::connect(config).await?;
            db.migrate().await?;
            Ok(Arc::new(db))
        }
        #[cfg(not(feature = "postgres"))]
        StorageType::Postgres => {
            error!("PostgreSQL storage requested but 'postgres' feature is not enabled");
            Err(StorageError::Unsupported("postgres".to_string()))
        }
        StorageType::Memory => {
            info!("Storage: memory (data is lost on exit)");
            Ok(Arc::new(MockOrderDatabase::new()))
        }
    }
}
