//! Transactional order database interface.

use async_trait::async_trait;

use super::{OrderStore, ProductCatalog};
use crate::model::{OrderDetails, OrderId, OrderPage, OrderQuery, OrderScope};

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid value in column {column}: {reason}")]
    InvalidData { column: &'static str, reason: String },

    #[error("Storage busy: {0}")]
    Busy(String),

    #[error("Unsupported storage type: {0}")]
    Unsupported(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// PostgreSQL SQLSTATE codes worth retrying: serialization_failure,
/// deadlock_detected, lock_not_available, query_canceled (lock/statement timeout).
const POSTGRES_TRANSIENT_CODES: &[&str] = &["40001", "40P01", "55P03", "57014"];

/// SQLite extended result codes for SQLITE_BUSY and SQLITE_LOCKED.
const SQLITE_TRANSIENT_CODES: &[&str] = &["5", "6", "261", "262", "517", "518", "773"];

impl StorageError {
    /// Create an error for a column value that does not fit the model.
    pub fn invalid(column: &'static str, reason: impl ToString) -> Self {
        StorageError::InvalidData {
            column,
            reason: reason.to_string(),
        }
    }

    /// Whether retrying the whole operation may succeed.
    ///
    /// True for lock-wait timeouts, deadlocks, serialization failures,
    /// SQLite busy/locked results and connection pool exhaustion.
    pub fn is_transient(&self) -> bool {
        match self {
            StorageError::Busy(_) => true,
            StorageError::Database(sqlx::Error::PoolTimedOut) => true,
            StorageError::Database(sqlx::Error::Database(db)) => db
                .code()
                .map(|code| {
                    POSTGRES_TRANSIENT_CODES.contains(&code.as_ref())
                        || SQLITE_TRANSIENT_CODES.contains(&code.as_ref())
                })
                .unwrap_or(false),
            _ => false,
        }
    }
}

/// A unit of work over the catalog and the order store.
///
/// Every read and write made through the handle belongs to one database
/// transaction. Dropping the handle without calling [`commit`] rolls the
/// transaction back, so an early return or `?` never leaks partial writes.
///
/// [`commit`]: StoreTransaction::commit
#[async_trait]
pub trait StoreTransaction: ProductCatalog + OrderStore {
    /// Make every change made through this handle durable.
    async fn commit(self: Box<Self>) -> Result<()>;
}

/// Entry point to order storage.
///
/// Implementations:
/// - `SqliteOrderDatabase`: SQLite storage
/// - `PostgresOrderDatabase`: PostgreSQL storage
/// - `MockOrderDatabase`: in-memory storage
#[async_trait]
pub trait OrderDatabase: Send + Sync {
    /// Open a transaction. May wait for a pooled connection.
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>>;

    /// Order with customer contact and product display metadata.
    async fn find_order(
        &self,
        order_id: OrderId,
        scope: OrderScope,
    ) -> Result<Option<OrderDetails>>;

    /// One page of orders, newest first.
    async fn list_orders(&self, query: &OrderQuery) -> Result<OrderPage>;
}
