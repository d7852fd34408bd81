//! SQLite implementation of the order database.
//!
//! SQLite has no row locks: the first write of a transaction takes the
//! database-wide write lock. Transactions therefore start with a no-op write
//! on the row they are about to read, so competing checkouts queue on
//! `busy_timeout` instead of reading stale stock.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use tracing::info;

use super::sql::sqlite::Sqlite;
use super::sql::SqlOrderDatabase;
use crate::config::StorageConfig;
use crate::interfaces::Result;

/// Path value selecting a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// SQLite order database.
pub type SqliteOrderDatabase = SqlOrderDatabase<Sqlite>;

impl SqlOrderDatabase<Sqlite> {
    /// Open (creating if needed) the configured database file.
    ///
    /// `:memory:` opens a private in-memory database on a single pooled
    /// connection that is never recycled.
    pub async fn connect(config: &StorageConfig) -> Result<Self> {
        let path = config.sqlite.path.as_str();
        let in_memory = path == IN_MEMORY;

        let options = if in_memory {
            SqliteConnectOptions::from_str("sqlite::memory:")?
        } else {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
        };
        let options = options
            .foreign_keys(true)
            .busy_timeout(Duration::from_millis(config.lock_timeout_ms));

        let mut pool_options = SqlitePoolOptions::new()
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs));
        pool_options = if in_memory {
            pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            pool_options.max_connections(config.max_connections)
        };

        let pool = pool_options.connect_with(options).await?;
        info!(path, "Connected to SQLite");

        Ok(Self::new(pool, config.lock_timeout_ms))
    }

    /// Apply pending schema migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations/sqlite").run(self.pool()).await?;
        Ok(())
    }
}
