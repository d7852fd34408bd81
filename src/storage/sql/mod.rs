//! Shared SQL building blocks for the SQLite and PostgreSQL backends.
//!
//! Statements are built once with sea-query and rendered per backend through
//! the `SqlDatabase` trait. The order database and its transaction are
//! generic over the backend; per-backend impls are generated by macros.
//! Result rows decode into backend-neutral row types that convert into the
//! domain model.

mod order_database;
pub mod rows;
pub mod statements;
mod transaction;

use sea_query::{InsertStatement, QueryStatementWriter, SelectStatement, UpdateStatement};

pub use order_database::SqlOrderDatabase;
pub use transaction::SqlTransaction;

/// Trait for SQL database backends.
///
/// This trait abstracts over different SQL databases (PostgreSQL, SQLite)
/// by providing the query building methods and the locking behavior each
/// backend needs.
pub trait SqlDatabase: Send + Sync + 'static {
    /// The sqlx driver.
    type Db: sqlx::Database;

    /// Whether `SELECT … FOR UPDATE` row locks are available.
    const ROW_LOCKS: bool;

    /// Whether a no-op write must precede each locking read to take the
    /// write lock before the row is observed.
    const TOUCH_BEFORE_READ: bool;

    /// Build a SQL query string from a sea-query SELECT statement.
    fn build_select(stmt: SelectStatement) -> String;

    /// Build a SQL query string from a sea-query INSERT statement.
    fn build_insert(stmt: InsertStatement) -> String;

    /// Build a SQL query string from a sea-query UPDATE statement.
    fn build_update(stmt: UpdateStatement) -> String;

    /// Statement run right after `BEGIN` to bound lock waits, if the backend
    /// takes one per transaction.
    fn lock_timeout_statement(_lock_timeout_ms: u64) -> Option<String> {
        None
    }

    /// Statement run right after `BEGIN` for the listing snapshot.
    fn read_snapshot_statement() -> Option<&'static str> {
        None
    }
}

#[cfg(feature = "sqlite")]
pub mod sqlite {
    //! SQLite database backend.

    use sea_query::SqliteQueryBuilder;

    use super::*;

    /// SQLite database marker type.
    pub struct Sqlite;

    impl SqlDatabase for Sqlite {
        type Db = sqlx::Sqlite;

        // SQLite locks the whole database on first write instead.
        const ROW_LOCKS: bool = false;
        const TOUCH_BEFORE_READ: bool = true;

        fn build_select(stmt: SelectStatement) -> String {
            stmt.to_string(SqliteQueryBuilder)
        }

        fn build_insert(stmt: InsertStatement) -> String {
            stmt.to_string(SqliteQueryBuilder)
        }

        fn build_update(stmt: UpdateStatement) -> String {
            stmt.to_string(SqliteQueryBuilder)
        }
    }
}

#[cfg(feature = "postgres")]
pub mod postgres {
    //! PostgreSQL database backend.

    use sea_query::PostgresQueryBuilder;

    use super::*;

    /// PostgreSQL database marker type.
    pub struct Postgres;

    impl SqlDatabase for Postgres {
        type Db = sqlx::Postgres;

        const ROW_LOCKS: bool = true;
        const TOUCH_BEFORE_READ: bool = false;

        fn build_select(stmt: SelectStatement) -> String {
            stmt.to_string(PostgresQueryBuilder)
        }

        fn build_insert(stmt: InsertStatement) -> String {
            stmt.to_string(PostgresQueryBuilder)
        }

        fn build_update(stmt: UpdateStatement) -> String {
            stmt.to_string(PostgresQueryBuilder)
        }

        // SET does not take bind parameters; the value is a plain integer.
        fn lock_timeout_statement(lock_timeout_ms: u64) -> Option<String> {
            Some(format!("SET LOCAL lock_timeout = {lock_timeout_ms}"))
        }

        fn read_snapshot_statement() -> Option<&'static str> {
            Some("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
        }
    }
}
