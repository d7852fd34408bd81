//! Unified SQL OrderDatabase implementation.
//!
//! Uses a macro to generate implementations for each SQL backend,
//! eliminating code duplication while maintaining type safety.

use std::marker::PhantomData;

use super::SqlDatabase;

/// SQL-based implementation of OrderDatabase.
///
/// This generic implementation works with any SQL database that implements
/// the `SqlDatabase` trait (PostgreSQL, SQLite). Connecting and migrating are
/// backend-specific and live next to each backend.
pub struct SqlOrderDatabase<DB: SqlDatabase> {
    pool: sqlx::Pool<DB::Db>,
    lock_timeout_ms: u64,
    _marker: PhantomData<DB>,
}

impl<DB: SqlDatabase> SqlOrderDatabase<DB> {
    /// Create an order database over an existing pool.
    ///
    /// `lock_timeout_ms` is applied per transaction on backends that support
    /// it; SQLite takes its busy timeout from the connect options instead.
    pub fn new(pool: sqlx::Pool<DB::Db>, lock_timeout_ms: u64) -> Self {
        Self {
            pool,
            lock_timeout_ms,
            _marker: PhantomData,
        }
    }

    /// Get the underlying pool.
    pub fn pool(&self) -> &sqlx::Pool<DB::Db> {
        &self.pool
    }
}

/// Macro to implement OrderDatabase for a specific SQL backend.
macro_rules! impl_order_database {
    ($db_type:ty, $feature:literal) => {
        #[cfg(feature = $feature)]
        impl SqlOrderDatabase<$db_type> {
            /// Load line items for already-fetched order rows.
            async fn with_items(
                conn: &mut <<$db_type as SqlDatabase>::Db as sqlx::Database>::Connection,
                orders: Vec<crate::storage::sql::rows::OrderWithCustomerRow>,
            ) -> crate::interfaces::Result<Vec<crate::model::OrderDetails>> {
                use crate::storage::sql::rows::{assemble, LineItemDetailsRow};
                use crate::storage::sql::statements;

                if orders.is_empty() {
                    return Ok(Vec::new());
                }

                let ids: Vec<crate::model::OrderId> =
                    orders.iter().map(|row| row.order.id).collect();
                let sql = <$db_type>::build_select(statements::select_line_item_details(&ids));
                let items = sqlx::query_as::<_, LineItemDetailsRow>(&sql)
                    .fetch_all(&mut *conn)
                    .await?;

                assemble(orders, items)
            }
        }

        #[cfg(feature = $feature)]
        #[async_trait::async_trait]
        impl crate::interfaces::OrderDatabase for SqlOrderDatabase<$db_type> {
            async fn begin(
                &self,
            ) -> crate::interfaces::Result<Box<dyn crate::interfaces::StoreTransaction>> {
                let mut tx = self.pool.begin().await?;

                if let Some(sql) = <$db_type>::lock_timeout_statement(self.lock_timeout_ms) {
                    sqlx::query(&sql).execute(&mut *tx).await?;
                }

                Ok(Box::new(super::SqlTransaction::<$db_type>::new(tx)))
            }

            async fn find_order(
                &self,
                order_id: crate::model::OrderId,
                scope: crate::model::OrderScope,
            ) -> crate::interfaces::Result<Option<crate::model::OrderDetails>> {
                use crate::storage::sql::rows::OrderWithCustomerRow;
                use crate::storage::sql::statements;

                let mut conn = self.pool.acquire().await?;

                let stmt = statements::select_order_with_customer(order_id, scope);
                let sql = <$db_type>::build_select(stmt);
                let row = sqlx::query_as::<_, OrderWithCustomerRow>(&sql)
                    .fetch_optional(&mut *conn)
                    .await?;

                match row {
                    Some(row) => Ok(Self::with_items(&mut *conn, vec![row]).await?.pop()),
                    None => Ok(None),
                }
            }

            async fn list_orders(
                &self,
                query: &crate::model::OrderQuery,
            ) -> crate::interfaces::Result<crate::model::OrderPage> {
                use crate::storage::sql::rows::OrderWithCustomerRow;
                use crate::storage::sql::statements;

                // Count and page from one snapshot.
                let mut tx = self.pool.begin().await?;
                if let Some(sql) = <$db_type>::read_snapshot_statement() {
                    sqlx::query(sql).execute(&mut *tx).await?;
                }

                let count = <$db_type>::build_select(statements::count_orders(query));
                let total: i64 = sqlx::query_scalar(&count).fetch_one(&mut *tx).await?;

                let page = <$db_type>::build_select(statements::select_order_page(query));
                let rows = sqlx::query_as::<_, OrderWithCustomerRow>(&page)
                    .fetch_all(&mut *tx)
                    .await?;
                let orders = Self::with_items(&mut *tx, rows).await?;
                tx.commit().await?;

                Ok(crate::model::OrderPage {
                    orders,
                    pagination: crate::model::Pagination::new(
                        query.page,
                        u64::try_from(total).unwrap_or(0),
                    ),
                })
            }
        }
    };
}

// Generate implementations for each SQL backend
impl_order_database!(super::postgres::Postgres, "postgres");
impl_order_database!(super::sqlite::Sqlite, "sqlite");
