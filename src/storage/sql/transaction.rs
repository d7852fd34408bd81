//! Unified SQL StoreTransaction implementation.

use super::SqlDatabase;

/// An open SQL transaction. Rolled back on drop unless committed.
pub struct SqlTransaction<DB: SqlDatabase> {
    tx: sqlx::Transaction<'static, DB::Db>,
}

impl<DB: SqlDatabase> SqlTransaction<DB> {
    pub(super) fn new(tx: sqlx::Transaction<'static, DB::Db>) -> Self {
        Self { tx }
    }
}

/// Macro to implement the transaction traits for a specific SQL backend.
///
/// Statements are rendered to `String` before the first await so the
/// futures stay `Send`.
macro_rules! impl_store_transaction {
    ($db_type:ty, $feature:literal) => {
        #[cfg(feature = $feature)]
        impl SqlTransaction<$db_type> {
            /// Run a rendered UPDATE and report how many rows it touched.
            async fn execute_update(&mut self, sql: String) -> crate::interfaces::Result<u64> {
                let result = sqlx::query(&sql).execute(&mut *self.tx).await?;
                Ok(result.rows_affected())
            }
        }

        #[cfg(feature = $feature)]
        #[async_trait::async_trait]
        impl crate::interfaces::ProductCatalog for SqlTransaction<$db_type> {
            async fn get_active_by_id(
                &mut self,
                id: crate::model::ProductId,
            ) -> crate::interfaces::Result<Option<crate::model::Product>> {
                use crate::storage::sql::rows::ProductRow;
                use crate::storage::sql::statements;

                if <$db_type>::TOUCH_BEFORE_READ {
                    // Take the write lock before reading so the stock seen stays current.
                    let touch = <$db_type>::build_update(statements::touch_product(id));
                    self.execute_update(touch).await?;
                }

                let sql = <$db_type>::build_select(statements::select_active_product(
                    id,
                    <$db_type>::ROW_LOCKS,
                ));
                let row = sqlx::query_as::<_, ProductRow>(&sql)
                    .fetch_optional(&mut *self.tx)
                    .await?;

                row.map(crate::model::Product::try_from).transpose()
            }

            async fn decrement_stock(
                &mut self,
                id: crate::model::ProductId,
                amount: u32,
            ) -> crate::interfaces::Result<bool> {
                let sql = <$db_type>::build_update(
                    crate::storage::sql::statements::decrement_stock(id, amount),
                );
                Ok(self.execute_update(sql).await? == 1)
            }

            async fn increment_stock(
                &mut self,
                id: crate::model::ProductId,
                amount: u32,
            ) -> crate::interfaces::Result<bool> {
                let sql = <$db_type>::build_update(
                    crate::storage::sql::statements::increment_stock(id, amount),
                );
                Ok(self.execute_update(sql).await? == 1)
            }
        }

        #[cfg(feature = $feature)]
        #[async_trait::async_trait]
        impl crate::interfaces::OrderStore for SqlTransaction<$db_type> {
            async fn insert_order(
                &mut self,
                order: &crate::model::NewOrder,
            ) -> crate::interfaces::Result<crate::model::OrderId> {
                let sql =
                    <$db_type>::build_insert(crate::storage::sql::statements::insert_order(order));
                let id: i64 = sqlx::query_scalar(&sql).fetch_one(&mut *self.tx).await?;
                Ok(id)
            }

            async fn insert_line_items(
                &mut self,
                order_id: crate::model::OrderId,
                items: &[crate::model::NewLineItem],
            ) -> crate::interfaces::Result<()> {
                if items.is_empty() {
                    return Ok(());
                }

                let sql = <$db_type>::build_insert(
                    crate::storage::sql::statements::insert_line_items(order_id, items),
                );
                sqlx::query(&sql).execute(&mut *self.tx).await?;
                Ok(())
            }

            async fn update_status(
                &mut self,
                order_id: crate::model::OrderId,
                update: &crate::model::StatusUpdate,
            ) -> crate::interfaces::Result<bool> {
                let sql = <$db_type>::build_update(
                    crate::storage::sql::statements::update_status(order_id, update),
                );
                Ok(self.execute_update(sql).await? == 1)
            }

            async fn get_by_id(
                &mut self,
                order_id: crate::model::OrderId,
                scope: crate::model::OrderScope,
            ) -> crate::interfaces::Result<Option<crate::model::Order>> {
                use crate::storage::sql::rows::OrderRow;
                use crate::storage::sql::statements;

                if <$db_type>::TOUCH_BEFORE_READ {
                    let touch = <$db_type>::build_update(statements::touch_order(order_id));
                    self.execute_update(touch).await?;
                }

                let sql = <$db_type>::build_select(statements::select_order(
                    order_id,
                    scope,
                    <$db_type>::ROW_LOCKS,
                ));
                let row = sqlx::query_as::<_, OrderRow>(&sql)
                    .fetch_optional(&mut *self.tx)
                    .await?;

                row.map(crate::model::Order::try_from).transpose()
            }

            async fn line_items(
                &mut self,
                order_id: crate::model::OrderId,
            ) -> crate::interfaces::Result<Vec<crate::model::LineItem>> {
                use crate::storage::sql::rows::LineItemRow;

                let sql = <$db_type>::build_select(
                    crate::storage::sql::statements::select_line_items(order_id),
                );
                let rows = sqlx::query_as::<_, LineItemRow>(&sql)
                    .fetch_all(&mut *self.tx)
                    .await?;

                rows.into_iter()
                    .map(crate::model::LineItem::try_from)
                    .collect()
            }
        }

        #[cfg(feature = $feature)]
        #[async_trait::async_trait]
        impl crate::interfaces::StoreTransaction for SqlTransaction<$db_type> {
            async fn commit(self: Box<Self>) -> crate::interfaces::Result<()> {
                self.tx.commit().await?;
                Ok(())
            }
        }
    };
}

// Generate implementations for each SQL backend
impl_store_transaction!(super::postgres::Postgres, "postgres");
impl_store_transaction!(super::sqlite::Sqlite, "sqlite");
