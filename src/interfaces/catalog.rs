//! Product catalog interface.

use async_trait::async_trait;

use super::order_database::Result;
use crate::model::{Product, ProductId};

/// Catalog reads and stock writes, scoped to an open transaction.
///
/// Implementations:
/// - `SqlTransaction`: SQLite and PostgreSQL storage
/// - `MockTransaction`: in-memory storage
#[async_trait]
pub trait ProductCatalog: Send {
    /// Fetch an active product by id.
    ///
    /// The product row stays locked against concurrent stock changes until
    /// the enclosing transaction commits or rolls back. Missing and inactive
    /// products both yield `None`.
    async fn get_active_by_id(&mut self, id: ProductId) -> Result<Option<Product>>;

    /// Subtract `amount` from the product's stock.
    ///
    /// The subtraction only happens when at least `amount` units are in
    /// stock; otherwise nothing changes and `false` is returned.
    async fn decrement_stock(&mut self, id: ProductId, amount: u32) -> Result<bool>;

    /// Add `amount` back to the product's stock.
    ///
    /// Returns `false` if the product row no longer exists.
    async fn increment_stock(&mut self, id: ProductId, amount: u32) -> Result<bool>;
}
