//! Order storage interface.

use async_trait::async_trait;

use super::order_database::Result;
use crate::model::{LineItem, NewLineItem, NewOrder, Order, OrderId, OrderScope, StatusUpdate};

/// Order header and line item persistence, scoped to an open transaction.
#[async_trait]
pub trait OrderStore: Send {
    /// Insert an order header and return its assigned id.
    async fn insert_order(&mut self, order: &NewOrder) -> Result<OrderId>;

    /// Insert line items for an order, preserving their order.
    async fn insert_line_items(&mut self, order_id: OrderId, items: &[NewLineItem]) -> Result<()>;

    /// Apply a status update. Returns `false` if the order does not exist.
    async fn update_status(&mut self, order_id: OrderId, update: &StatusUpdate) -> Result<bool>;

    /// Fetch an order header visible under `scope`.
    ///
    /// The order row stays locked until the enclosing transaction ends, so
    /// two concurrent status changes on one order are serialized.
    async fn get_by_id(&mut self, order_id: OrderId, scope: OrderScope) -> Result<Option<Order>>;

    /// Line items of an order, in insertion order.
    async fn line_items(&mut self, order_id: OrderId) -> Result<Vec<LineItem>>;
}
