//! Cancellation and its stock compensation.

use tracing::{error, info, warn};

use super::{OrderError, OrderService, Result, Staged};
use crate::interfaces::{OrderStore, ProductCatalog, StoreTransaction};
use crate::model::{
    Order, OrderDetails, OrderId, OrderScope, OrderStatus, Requester, StatusUpdate,
};

/// Put every line item's quantity back into stock.
///
/// Quantities come from the stored line items, so exactly what the order
/// reserved is returned.
pub(super) async fn restore_stock(
    tx: &mut dyn StoreTransaction,
    order_id: OrderId,
) -> Result<()> {
    for item in tx.line_items(order_id).await? {
        if !tx.increment_stock(item.product_id, item.quantity).await? {
            warn!(
                order_id,
                product_id = item.product_id,
                quantity = item.quantity,
                "Product no longer exists, stock not restored"
            );
        }
    }
    Ok(())
}

impl OrderService {
    pub(super) fn ensure_cancellable(&self, order: &Order) -> Result<()> {
        if self.policy.is_cancellable(order.status) {
            Ok(())
        } else {
            Err(OrderError::OrderNotCancellable {
                order_id: order.id,
                status: order.status,
            })
        }
    }

    /// Cancel an order and return its reserved stock.
    ///
    /// Customers may only cancel their own orders; admins may cancel any.
    #[tracing::instrument(
        name = "orders.cancel",
        skip_all,
        fields(%order_id, user_id = requester.user_id)
    )]
    pub async fn cancel_order(
        &self,
        order_id: OrderId,
        requester: Requester,
    ) -> Result<OrderDetails> {
        let scope = requester.scope();
        let previous = self
            .run("cancel_order", || self.stage_cancellation(order_id, scope))
            .await
            .inspect_err(|e| match e {
                OrderError::Storage(_) | OrderError::Transient(_) => {
                    error!(error = %e, "Order cancellation failed")
                }
                _ => warn!(error = %e, "Order cancellation rejected"),
            })?;
        info!(order_id, previous_status = %previous, "Order cancelled");

        self.committed_view(order_id).await
    }

    async fn stage_cancellation(
        &self,
        order_id: OrderId,
        scope: OrderScope,
    ) -> Result<Staged<OrderStatus>> {
        let mut tx = self.db.begin().await?;

        let order = tx
            .get_by_id(order_id, scope)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))?;
        self.ensure_cancellable(&order)?;

        restore_stock(tx.as_mut(), order_id).await?;
        tx.update_status(order_id, &StatusUpdate::cancel()).await?;

        Ok(Staged {
            tx,
            outcome: order.status,
        })
    }
}
