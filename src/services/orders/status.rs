//! Privileged status updates.

use tracing::{error, info, warn};

use super::cancellation::restore_stock;
use super::{parse_order_status, OrderError, OrderService, Result, Staged};
use crate::interfaces::OrderStore;
use crate::model::{OrderDetails, OrderId, OrderScope, OrderStatus, PaymentStatus, StatusUpdate};

fn parse_payment_status(value: &str) -> Result<PaymentStatus> {
    value
        .parse::<PaymentStatus>()
        .map_err(|_| OrderError::InvalidStatus {
            field: "payment_status",
            value: value.to_string(),
        })
}

impl OrderService {
    /// Set an order's status and/or payment status.
    ///
    /// Statuses only move forward along pending, confirmed, shipping,
    /// delivered. Moving to `cancelled` returns the reserved stock exactly as
    /// [`cancel_order`](Self::cancel_order) does. `updated_at` is refreshed
    /// even when neither field is given.
    #[tracing::instrument(
        name = "orders.update_status",
        skip_all,
        fields(%order_id, ?status, ?payment_status)
    )]
    pub async fn update_order_status(
        &self,
        order_id: OrderId,
        status: Option<&str>,
        payment_status: Option<&str>,
    ) -> Result<OrderDetails> {
        let status = status
            .map(|value| parse_order_status("status", value))
            .transpose()?;
        let payment_status = payment_status.map(parse_payment_status).transpose()?;

        let previous = self
            .run("update_order_status", || {
                self.stage_status_update(order_id, status, payment_status)
            })
            .await
            .inspect_err(|e| match e {
                OrderError::Storage(_) | OrderError::Transient(_) => {
                    error!(error = %e, "Status update failed")
                }
                _ => warn!(error = %e, "Status update rejected"),
            })?;
        info!(
            order_id,
            from = %previous,
            to = %status.unwrap_or(previous),
            "Order status updated"
        );

        self.committed_view(order_id).await
    }

    async fn stage_status_update(
        &self,
        order_id: OrderId,
        status: Option<OrderStatus>,
        payment_status: Option<PaymentStatus>,
    ) -> Result<Staged<OrderStatus>> {
        let mut tx = self.db.begin().await?;

        let order = tx
            .get_by_id(order_id, OrderScope::Any)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))?;

        if let Some(next) = status {
            if !order.status.can_advance_to(next) {
                return Err(OrderError::StatusRegression {
                    from: order.status,
                    to: next,
                });
            }
            if next == OrderStatus::Cancelled {
                self.ensure_cancellable(&order)?;
                restore_stock(tx.as_mut(), order_id).await?;
            }
        }

        tx.update_status(order_id, &StatusUpdate::new(status, payment_status))
            .await?;

        Ok(Staged {
            tx,
            outcome: order.status,
        })
    }
}
