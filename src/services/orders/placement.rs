//! Checkout: validate lines against the catalog, reserve stock, persist.

use tracing::{error, info, warn};

use super::{OrderError, OrderService, Result, Staged};
use crate::interfaces::{OrderStore, ProductCatalog};
use crate::model::{
    Money, NewLineItem, NewOrder, OrderDetails, OrderId, PaymentMethod, PlaceOrder, UserId,
};

/// Parse a payment method string from the checkout form.
pub fn parse_payment_method(value: &str) -> Result<PaymentMethod> {
    value
        .parse::<PaymentMethod>()
        .map_err(|e| OrderError::InvalidRequest(format!("{e}")))
}

/// Shape checks that need no storage access.
fn validate(request: &PlaceOrder) -> Result<()> {
    if request.items.is_empty() {
        return Err(OrderError::InvalidRequest(
            "order must contain at least one item".to_string(),
        ));
    }
    if let Some(line) = request.items.iter().find(|line| line.quantity == 0) {
        return Err(OrderError::InvalidRequest(format!(
            "quantity for product {} must be at least 1",
            line.product_id
        )));
    }
    if request.shipping_address.trim().is_empty() {
        return Err(OrderError::InvalidRequest(
            "shipping address is required".to_string(),
        ));
    }
    if request.client_total < Money::ZERO {
        return Err(OrderError::InvalidRequest(
            "total amount must not be negative".to_string(),
        ));
    }
    Ok(())
}

impl OrderService {
    /// Place an order for `user_id`.
    ///
    /// Prices come from the catalog, never from the request: each line's unit
    /// price is read once (discount price when present) and used both for the
    /// total and for the stored line item. The client's total is only
    /// compared against the computed one.
    #[tracing::instrument(
        name = "orders.place",
        skip_all,
        fields(%user_id, items = request.items.len())
    )]
    pub async fn place_order(
        &self,
        user_id: UserId,
        request: &PlaceOrder,
    ) -> Result<OrderDetails> {
        if let Err(e) = validate(request) {
            warn!(error = %e, "Rejected order request");
            return Err(e);
        }

        let (order_id, total) = self
            .run("place_order", || self.stage_placement(user_id, request))
            .await
            .inspect_err(|e| match e {
                OrderError::Storage(_) | OrderError::Transient(_) => {
                    error!(error = %e, "Order placement failed")
                }
                _ => warn!(error = %e, "Order rejected"),
            })?;
        info!(order_id, %total, "Order placed");

        self.committed_view(order_id).await
    }

    async fn stage_placement(
        &self,
        user_id: UserId,
        request: &PlaceOrder,
    ) -> Result<Staged<(OrderId, Money)>> {
        let mut tx = self.db.begin().await?;

        let mut lines = Vec::with_capacity(request.items.len());
        let mut computed = Money::ZERO;
        for line in &request.items {
            let product = tx
                .get_active_by_id(line.product_id)
                .await?
                .ok_or(OrderError::ProductNotFound(line.product_id))?;

            if product.stock_quantity < line.quantity {
                return Err(OrderError::InsufficientStock {
                    product_id: product.id,
                    requested: line.quantity,
                    available: product.stock_quantity,
                });
            }

            let unit_price = product.unit_price();
            computed = computed + unit_price.times(line.quantity);
            lines.push(NewLineItem {
                product_id: product.id,
                quantity: line.quantity,
                unit_price,
            });
        }

        if computed.abs_diff(request.client_total) > self.policy.total_tolerance {
            return Err(OrderError::TotalMismatch {
                declared: request.client_total,
                computed,
            });
        }

        let order_id = tx
            .insert_order(&NewOrder::pending(
                user_id,
                computed,
                request.shipping_address.as_str(),
                request.payment_method,
            ))
            .await?;
        tx.insert_line_items(order_id, &lines).await?;

        // Lines for the same product each passed the check above on their
        // own; the guarded decrement catches their combined demand.
        for line in &lines {
            if !tx.decrement_stock(line.product_id, line.quantity).await? {
                let available = tx
                    .get_active_by_id(line.product_id)
                    .await?
                    .map_or(0, |product| product.stock_quantity);
                return Err(OrderError::InsufficientStock {
                    product_id: line.product_id,
                    requested: line.quantity,
                    available,
                });
            }
        }

        Ok(Staged {
            tx,
            outcome: (order_id, computed),
        })
    }
}
