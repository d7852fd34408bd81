//! Order service errors.

use crate::interfaces::StorageError;
use crate::model::{Money, OrderId, OrderStatus, ProductId};

/// Errors returned by [`OrderService`](super::OrderService).
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Product {0} not found or inactive")]
    ProductNotFound(ProductId),

    #[error(
        "Insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    #[error("Order total mismatch: declared {declared}, computed {computed}")]
    TotalMismatch { declared: Money, computed: Money },

    #[error("Order {0} not found")]
    OrderNotFound(OrderId),

    #[error("Order {order_id} cannot be cancelled in status {status}")]
    OrderNotCancellable {
        order_id: OrderId,
        status: OrderStatus,
    },

    #[error("Invalid {field}: {value:?}")]
    InvalidStatus { field: &'static str, value: String },

    #[error("Order status cannot move from {from} to {to}")]
    StatusRegression { from: OrderStatus, to: OrderStatus },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Temporarily unavailable: {0}")]
    Transient(String),

    #[error("Storage error: {0}")]
    Storage(StorageError),

    #[error("Order {order_id} was saved but could not be reloaded: {reason}")]
    ReloadFailed { order_id: OrderId, reason: String },
}

impl OrderError {
    /// Whether the caller may retry the same request later.
    pub fn is_transient(&self) -> bool {
        matches!(self, OrderError::Transient(_))
    }
}

impl From<StorageError> for OrderError {
    fn from(err: StorageError) -> Self {
        if err.is_transient() {
            OrderError::Transient(err.to_string())
        } else {
            OrderError::Storage(err)
        }
    }
}
