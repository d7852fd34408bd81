//! Order placement and cancellation rules.

use std::time::Duration;

use serde::Deserialize;

use super::ConfigError;
use crate::model::{Money, OrderStatus};

/// Business rules for the order service.
///
/// The checkout tolerance and the set of statuses that block cancellation
/// are store policy rather than fixed law, so both live here.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OrderPolicy {
    /// Largest accepted gap between the client's total and the computed
    /// total, in minor currency units.
    pub total_tolerance: Money,
    /// Statuses from which an order may no longer be cancelled.
    /// `cancelled` is always treated as non-cancellable.
    pub non_cancellable: Vec<OrderStatus>,
    /// Upper bound for one transactional attempt, in milliseconds.
    pub transaction_timeout_ms: u64,
    /// Retries after a transient failure (0 = single attempt).
    pub max_retries: usize,
    /// First retry delay, in milliseconds.
    pub retry_min_delay_ms: u64,
    /// Retry delay cap, in milliseconds.
    pub retry_max_delay_ms: u64,
    /// Page size for a customer's order history when none is requested.
    pub default_page_size: u32,
    /// Page size for the admin order listing when none is requested.
    pub admin_page_size: u32,
    /// Largest page size a caller may request.
    pub max_page_size: u32,
}

impl Default for OrderPolicy {
    fn default() -> Self {
        Self {
            total_tolerance: Money(1),
            non_cancellable: vec![OrderStatus::Delivered, OrderStatus::Cancelled],
            transaction_timeout_ms: 10_000,
            max_retries: 3,
            retry_min_delay_ms: 20,
            retry_max_delay_ms: 1_000,
            default_page_size: 10,
            admin_page_size: 20,
            max_page_size: 100,
        }
    }
}

impl OrderPolicy {
    /// Whether an order in `status` may be cancelled.
    pub fn is_cancellable(&self, status: OrderStatus) -> bool {
        status != OrderStatus::Cancelled && !self.non_cancellable.contains(&status)
    }

    pub fn transaction_timeout(&self) -> Duration {
        Duration::from_millis(self.transaction_timeout_ms)
    }

    pub fn retry_min_delay(&self) -> Duration {
        Duration::from_millis(self.retry_min_delay_ms)
    }

    pub fn retry_max_delay(&self) -> Duration {
        Duration::from_millis(self.retry_max_delay_ms)
    }

    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        if self.total_tolerance < Money::ZERO {
            return Err(ConfigError::Invalid(
                "orders.total_tolerance must not be negative".to_string(),
            ));
        }
        if self.transaction_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "orders.transaction_timeout_ms must be positive".to_string(),
            ));
        }
        if self.max_page_size == 0 || self.default_page_size == 0 || self.admin_page_size == 0 {
            return Err(ConfigError::Invalid(
                "orders page sizes must be at least 1".to_string(),
            ));
        }
        if self.retry_min_delay_ms > self.retry_max_delay_ms {
            return Err(ConfigError::Invalid(
                "orders.retry_min_delay_ms exceeds orders.retry_max_delay_ms".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cancellation_window() {
        let policy = OrderPolicy::default();
        assert!(policy.is_cancellable(OrderStatus::Pending));
        assert!(policy.is_cancellable(OrderStatus::Confirmed));
        assert!(policy.is_cancellable(OrderStatus::Shipping));
        assert!(!policy.is_cancellable(OrderStatus::Delivered));
        assert!(!policy.is_cancellable(OrderStatus::Cancelled));
    }

    #[test]
    fn test_cancelled_is_never_cancellable() {
        let policy = OrderPolicy {
            non_cancellable: vec![],
            ..OrderPolicy::default()
        };
        assert!(!policy.is_cancellable(OrderStatus::Cancelled));
        assert!(policy.is_cancellable(OrderStatus::Delivered));
    }

    #[test]
    fn test_negative_tolerance_rejected() {
        let policy = OrderPolicy {
            total_tolerance: Money(-1),
            ..OrderPolicy::default()
        };
        assert!(policy.validate().is_err());
    }
}
