//! Order placement, cancellation and status management.
//!
//! Every state-changing operation runs as one storage transaction: catalog
//! reads lock the product rows they look at, and order and stock writes
//! commit or roll back together. Attempts that lose a lock race or exceed
//! the transaction timeout before committing are retried with backoff; a
//! commit is never retried.

mod cancellation;
mod error;
mod placement;
mod status;


use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use backon::Retryable;
use tracing::{error, warn};

pub use error::OrderError;
pub use placement::parse_payment_method;

use crate::config::OrderPolicy;
use crate::interfaces::{OrderDatabase, StoreTransaction};
use crate::model::{
    OrderDetails, OrderId, OrderPage, OrderQuery, OrderScope, OrderStatus, PageRequest, Requester,
    UserId,
};
use crate::utils::retry::order_backoff;

/// Result type for order service operations.
pub type Result<T> = std::result::Result<T, OrderError>;

/// Order placement service.
///
/// Stateless apart from its storage handle and policy; clones share the
/// same database.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<dyn OrderDatabase>,
    policy: OrderPolicy,
}

impl OrderService {
    pub fn new(db: Arc<dyn OrderDatabase>, policy: OrderPolicy) -> Self {
        Self { db, policy }
    }

    pub fn policy(&self) -> &OrderPolicy {
        &self.policy
    }

    /// Stage one transactional attempt under the configured timeout,
    /// retrying transient failures, then commit the winning attempt.
    ///
    /// Only staging is timed and retried. Once `commit` is issued the writes
    /// may already be durable, so its failure is reported as a storage error
    /// and never retried.
    async fn run<T, F, Fut>(&self, operation: &'static str, mut stage: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Staged<T>>>,
    {
        let timeout = self.policy.transaction_timeout();
        let staged = (|| {
            let fut = stage();
            async move {
                match tokio::time::timeout(timeout, fut).await {
                    Ok(result) => result,
                    Err(_) => Err(OrderError::Transient(format!(
                        "{operation} exceeded {}ms",
                        timeout.as_millis()
                    ))),
                }
            }
        })
        .retry(order_backoff(&self.policy))
        .when(OrderError::is_transient)
        .notify(|err: &OrderError, delay: Duration| {
            warn!(operation, error = %err, delay = ?delay, "Transient failure, retrying");
        })
        .await?;

        staged.tx.commit().await.map_err(OrderError::Storage)?;
        Ok(staged.outcome)
    }

    /// Order view as seen by `requester`.
    #[tracing::instrument(
        name = "orders.get",
        skip_all,
        fields(%order_id, user_id = requester.user_id)
    )]
    pub async fn get_order(&self, order_id: OrderId, requester: Requester) -> Result<OrderDetails> {
        self.db
            .find_order(order_id, requester.scope())
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))
    }

    /// A customer's order history, newest first.
    #[tracing::instrument(name = "orders.list_for_user", skip_all, fields(%user_id))]
    pub async fn list_orders_for_user(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<OrderPage> {
        let query = OrderQuery {
            user_id: Some(user_id),
            status: None,
            page: page.normalized(self.policy.default_page_size, self.policy.max_page_size),
        };
        Ok(self.db.list_orders(&query).await?)
    }

    /// All orders, optionally filtered by status, newest first.
    #[tracing::instrument(name = "orders.list_all", skip_all, fields(status = ?status))]
    pub async fn list_all_orders(
        &self,
        status: Option<&str>,
        page: PageRequest,
    ) -> Result<OrderPage> {
        let status = status
            .map(|value| parse_order_status("status", value))
            .transpose()?;
        let query = OrderQuery {
            user_id: None,
            status,
            page: page.normalized(self.policy.admin_page_size, self.policy.max_page_size),
        };
        Ok(self.db.list_orders(&query).await?)
    }

    /// Reload an order after a committed write.
    ///
    /// The write has already landed, so a failed reload is reported as
    /// [`OrderError::ReloadFailed`] rather than as a failed operation.
    async fn committed_view(&self, order_id: OrderId) -> Result<OrderDetails> {
        let reason = match self.db.find_order(order_id, OrderScope::Any).await {
            Ok(Some(details)) => return Ok(details),
            Ok(None) => "order no longer exists".to_string(),
            Err(e) => e.to_string(),
        };
        error!(order_id, %reason, "Committed order could not be reloaded");
        Err(OrderError::ReloadFailed { order_id, reason })
    }
}

/// An attempt whose reads and writes are done, waiting for commit.
struct Staged<T> {
    tx: Box<dyn StoreTransaction>,
    outcome: T,
}

fn parse_order_status(field: &'static str, value: &str) -> Result<OrderStatus> {
    value.parse::<OrderStatus>().map_err(|_| OrderError::InvalidStatus {
        field,
        value: value.to_string(),
    })
}
