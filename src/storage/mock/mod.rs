//! In-memory order database for testing and demos.
//!
//! Transactions take an exclusive lock on the whole data set and work on a
//! private copy that replaces the shared state on commit. Dropping a
//! transaction discards the copy, mirroring SQL rollback.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::interfaces::{
    OrderDatabase, OrderStore, ProductCatalog, Result, StorageError, StoreTransaction,
};
use crate::model::{
    Customer, LineItem, LineItemDetails, NewLineItem, NewOrder, Order, OrderDetails, OrderId,
    OrderPage, OrderQuery, OrderScope, Pagination, Product, ProductId, ProductStatus,
    StatusUpdate, UserId,
};


#[derive(Debug, Clone)]
struct StoredProduct {
    product: Product,
    images: Vec<String>,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    users: BTreeMap<UserId, Customer>,
    products: BTreeMap<ProductId, StoredProduct>,
    orders: BTreeMap<OrderId, Order>,
    line_items: Vec<LineItem>,
    last_order_id: OrderId,
    last_line_item_id: i64,
}

impl Tables {
    fn details(&self, order: &Order) -> OrderDetails {
        let items = self
            .line_items
            .iter()
            .filter(|item| item.order_id == order.id)
            .map(|item| {
                let product = self.products.get(&item.product_id);
                LineItemDetails {
                    item: item.clone(),
                    product_name: product.map(|p| p.product.name.clone()),
                    images: product.map(|p| p.images.clone()).unwrap_or_default(),
                }
            })
            .collect();

        OrderDetails {
            order: order.clone(),
            customer: self.users.get(&order.user_id).cloned(),
            items,
        }
    }

    fn adjust_stock(&mut self, id: ProductId, apply: impl FnOnce(u32) -> Option<u32>) -> bool {
        let Some(stored) = self.products.get_mut(&id) else {
            return false;
        };
        match apply(stored.product.stock_quantity) {
            Some(stock) => {
                stored.product.stock_quantity = stock;
                true
            }
            None => false,
        }
    }
}

/// Injected failures, shared with open transactions.
#[derive(Default)]
struct Faults {
    fail_on_commit: RwLock<bool>,
    transient_failures: Mutex<u32>,
}

/// Mock order database that keeps all tables in memory.
#[derive(Default)]
pub struct MockOrderDatabase {
    tables: Arc<Mutex<Tables>>,
    faults: Arc<Faults>,
}

impl MockOrderDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every commit fail with a non-retryable error until reset.
    pub async fn set_fail_on_commit(&self, fail: bool) {
        *self.faults.fail_on_commit.write().await = fail;
    }

    /// Make the next `count` calls to `begin` fail with a retryable error.
    pub async fn fail_transiently(&self, count: u32) {
        *self.faults.transient_failures.lock().await = count;
    }

    pub async fn insert_user(&self, customer: Customer) {
        self.tables
            .lock()
            .await
            .users
            .insert(customer.user_id, customer);
    }

    pub async fn insert_product(&self, product: Product) {
        self.insert_product_with_images(product, Vec::new()).await;
    }

    pub async fn insert_product_with_images(&self, product: Product, images: Vec<String>) {
        self.tables
            .lock()
            .await
            .products
            .insert(product.id, StoredProduct { product, images });
    }

    pub async fn set_product_status(&self, id: ProductId, status: ProductStatus) {
        if let Some(stored) = self.tables.lock().await.products.get_mut(&id) {
            stored.product.status = status;
        }
    }

    /// Current catalog row, whatever its status.
    pub async fn product(&self, id: ProductId) -> Option<Product> {
        self.tables
            .lock()
            .await
            .products
            .get(&id)
            .map(|stored| stored.product.clone())
    }

    pub async fn stock(&self, id: ProductId) -> Option<u32> {
        self.product(id).await.map(|p| p.stock_quantity)
    }

    pub async fn order_count(&self) -> usize {
        self.tables.lock().await.orders.len()
    }

    pub async fn line_item_count(&self) -> usize {
        self.tables.lock().await.line_items.len()
    }
}

#[async_trait]
impl OrderDatabase for MockOrderDatabase {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        {
            let mut remaining = self.faults.transient_failures.lock().await;
            if *remaining > 0 {
                *remaining -= 1;
                return Err(StorageError::Busy("injected lock contention".to_string()));
            }
        }

        let guard = self.tables.clone().lock_owned().await;
        let work = guard.clone();
        Ok(Box::new(MockTransaction {
            guard,
            work,
            faults: self.faults.clone(),
        }))
    }

    async fn find_order(
        &self,
        order_id: OrderId,
        scope: OrderScope,
    ) -> Result<Option<OrderDetails>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .orders
            .get(&order_id)
            .filter(|order| scope.permits(order.user_id))
            .map(|order| tables.details(order)))
    }

    async fn list_orders(&self, query: &OrderQuery) -> Result<OrderPage> {
        let tables = self.tables.lock().await;

        let mut matching: Vec<&Order> = tables
            .orders
            .values()
            .filter(|order| query.user_id.map_or(true, |id| order.user_id == id))
            .filter(|order| query.status.map_or(true, |status| order.status == status))
            .collect();
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        let total = matching.len() as u64;
        let offset = usize::try_from(query.page.offset()).unwrap_or(usize::MAX);
        let orders = matching
            .into_iter()
            .skip(offset)
            .take(query.page.limit as usize)
            .map(|order| tables.details(order))
            .collect();

        Ok(OrderPage {
            orders,
            pagination: Pagination::new(query.page, total),
        })
    }
}

/// Transaction over a private copy of the mock tables.
pub struct MockTransaction {
    guard: OwnedMutexGuard<Tables>,
    work: Tables,
    faults: Arc<Faults>,
}

#[async_trait]
impl ProductCatalog for MockTransaction {
    async fn get_active_by_id(&mut self, id: ProductId) -> Result<Option<Product>> {
        Ok(self
            .work
            .products
            .get(&id)
            .map(|stored| &stored.product)
            .filter(|product| product.is_active())
            .cloned())
    }

    async fn decrement_stock(&mut self, id: ProductId, amount: u32) -> Result<bool> {
        Ok(self
            .work
            .adjust_stock(id, |stock| stock.checked_sub(amount)))
    }

    async fn increment_stock(&mut self, id: ProductId, amount: u32) -> Result<bool> {
        Ok(self
            .work
            .adjust_stock(id, |stock| stock.checked_add(amount)))
    }
}

#[async_trait]
impl OrderStore for MockTransaction {
    async fn insert_order(&mut self, order: &NewOrder) -> Result<OrderId> {
        self.work.last_order_id += 1;
        let id = self.work.last_order_id;
        self.work.orders.insert(
            id,
            Order {
                id,
                user_id: order.user_id,
                total_amount: order.total_amount,
                shipping_address: order.shipping_address.clone(),
                payment_method: order.payment_method,
                status: order.status,
                payment_status: order.payment_status,
                created_at: order.created_at,
                updated_at: order.created_at,
            },
        );
        Ok(id)
    }

    async fn insert_line_items(&mut self, order_id: OrderId, items: &[NewLineItem]) -> Result<()> {
        if !self.work.orders.contains_key(&order_id) {
            return Err(StorageError::invalid(
                "order_id",
                format!("order {order_id} does not exist"),
            ));
        }
        for item in items {
            if !self.work.products.contains_key(&item.product_id) {
                return Err(StorageError::invalid(
                    "product_id",
                    format!("product {} does not exist", item.product_id),
                ));
            }
            self.work.last_line_item_id += 1;
            self.work.line_items.push(LineItem {
                id: self.work.last_line_item_id,
                order_id,
                product_id: item.product_id,
                quantity: item.quantity,
                unit_price: item.unit_price,
            });
        }
        Ok(())
    }

    async fn update_status(&mut self, order_id: OrderId, update: &StatusUpdate) -> Result<bool> {
        let Some(order) = self.work.orders.get_mut(&order_id) else {
            return Ok(false);
        };
        if let Some(status) = update.status {
            order.status = status;
        }
        if let Some(payment_status) = update.payment_status {
            order.payment_status = payment_status;
        }
        order.updated_at = update.updated_at;
        Ok(true)
    }

    async fn get_by_id(&mut self, order_id: OrderId, scope: OrderScope) -> Result<Option<Order>> {
        Ok(self
            .work
            .orders
            .get(&order_id)
            .filter(|order| scope.permits(order.user_id))
            .cloned())
    }

    async fn line_items(&mut self, order_id: OrderId) -> Result<Vec<LineItem>> {
        Ok(self
            .work
            .line_items
            .iter()
            .filter(|item| item.order_id == order_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl StoreTransaction for MockTransaction {
    async fn commit(self: Box<Self>) -> Result<()> {
        if *self.faults.fail_on_commit.read().await {
            return Err(StorageError::Database(sqlx::Error::Protocol(
                "injected commit failure".to_string(),
            )));
        }

        let MockTransaction {
            mut guard, work, ..
        } = *self;
        *guard = work;
        Ok(())
    }
}
