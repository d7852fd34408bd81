//! Order service step definitions.

use std::collections::HashMap;
use std::fmt;

use cucumber::{given, then, when, World};
use futures::future::join_all;
use storefront_orders::config::OrderPolicy;
use storefront_orders::model::{
    Customer, LineRequest, Money, OrderDetails, OrderStatus, PaymentMethod, PlaceOrder, Product,
    ProductId, ProductStatus, Requester, UserId,
};
use storefront_orders::services::{OrderError, OrderService};

use crate::backend::{StorageBackend, StorageContext};

const ADMIN: UserId = 99;

/// Test context for order scenarios.
#[derive(World)]
#[world(init = Self::new)]
pub struct OrderWorld {
    backend: StorageBackend,
    context: Option<StorageContext>,
    service: Option<OrderService>,
    products: HashMap<String, ProductId>,
    next_product_id: ProductId,
    last_order: Option<OrderDetails>,
    last_error: Option<OrderError>,
    outcomes: Vec<Result<OrderDetails, OrderError>>,
}

impl fmt::Debug for OrderWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderWorld")
            .field("backend", &self.backend)
            .field("products", &self.products)
            .field("last_order", &self.last_order.as_ref().map(|o| o.order.id))
            .field("last_error", &self.last_error)
            .finish()
    }
}

impl OrderWorld {
    fn new() -> Self {
        Self {
            backend: StorageBackend::from_env(),
            context: None,
            service: None,
            products: HashMap::new(),
            next_product_id: 1,
            last_order: None,
            last_error: None,
            outcomes: Vec::new(),
        }
    }

    fn context(&self) -> &StorageContext {
        self.context
            .as_ref()
            .expect("Storage context not initialized")
    }

    fn service(&self) -> &OrderService {
        self.service.as_ref().expect("Order service not initialized")
    }

    fn product_id(&self, name: &str) -> ProductId {
        *self
            .products
            .get(name)
            .unwrap_or_else(|| panic!("unknown product {name:?}"))
    }

    fn order(&self) -> &OrderDetails {
        self.last_order.as_ref().expect("No order has been placed")
    }

    fn error(&self) -> &OrderError {
        self.last_error
            .as_ref()
            .expect("Expected the last operation to fail")
    }

    fn record(&mut self, result: Result<OrderDetails, OrderError>) {
        match result {
            Ok(order) => {
                self.last_order = Some(order);
                self.last_error = None;
            }
            Err(e) => self.last_error = Some(e),
        }
    }

    async fn add_product(&mut self, name: String, price: i64, discount: Option<i64>, stock: u32) {
        let id = self.next_product_id;
        self.next_product_id += 1;
        let product = Product {
            id,
            name: name.clone(),
            price: Money(price),
            discount_price: discount.map(Money),
            stock_quantity: stock,
            status: ProductStatus::Active,
        };
        self.context()
            .add_product(product, vec![format!("/images/{id}.jpg")])
            .await;
        self.products.insert(name, id);
    }

    async fn place(&mut self, user_id: UserId, lines: Vec<(u32, String)>, total: i64) {
        let request = PlaceOrder {
            items: lines
                .iter()
                .map(|(quantity, name)| LineRequest::new(self.product_id(name), *quantity))
                .collect(),
            shipping_address: "12 Le Loi, District 1, HCMC".to_string(),
            payment_method: PaymentMethod::Cod,
            client_total: Money(total),
        };
        let result = self.service().place_order(user_id, &request).await;
        self.record(result);
    }
}

// --- Background ---

#[given("an order service backend")]
async fn given_order_service_backend(world: &mut OrderWorld) {
    println!("Using backend: {}", world.backend.name());
    let ctx = StorageContext::new(world.backend).await;
    world.service = Some(OrderService::new(ctx.db.clone(), OrderPolicy::default()));
    world.context = Some(ctx);
}

#[given(expr = "customer {int} named {string}")]
async fn given_customer(world: &mut OrderWorld, user_id: UserId, name: String) {
    let email = format!("customer{user_id}@example.com");
    world
        .context()
        .add_customer(Customer {
            user_id,
            full_name: name,
            email,
            phone: None,
        })
        .await;
}

// --- Given steps ---

#[given(expr = "a product {string} priced {int} with {int} in stock")]
async fn given_product(world: &mut OrderWorld, name: String, price: i64, stock: u32) {
    world.add_product(name, price, None, stock).await;
}

#[given(expr = "a product {string} priced {int} discounted to {int} with {int} in stock")]
async fn given_discounted_product(
    world: &mut OrderWorld,
    name: String,
    price: i64,
    discount: i64,
    stock: u32,
) {
    world.add_product(name, price, Some(discount), stock).await;
}

#[given(expr = "product {string} is inactive")]
async fn given_product_inactive(world: &mut OrderWorld, name: String) {
    let id = world.product_id(&name);
    world.context().deactivate_product(id).await;
}

#[given(expr = "customer {int} has ordered {int} of {string} declaring a total of {int}")]
async fn given_existing_order(
    world: &mut OrderWorld,
    user_id: UserId,
    quantity: u32,
    name: String,
    total: i64,
) {
    world.place(user_id, vec![(quantity, name)], total).await;
    assert!(
        world.last_error.is_none(),
        "setup order failed: {:?}",
        world.last_error
    );
}

// --- When steps ---

#[when(expr = "customer {int} orders {int} of {string} declaring a total of {int}")]
async fn when_customer_orders(
    world: &mut OrderWorld,
    user_id: UserId,
    quantity: u32,
    name: String,
    total: i64,
) {
    world.place(user_id, vec![(quantity, name)], total).await;
}

#[when(expr = "customer {int} orders {int} of {string} and {int} of {string} \
               declaring a total of {int}")]
async fn when_customer_orders_two_lines(
    world: &mut OrderWorld,
    user_id: UserId,
    first_quantity: u32,
    first: String,
    second_quantity: u32,
    second: String,
    total: i64,
) {
    world
        .place(
            user_id,
            vec![(first_quantity, first), (second_quantity, second)],
            total,
        )
        .await;
}

#[when(expr = "{int} orders for {int} of {string} declaring a total of {int} \
               are placed at once by customer {int}")]
async fn when_concurrent_orders(
    world: &mut OrderWorld,
    count: u32,
    quantity: u32,
    name: String,
    total: i64,
    user_id: UserId,
) {
    let request = PlaceOrder {
        items: vec![LineRequest::new(world.product_id(&name), quantity)],
        shipping_address: "12 Le Loi, District 1, HCMC".to_string(),
        payment_method: PaymentMethod::Momo,
        client_total: Money(total),
    };
    let service = world.service().clone();
    let attempts = (0..count).map(|_| {
        let service = service.clone();
        let request = request.clone();
        async move { service.place_order(user_id, &request).await }
    });
    world.outcomes = join_all(attempts).await;
}

#[when(expr = "customer {int} cancels the order")]
async fn when_customer_cancels(world: &mut OrderWorld, user_id: UserId) {
    let order_id = world.order().order.id;
    let result = world
        .service()
        .cancel_order(order_id, Requester::customer(user_id))
        .await;
    world.record(result);
}

#[when("an admin cancels the order")]
async fn when_admin_cancels(world: &mut OrderWorld) {
    let order_id = world.order().order.id;
    let result = world
        .service()
        .cancel_order(order_id, Requester::admin(ADMIN))
        .await;
    world.record(result);
}

#[when(expr = "an admin sets the order status to {string}")]
async fn when_admin_sets_status(world: &mut OrderWorld, status: String) {
    let order_id = world.order().order.id;
    let result = world
        .service()
        .update_order_status(order_id, Some(status.as_str()), None)
        .await;
    world.record(result);
}

#[when(expr = "customer {int} looks up the order")]
async fn when_customer_looks_up(world: &mut OrderWorld, user_id: UserId) {
    let order_id = world.order().order.id;
    let result = world
        .service()
        .get_order(order_id, Requester::customer(user_id))
        .await;
    world.record(result);
}

// --- Then steps ---

#[then(expr = "the order is placed with a total of {int}")]
async fn then_order_placed(world: &mut OrderWorld, total: i64) {
    assert!(
        world.last_error.is_none(),
        "expected success, got {:?}",
        world.last_error
    );
    let order = world.order();
    assert_eq!(order.order.total_amount, Money(total));
    assert_eq!(order.order.status, OrderStatus::Pending);
    assert_eq!(order.items_total(), order.order.total_amount);
}

#[then(expr = "the line for {string} has a unit price of {int}")]
async fn then_line_unit_price(world: &mut OrderWorld, name: String, price: i64) {
    let product_id = world.product_id(&name);
    let line = world
        .order()
        .items
        .iter()
        .find(|line| line.item.product_id == product_id)
        .unwrap_or_else(|| panic!("order has no line for {name:?}"));
    assert_eq!(line.item.unit_price, Money(price));
    assert_eq!(line.product_name.as_deref(), Some(name.as_str()));
}

#[then(expr = "the order is rejected for insufficient stock of {string} with {int} available")]
async fn then_insufficient_stock(world: &mut OrderWorld, name: String, expected: u32) {
    let expected_id = world.product_id(&name);
    match world.error() {
        OrderError::InsufficientStock {
            product_id,
            available,
            ..
        } => {
            assert_eq!(*product_id, expected_id);
            assert_eq!(*available, expected);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }
}

#[then("the order is rejected for a total mismatch")]
async fn then_total_mismatch(world: &mut OrderWorld) {
    assert!(
        matches!(world.error(), OrderError::TotalMismatch { .. }),
        "expected TotalMismatch, got {:?}",
        world.error()
    );
}

#[then(expr = "the order is rejected because {string} is unavailable")]
async fn then_product_not_found(world: &mut OrderWorld, name: String) {
    let expected_id = world.product_id(&name);
    match world.error() {
        OrderError::ProductNotFound(product_id) => assert_eq!(*product_id, expected_id),
        other => panic!("expected ProductNotFound, got {other:?}"),
    }
}

#[then("the order is not found")]
async fn then_order_not_found(world: &mut OrderWorld) {
    assert!(
        matches!(world.error(), OrderError::OrderNotFound(_)),
        "expected OrderNotFound, got {:?}",
        world.error()
    );
}

#[then("the order cannot be cancelled")]
async fn then_not_cancellable(world: &mut OrderWorld) {
    assert!(
        matches!(world.error(), OrderError::OrderNotCancellable { .. }),
        "expected OrderNotCancellable, got {:?}",
        world.error()
    );
}

#[then("the status change is rejected")]
async fn then_status_regression(world: &mut OrderWorld) {
    assert!(
        matches!(world.error(), OrderError::StatusRegression { .. }),
        "expected StatusRegression, got {:?}",
        world.error()
    );
}

#[then(expr = "the order status is {string}")]
async fn then_order_status(world: &mut OrderWorld, status: String) {
    assert!(
        world.last_error.is_none(),
        "expected success, got {:?}",
        world.last_error
    );
    assert_eq!(world.order().order.status.as_str(), status);
}

#[then(expr = "{string} has {int} in stock")]
async fn then_stock(world: &mut OrderWorld, name: String, expected: u32) {
    let id = world.product_id(&name);
    assert_eq!(world.context().stock(id).await, expected);
}

#[then(expr = "{int} orders exist")]
async fn then_order_count(world: &mut OrderWorld, expected: u64) {
    assert_eq!(world.context().order_count().await, expected);
}

#[then(expr = "{int} of the orders succeeded")]
async fn then_concurrent_successes(world: &mut OrderWorld, expected: usize) {
    let succeeded = world.outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(succeeded, expected);
}

#[then("every other order failed for insufficient stock")]
async fn then_concurrent_failures(world: &mut OrderWorld) {
    for outcome in world.outcomes.iter().filter(|r| r.is_err()) {
        assert!(
            matches!(outcome, Err(OrderError::InsufficientStock { .. })),
            "unexpected failure {outcome:?}"
        );
    }
}
