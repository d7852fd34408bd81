//! Orders, line items and the requests that create and query them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Money, OrderId, ProductId, UserId};

/// Fulfillment state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipping,
    Delivered,
    Cancelled,
}

string_enum!(OrderStatus, "order status", {
    Pending => "pending",
    Confirmed => "confirmed",
    Shipping => "shipping",
    Delivered => "delivered",
    Cancelled => "cancelled",
});

impl OrderStatus {
    /// Position on the forward fulfillment path. `Cancelled` is off the path.
    pub fn stage(&self) -> Option<u8> {
        match self {
            OrderStatus::Pending => Some(0),
            OrderStatus::Confirmed => Some(1),
            OrderStatus::Shipping => Some(2),
            OrderStatus::Delivered => Some(3),
            OrderStatus::Cancelled => None,
        }
    }

    /// Whether an order may move from `self` to `next` without going backwards.
    ///
    /// Cancellation eligibility is decided separately by the service policy.
    pub fn can_advance_to(&self, next: OrderStatus) -> bool {
        match (self.stage(), next.stage()) {
            (Some(current), Some(next)) => next >= current,
            (Some(_), None) => true,
            (None, None) => true,
            (None, Some(_)) => false,
        }
    }
}

/// Settlement state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

string_enum!(PaymentStatus, "payment status", {
    Pending => "pending",
    Paid => "paid",
    Failed => "failed",
});

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash on delivery.
    Cod,
    BankTransfer,
    Momo,
    Zalopay,
    Vnpay,
    /// Card or wallet payment through the online gateway.
    Online,
}

string_enum!(PaymentMethod, "payment method", {
    Cod => "cod",
    BankTransfer => "bank_transfer",
    Momo => "momo",
    Zalopay => "zalopay",
    Vnpay => "vnpay",
    Online => "online",
});

/// Stored order header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub total_amount: Money,
    pub shipping_address: String,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Order header to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub user_id: UserId,
    pub total_amount: Money,
    pub shipping_address: String,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    /// A freshly placed order: pending fulfillment, pending payment.
    pub fn pending(
        user_id: UserId,
        total_amount: Money,
        shipping_address: impl Into<String>,
        payment_method: PaymentMethod,
    ) -> Self {
        Self {
            user_id,
            total_amount,
            shipping_address: shipping_address.into(),
            payment_method,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

/// Stored order line with its captured unit price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: i64,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    /// Price per unit at the moment the order was placed. Never recomputed.
    pub unit_price: Money,
}

impl LineItem {
    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

/// Line item to insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewLineItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Money,
}

/// One requested product line of a checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl LineRequest {
    pub fn new(product_id: ProductId, quantity: u32) -> Self {
        Self { product_id, quantity }
    }
}

/// Checkout request as submitted by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrder {
    pub items: Vec<LineRequest>,
    pub shipping_address: String,
    pub payment_method: PaymentMethod,
    /// Total the client computed. Only compared against the server total.
    pub client_total: Money,
}

/// Who is asking. Non-admins only ever see their own orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requester {
    pub user_id: UserId,
    pub is_admin: bool,
}

impl Requester {
    pub fn customer(user_id: UserId) -> Self {
        Self {
            user_id,
            is_admin: false,
        }
    }

    pub fn admin(user_id: UserId) -> Self {
        Self {
            user_id,
            is_admin: true,
        }
    }

    pub fn scope(&self) -> OrderScope {
        if self.is_admin {
            OrderScope::Any
        } else {
            OrderScope::OwnedBy(self.user_id)
        }
    }
}

/// Visibility filter applied when looking up an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderScope {
    Any,
    OwnedBy(UserId),
}

impl OrderScope {
    pub fn permits(&self, owner: UserId) -> bool {
        match self {
            OrderScope::Any => true,
            OrderScope::OwnedBy(user_id) => *user_id == owner,
        }
    }
}

/// Field changes applied by a status update. `updated_at` is always written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusUpdate {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub updated_at: DateTime<Utc>,
}

impl StatusUpdate {
    pub fn new(status: Option<OrderStatus>, payment_status: Option<PaymentStatus>) -> Self {
        Self {
            status,
            payment_status,
            updated_at: Utc::now(),
        }
    }

    pub fn cancel() -> Self {
        Self::new(Some(OrderStatus::Cancelled), None)
    }
}

/// Contact details of the ordering user, joined for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub user_id: UserId,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// Line item with product display metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemDetails {
    #[serde(flatten)]
    pub item: LineItem,
    pub product_name: Option<String>,
    pub images: Vec<String>,
}

/// Order header, customer and line items, assembled for presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    pub customer: Option<Customer>,
    pub items: Vec<LineItemDetails>,
}

impl OrderDetails {
    /// Σ(unit price × quantity) over the stored line items.
    pub fn items_total(&self) -> Money {
        self.items.iter().map(|line| line.item.line_total()).sum()
    }
}

/// 1-based page selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> Self {
        Self { page, limit }
    }

    /// Replace a zero page with 1 and clamp the limit into `1..=max`,
    /// substituting `default_limit` for zero.
    pub fn normalized(self, default_limit: u32, max_limit: u32) -> Self {
        let limit = if self.limit == 0 {
            default_limit
        } else {
            self.limit
        };
        Self {
            page: self.page.max(1),
            limit: limit.clamp(1, max_limit.max(1)),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// Listing filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderQuery {
    pub user_id: Option<UserId>,
    pub status: Option<OrderStatus>,
    pub page: PageRequest,
}

/// Pagination metadata returned with a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_orders: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl Pagination {
    pub fn new(page: PageRequest, total_orders: u64) -> Self {
        let limit = u64::from(page.limit.max(1));
        let total_pages = u32::try_from(total_orders.div_ceil(limit)).unwrap_or(u32::MAX);
        Self {
            current_page: page.page,
            total_pages,
            total_orders,
            has_next_page: page.page < total_pages,
            has_prev_page: page.page > 1,
        }
    }
}

/// One page of orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPage {
    pub orders: Vec<OrderDetails>,
    pub pagination: Pagination,
}
