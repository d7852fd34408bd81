//! Result rows shared by the SQL backends and their conversion into the model.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::interfaces::{Result, StorageError};
use crate::model::{
    Customer, LineItem, LineItemDetails, Money, Order, OrderDetails, OrderId, OrderStatus,
    PaymentMethod, PaymentStatus, Product, ProductStatus,
};

#[derive(Debug, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub name: String,
    pub price: i64,
    pub discount_price: Option<i64>,
    pub stock_quantity: i64,
    pub status: String,
}

impl TryFrom<ProductRow> for Product {
    type Error = StorageError;

    fn try_from(row: ProductRow) -> Result<Self> {
        Ok(Product {
            id: row.id,
            name: row.name,
            price: Money(row.price),
            discount_price: row.discount_price.map(Money),
            stock_quantity: u32::try_from(row.stock_quantity)
                .map_err(|e| StorageError::invalid("stock_quantity", e))?,
            status: row
                .status
                .parse::<ProductStatus>()
                .map_err(|e| StorageError::invalid("status", e))?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct OrderRow {
    pub id: i64,
    pub user_id: i64,
    pub total_amount: i64,
    pub shipping_address: String,
    pub payment_method: String,
    pub status: String,
    pub payment_status: String,
    pub created_at: String,
    pub updated_at: String,
}

fn parse_timestamp(column: &'static str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| StorageError::invalid(column, e))
}

impl TryFrom<OrderRow> for Order {
    type Error = StorageError;

    fn try_from(row: OrderRow) -> Result<Self> {
        Ok(Order {
            id: row.id,
            user_id: row.user_id,
            total_amount: Money(row.total_amount),
            shipping_address: row.shipping_address,
            payment_method: row
                .payment_method
                .parse::<PaymentMethod>()
                .map_err(|e| StorageError::invalid("payment_method", e))?,
            status: row
                .status
                .parse::<OrderStatus>()
                .map_err(|e| StorageError::invalid("status", e))?,
            payment_status: row
                .payment_status
                .parse::<PaymentStatus>()
                .map_err(|e| StorageError::invalid("payment_status", e))?,
            created_at: parse_timestamp("created_at", &row.created_at)?,
            updated_at: parse_timestamp("updated_at", &row.updated_at)?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct OrderWithCustomerRow {
    #[sqlx(flatten)]
    pub order: OrderRow,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
}

impl OrderWithCustomerRow {
    fn into_parts(self) -> Result<(Order, Option<Customer>)> {
        let order = Order::try_from(self.order)?;
        // The left join yields no name when the user row is gone.
        let customer = self.customer_name.map(|full_name| Customer {
            user_id: order.user_id,
            full_name,
            email: self.customer_email.unwrap_or_default(),
            phone: self.customer_phone,
        });
        Ok((order, customer))
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct LineItemRow {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub price: i64,
}

impl TryFrom<LineItemRow> for LineItem {
    type Error = StorageError;

    fn try_from(row: LineItemRow) -> Result<Self> {
        Ok(LineItem {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            quantity: u32::try_from(row.quantity)
                .map_err(|e| StorageError::invalid("quantity", e))?,
            unit_price: Money(row.price),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct LineItemDetailsRow {
    #[sqlx(flatten)]
    pub item: LineItemRow,
    pub product_name: Option<String>,
    pub images: Option<String>,
}

/// Decode the `products.images` JSON array. Malformed values are logged and
/// treated as "no images" since they only affect display.
fn parse_images(product_id: i64, raw: Option<String>) -> Vec<String> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Vec::new(),
        Some(json) => serde_json::from_str(json).unwrap_or_else(|e| {
            warn!(product_id, error = %e, "Ignoring malformed product images");
            Vec::new()
        }),
    }
}

impl TryFrom<LineItemDetailsRow> for LineItemDetails {
    type Error = StorageError;

    fn try_from(row: LineItemDetailsRow) -> Result<Self> {
        let images = parse_images(row.item.product_id, row.images);
        Ok(LineItemDetails {
            item: LineItem::try_from(row.item)?,
            product_name: row.product_name,
            images,
        })
    }
}

/// Attach line items to their orders, keeping both input orders.
pub fn assemble(
    orders: Vec<OrderWithCustomerRow>,
    items: Vec<LineItemDetailsRow>,
) -> Result<Vec<OrderDetails>> {
    let mut items_by_order: HashMap<OrderId, Vec<LineItemDetails>> = HashMap::new();
    for row in items {
        let item = LineItemDetails::try_from(row)?;
        items_by_order.entry(item.item.order_id).or_default().push(item);
    }

    orders
        .into_iter()
        .map(|row| {
            let (order, customer) = row.into_parts()?;
            let items = items_by_order.remove(&order.id).unwrap_or_default();
            Ok(OrderDetails {
                order,
                customer,
                items,
            })
        })
        .collect()
}
