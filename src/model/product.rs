//! Catalog product as seen by order placement.

use serde::{Deserialize, Serialize};

use super::{Money, ProductId};

/// Product availability flag (`products.status`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    Active,
    Inactive,
}

string_enum!(ProductStatus, "product status", {
    Active => "active",
    Inactive => "inactive",
});

/// Pricing and stock columns of a catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub discount_price: Option<Money>,
    pub stock_quantity: u32,
    pub status: ProductStatus,
}

impl Product {
    /// Unit price charged for this product right now.
    ///
    /// The discount price wins whenever it is set, including a discount of zero.
    pub fn unit_price(&self) -> Money {
        self.discount_price.unwrap_or(self.price)
    }

    pub fn is_active(&self) -> bool {
        self.status == ProductStatus::Active
    }
}
