//! Database schema definitions using sea-query.
//!
//! These define the table and column identifiers for type-safe query building.
//! Table creation lives in the `migrations/` directory.

use sea_query::Iden;

/// Products table schema (catalog, owned by the product service).
#[derive(Iden)]
pub enum Products {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "name"]
    Name,
    #[iden = "price"]
    Price,
    #[iden = "discount_price"]
    DiscountPrice,
    #[iden = "stock_quantity"]
    StockQuantity,
    #[iden = "status"]
    Status,
    #[iden = "images"]
    Images,
}

/// Orders table schema.
#[derive(Iden)]
pub enum Orders {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "user_id"]
    UserId,
    #[iden = "total_amount"]
    TotalAmount,
    #[iden = "shipping_address"]
    ShippingAddress,
    #[iden = "payment_method"]
    PaymentMethod,
    #[iden = "status"]
    Status,
    #[iden = "payment_status"]
    PaymentStatus,
    #[iden = "created_at"]
    CreatedAt,
    #[iden = "updated_at"]
    UpdatedAt,
}

/// Order line items table schema.
#[derive(Iden)]
pub enum OrderItems {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "order_id"]
    OrderId,
    #[iden = "product_id"]
    ProductId,
    #[iden = "quantity"]
    Quantity,
    #[iden = "price"]
    Price,
}

/// Users table schema (read-only here, joined for customer contact).
#[derive(Iden)]
pub enum Users {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "full_name"]
    FullName,
    #[iden = "email"]
    Email,
    #[iden = "phone"]
    Phone,
}
