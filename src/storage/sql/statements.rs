//! Backend-neutral sea-query statements for catalog and order tables.

use chrono::{DateTime, SecondsFormat, Utc};
use sea_query::{
    Alias, Expr, Func, InsertStatement, LockType, Order as SortOrder, Query, SelectStatement,
    UpdateStatement,
};

use crate::model::{
    NewLineItem, NewOrder, OrderId, OrderQuery, OrderScope, ProductId, ProductStatus,
    StatusUpdate,
};
use crate::storage::schema::{OrderItems, Orders, Products, Users};

/// Timestamps are stored as fixed-width RFC 3339 text so they sort lexically.
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Active product by id, optionally locked `FOR UPDATE`.
pub fn select_active_product(id: ProductId, for_update: bool) -> SelectStatement {
    let mut stmt = Query::select()
        .columns([
            Products::Id,
            Products::Name,
            Products::Price,
            Products::DiscountPrice,
            Products::StockQuantity,
            Products::Status,
        ])
        .from(Products::Table)
        .and_where(Expr::col(Products::Id).eq(id))
        .and_where(Expr::col(Products::Status).eq(ProductStatus::Active.as_str()))
        .to_owned();
    if for_update {
        stmt.lock(LockType::Update);
    }
    stmt
}

/// No-op write that takes the write lock on a product row.
pub fn touch_product(id: ProductId) -> UpdateStatement {
    Query::update()
        .table(Products::Table)
        .value(Products::StockQuantity, Expr::col(Products::StockQuantity))
        .and_where(Expr::col(Products::Id).eq(id))
        .to_owned()
}

/// Guarded decrement: only applies while at least `amount` is in stock.
pub fn decrement_stock(id: ProductId, amount: u32) -> UpdateStatement {
    let amount = i64::from(amount);
    Query::update()
        .table(Products::Table)
        .value(
            Products::StockQuantity,
            Expr::col(Products::StockQuantity).sub(amount),
        )
        .and_where(Expr::col(Products::Id).eq(id))
        .and_where(Expr::col(Products::StockQuantity).gte(amount))
        .to_owned()
}

pub fn increment_stock(id: ProductId, amount: u32) -> UpdateStatement {
    Query::update()
        .table(Products::Table)
        .value(
            Products::StockQuantity,
            Expr::col(Products::StockQuantity).add(i64::from(amount)),
        )
        .and_where(Expr::col(Products::Id).eq(id))
        .to_owned()
}

/// Order header insert returning the generated id.
pub fn insert_order(order: &NewOrder) -> InsertStatement {
    let created_at = format_timestamp(&order.created_at);
    Query::insert()
        .into_table(Orders::Table)
        .columns([
            Orders::UserId,
            Orders::TotalAmount,
            Orders::ShippingAddress,
            Orders::PaymentMethod,
            Orders::Status,
            Orders::PaymentStatus,
            Orders::CreatedAt,
            Orders::UpdatedAt,
        ])
        .values_panic([
            order.user_id.into(),
            order.total_amount.minor_units().into(),
            order.shipping_address.as_str().into(),
            order.payment_method.as_str().into(),
            order.status.as_str().into(),
            order.payment_status.as_str().into(),
            created_at.clone().into(),
            created_at.into(),
        ])
        .returning_col(Orders::Id)
        .to_owned()
}

/// Multi-row line item insert; rows keep the slice order.
pub fn insert_line_items(order_id: OrderId, items: &[NewLineItem]) -> InsertStatement {
    let mut stmt = Query::insert();
    stmt.into_table(OrderItems::Table).columns([
        OrderItems::OrderId,
        OrderItems::ProductId,
        OrderItems::Quantity,
        OrderItems::Price,
    ]);
    for item in items {
        stmt.values_panic([
            order_id.into(),
            item.product_id.into(),
            i64::from(item.quantity).into(),
            item.unit_price.minor_units().into(),
        ]);
    }
    stmt
}

pub fn update_status(order_id: OrderId, update: &StatusUpdate) -> UpdateStatement {
    let mut stmt = Query::update();
    stmt.table(Orders::Table)
        .value(Orders::UpdatedAt, format_timestamp(&update.updated_at))
        .and_where(Expr::col(Orders::Id).eq(order_id));
    if let Some(status) = update.status {
        stmt.value(Orders::Status, status.as_str());
    }
    if let Some(payment_status) = update.payment_status {
        stmt.value(Orders::PaymentStatus, payment_status.as_str());
    }
    stmt
}

/// No-op write that takes the write lock on an order row.
pub fn touch_order(order_id: OrderId) -> UpdateStatement {
    Query::update()
        .table(Orders::Table)
        .value(Orders::Status, Expr::col(Orders::Status))
        .and_where(Expr::col(Orders::Id).eq(order_id))
        .to_owned()
}

fn order_columns(stmt: &mut SelectStatement) {
    stmt.columns([
        (Orders::Table, Orders::Id),
        (Orders::Table, Orders::UserId),
        (Orders::Table, Orders::TotalAmount),
        (Orders::Table, Orders::ShippingAddress),
        (Orders::Table, Orders::PaymentMethod),
        (Orders::Table, Orders::Status),
        (Orders::Table, Orders::PaymentStatus),
        (Orders::Table, Orders::CreatedAt),
        (Orders::Table, Orders::UpdatedAt),
    ]);
}

fn scope_filter(stmt: &mut SelectStatement, scope: OrderScope) {
    if let OrderScope::OwnedBy(user_id) = scope {
        stmt.and_where(Expr::col((Orders::Table, Orders::UserId)).eq(user_id));
    }
}

/// Order header visible under `scope`, optionally locked `FOR UPDATE`.
pub fn select_order(order_id: OrderId, scope: OrderScope, for_update: bool) -> SelectStatement {
    let mut stmt = Query::select();
    order_columns(&mut stmt);
    stmt.from(Orders::Table)
        .and_where(Expr::col((Orders::Table, Orders::Id)).eq(order_id));
    scope_filter(&mut stmt, scope);
    if for_update {
        stmt.lock(LockType::Update);
    }
    stmt
}

pub fn select_line_items(order_id: OrderId) -> SelectStatement {
    Query::select()
        .columns([
            OrderItems::Id,
            OrderItems::OrderId,
            OrderItems::ProductId,
            OrderItems::Quantity,
            OrderItems::Price,
        ])
        .from(OrderItems::Table)
        .and_where(Expr::col(OrderItems::OrderId).eq(order_id))
        .order_by(OrderItems::Id, SortOrder::Asc)
        .to_owned()
}

/// Order headers joined with the ordering user's contact details.
fn orders_with_customer() -> SelectStatement {
    let mut stmt = Query::select();
    order_columns(&mut stmt);
    stmt.expr_as(
        Expr::col((Users::Table, Users::FullName)),
        Alias::new("customer_name"),
    )
    .expr_as(
        Expr::col((Users::Table, Users::Email)),
        Alias::new("customer_email"),
    )
    .expr_as(
        Expr::col((Users::Table, Users::Phone)),
        Alias::new("customer_phone"),
    )
    .from(Orders::Table)
    .left_join(
        Users::Table,
        Expr::col((Orders::Table, Orders::UserId)).equals((Users::Table, Users::Id)),
    );
    stmt
}

pub fn select_order_with_customer(order_id: OrderId, scope: OrderScope) -> SelectStatement {
    let mut stmt = orders_with_customer();
    stmt.and_where(Expr::col((Orders::Table, Orders::Id)).eq(order_id));
    scope_filter(&mut stmt, scope);
    stmt
}

fn query_filter(stmt: &mut SelectStatement, query: &OrderQuery) {
    if let Some(user_id) = query.user_id {
        stmt.and_where(Expr::col((Orders::Table, Orders::UserId)).eq(user_id));
    }
    if let Some(status) = query.status {
        stmt.and_where(Expr::col((Orders::Table, Orders::Status)).eq(status.as_str()));
    }
}

/// One page of orders with customer contact, newest first.
pub fn select_order_page(query: &OrderQuery) -> SelectStatement {
    let mut stmt = orders_with_customer();
    query_filter(&mut stmt, query);
    stmt.order_by((Orders::Table, Orders::CreatedAt), SortOrder::Desc)
        .order_by((Orders::Table, Orders::Id), SortOrder::Desc)
        .limit(u64::from(query.page.limit))
        .offset(query.page.offset());
    stmt
}

/// Number of orders matching the listing filter, ignoring pagination.
pub fn count_orders(query: &OrderQuery) -> SelectStatement {
    let mut stmt = Query::select();
    stmt.expr_as(
        Func::count(Expr::col((Orders::Table, Orders::Id))),
        Alias::new("total"),
    )
    .from(Orders::Table);
    query_filter(&mut stmt, query);
    stmt
}

/// Line items of several orders with product name and images.
pub fn select_line_item_details(order_ids: &[OrderId]) -> SelectStatement {
    Query::select()
        .columns([
            (OrderItems::Table, OrderItems::Id),
            (OrderItems::Table, OrderItems::OrderId),
            (OrderItems::Table, OrderItems::ProductId),
            (OrderItems::Table, OrderItems::Quantity),
            (OrderItems::Table, OrderItems::Price),
        ])
        .expr_as(
            Expr::col((Products::Table, Products::Name)),
            Alias::new("product_name"),
        )
        .expr_as(
            Expr::col((Products::Table, Products::Images)),
            Alias::new("images"),
        )
        .from(OrderItems::Table)
        .left_join(
            Products::Table,
            Expr::col((OrderItems::Table, OrderItems::ProductId))
                .equals((Products::Table, Products::Id)),
        )
        .and_where(
            Expr::col((OrderItems::Table, OrderItems::OrderId)).is_in(order_ids.iter().copied()),
        )
        .order_by((OrderItems::Table, OrderItems::OrderId), SortOrder::Asc)
        .order_by((OrderItems::Table, OrderItems::Id), SortOrder::Asc)
        .to_owned()
}
