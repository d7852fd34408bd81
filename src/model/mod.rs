//! Order and catalog data model.
//!
//! Plain data types shared by the service and the storage backends. All
//! amounts are integer minor currency units (see [`Money`]).

/// Implements `as_str`, `Display` and `FromStr` for a fieldless enum stored
/// as a lowercase string column.
macro_rules! string_enum {
    ($ty:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            /// All variants, in declaration order.
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            /// Column representation.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $ty {
            type Err = crate::model::UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($ty::$variant),)+
                    other => Err(crate::model::UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

mod money;
mod order;
mod product;

pub use money::Money;
pub use order::{
    Customer, LineItem, LineItemDetails, LineRequest, NewLineItem, NewOrder, Order, OrderDetails,
    OrderPage, OrderQuery, OrderScope, OrderStatus, PageRequest, Pagination, PaymentMethod,
    PaymentStatus, PlaceOrder, Requester, StatusUpdate,
};
pub use product::{Product, ProductStatus};

/// Product identifier (`products.id`).
pub type ProductId = i64;
/// Order identifier (`orders.id`).
pub type OrderId = i64;
/// User identifier (`users.id`).
pub type UserId = i64;

/// Error returned when parsing an enumerated column value fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value: {value:?}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}
