//! Service implementations.

pub mod orders;

pub use orders::{parse_payment_method, OrderError, OrderService};
