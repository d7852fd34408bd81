//! Abstract interfaces for the order placement core.
//!
//! These traits define the contracts for:
//! - The product catalog (prices, stock reservation and restoration)
//! - The order store (order headers, line items, status)
//! - The database that hands out transactions spanning both

pub mod catalog;
pub mod order_database;
pub mod order_store;

pub use catalog::ProductCatalog;
pub use order_database::{OrderDatabase, Result, StorageError, StoreTransaction};
pub use order_store::OrderStore;
