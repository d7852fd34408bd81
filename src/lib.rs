//! Storefront order placement.
//!
//! Places orders against live catalog prices and stock, reserving inventory
//! in the same database transaction that records the order, and returns the
//! reserved stock when an order is cancelled.
//!
//! The [`services::OrderService`] runs on any [`interfaces::OrderDatabase`]:
//! SQLite (default feature), PostgreSQL (`postgres` feature) or the
//! in-memory [`storage::MockOrderDatabase`].

pub mod config;
pub mod interfaces;
pub mod model;
pub mod services;
pub mod storage;
pub mod utils;
