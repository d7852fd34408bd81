//! Interface tests for the order service using Cucumber.
//!
//! The same scenarios run against every storage backend. Select one via
//! environment variable:
//!
//! ```bash
//! # In-memory (default)
//! cargo test --test interfaces
//!
//! # SQLite
//! STORAGE_BACKEND=sqlite cargo test --test interfaces --features sqlite
//!
//! # PostgreSQL (needs a disposable database)
//! STORAGE_BACKEND=postgres POSTGRES_TEST_URL=postgres://... \
//!     cargo test --test interfaces --features postgres
//! ```
//!
//! Scenarios run one at a time since the PostgreSQL backend truncates
//! shared tables.

mod backend;
mod steps;

use cucumber::World;
use steps::orders::OrderWorld;

#[tokio::main]
async fn main() {
    println!("\n=== Running Order Placement Interface Tests ===\n");
    OrderWorld::cucumber()
        .max_concurrent_scenarios(1)
        .fail_on_skipped()
        .run("tests/interfaces/features/order_placement.feature")
        .await;

    println!("\n=== Running Order Cancellation Interface Tests ===\n");
    OrderWorld::cucumber()
        .max_concurrent_scenarios(1)
        .fail_on_skipped()
        .run("tests/interfaces/features/order_cancellation.feature")
        .await;
}
