//! storefront-migrate: apply order storage migrations
//!
//! Loads configuration, connects to the configured database and brings its
//! schema up to date. Safe to run repeatedly.
//!
//! ## Configuration
//! - First argument: path to a YAML config file (optional)
//! - STOREFRONT_CONFIG: config file path when no argument is given
//! - STOREFRONT__STORAGE__TYPE, STOREFRONT__STORAGE__SQLITE__PATH, ...: overrides
//! - STOREFRONT_LOG: log filter (default: info)

use tracing::{error, info};

use storefront_orders::config::Config;
use storefront_orders::storage::init_storage;
use storefront_orders::utils::bootstrap::init_tracing;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let path = std::env::args().nth(1);
    let config = Config::load(path.as_deref()).inspect_err(|e| {
        error!(error = %e, "Failed to load configuration");
    })?;

    init_storage(&config.storage).await.inspect_err(|e| {
        error!(error = %e, "Migration failed");
    })?;

    info!(storage = ?config.storage.storage_type, "storefront-migrate finished");
    Ok(())
}
