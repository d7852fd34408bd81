//! Backend factory for interface tests.
//!
//! Provides a unified interface to create and seed order databases based on
//! environment configuration.

use std::env;
use std::sync::Arc;

use storefront_orders::interfaces::OrderDatabase;
use storefront_orders::model::{Customer, Money, Product, ProductId, ProductStatus};
use storefront_orders::storage::MockOrderDatabase;

#[cfg(feature = "sqlite")]
use storefront_orders::config::StorageConfig;
#[cfg(feature = "sqlite")]
use storefront_orders::storage::SqliteOrderDatabase;

#[cfg(feature = "postgres")]
use storefront_orders::storage::PostgresOrderDatabase;

/// Storage backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Sqlite,
    Postgres,
}

impl StorageBackend {
    pub fn from_env() -> Self {
        match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "memory".to_string())
            .to_lowercase()
            .as_str()
        {
            "sqlite" => StorageBackend::Sqlite,
            "postgres" => StorageBackend::Postgres,
            _ => StorageBackend::Memory,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StorageBackend::Memory => "memory",
            StorageBackend::Sqlite => "sqlite",
            StorageBackend::Postgres => "postgres",
        }
    }
}

/// Direct access to the backing tables for seeding and inspection.
enum Tables {
    Memory(Arc<MockOrderDatabase>),
    #[cfg(feature = "sqlite")]
    Sqlite(sqlx::SqlitePool),
    #[cfg(feature = "postgres")]
    Postgres(sqlx::PgPool),
}

/// Holds the order database for a backend.
pub struct StorageContext {
    pub db: Arc<dyn OrderDatabase>,
    tables: Tables,
}

impl std::fmt::Debug for StorageContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageContext")
            .field("db", &"<dyn OrderDatabase>")
            .finish()
    }
}

impl StorageContext {
    /// Create a fresh, empty storage context for the configured backend.
    pub async fn new(backend: StorageBackend) -> Self {
        match backend {
            StorageBackend::Memory => {
                let db = Arc::new(MockOrderDatabase::new());
                StorageContext {
                    db: db.clone(),
                    tables: Tables::Memory(db),
                }
            }
            StorageBackend::Sqlite => Self::create_sqlite().await,
            StorageBackend::Postgres => Self::create_postgres().await,
        }
    }

    #[cfg(feature = "sqlite")]
    async fn create_sqlite() -> Self {
        let mut config = StorageConfig::default();
        config.sqlite.path = ":memory:".to_string();

        let db = SqliteOrderDatabase::connect(&config)
            .await
            .expect("Failed to create SQLite pool");
        db.migrate().await.expect("Failed to run migrations");

        let pool = db.pool().clone();
        StorageContext {
            db: Arc::new(db),
            tables: Tables::Sqlite(pool),
        }
    }

    #[cfg(not(feature = "sqlite"))]
    async fn create_sqlite() -> Self {
        panic!("SQLite feature not enabled. Build with --features sqlite");
    }

    /// Connects to `POSTGRES_TEST_URL` and empties the order tables.
    #[cfg(feature = "postgres")]
    async fn create_postgres() -> Self {
        let url = env::var("POSTGRES_TEST_URL")
            .expect("POSTGRES_TEST_URL must point at a disposable database");

        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await
            .expect("Failed to connect to PostgreSQL");
        let db = PostgresOrderDatabase::new(pool.clone(), 5_000);
        db.migrate().await.expect("Failed to run migrations");

        sqlx::query("TRUNCATE order_items, orders, products, users RESTART IDENTITY")
            .execute(&pool)
            .await
            .expect("Failed to truncate tables");

        StorageContext {
            db: Arc::new(db),
            tables: Tables::Postgres(pool),
        }
    }

    #[cfg(not(feature = "postgres"))]
    async fn create_postgres() -> Self {
        panic!("PostgreSQL feature not enabled. Build with --features postgres");
    }

    pub async fn add_customer(&self, customer: Customer) {
        match &self.tables {
            Tables::Memory(db) => db.insert_user(customer).await,
            #[cfg(feature = "sqlite")]
            Tables::Sqlite(pool) => {
                sqlx::query("INSERT INTO users (id, full_name, email, phone) VALUES (?, ?, ?, ?)")
                    .bind(customer.user_id)
                    .bind(&customer.full_name)
                    .bind(&customer.email)
                    .bind(&customer.phone)
                    .execute(pool)
                    .await
                    .expect("Failed to insert user");
            }
            #[cfg(feature = "postgres")]
            Tables::Postgres(pool) => {
                sqlx::query(
                    "INSERT INTO users (id, full_name, email, phone) VALUES ($1, $2, $3, $4)",
                )
                .bind(customer.user_id)
                .bind(&customer.full_name)
                .bind(&customer.email)
                .bind(&customer.phone)
                .execute(pool)
                .await
                .expect("Failed to insert user");
            }
        }
    }

    pub async fn add_product(&self, product: Product, images: Vec<String>) {
        match &self.tables {
            Tables::Memory(db) => db.insert_product_with_images(product, images).await,
            #[cfg(feature = "sqlite")]
            Tables::Sqlite(pool) => {
                sqlx::query(
                    "INSERT INTO products \
                     (id, name, price, discount_price, stock_quantity, status, images) \
                     VALUES (?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(product.id)
                .bind(&product.name)
                .bind(product.price.minor_units())
                .bind(product.discount_price.map(Money::minor_units))
                .bind(i64::from(product.stock_quantity))
                .bind(product.status.as_str())
                .bind(serde_json::to_string(&images).expect("images serialize"))
                .execute(pool)
                .await
                .expect("Failed to insert product");
            }
            #[cfg(feature = "postgres")]
            Tables::Postgres(pool) => {
                sqlx::query(
                    "INSERT INTO products \
                     (id, name, price, discount_price, stock_quantity, status, images) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7)",
                )
                .bind(product.id)
                .bind(&product.name)
                .bind(product.price.minor_units())
                .bind(product.discount_price.map(Money::minor_units))
                .bind(i64::from(product.stock_quantity))
                .bind(product.status.as_str())
                .bind(serde_json::to_string(&images).expect("images serialize"))
                .execute(pool)
                .await
                .expect("Failed to insert product");
            }
        }
    }

    pub async fn deactivate_product(&self, id: ProductId) {
        match &self.tables {
            Tables::Memory(db) => db.set_product_status(id, ProductStatus::Inactive).await,
            #[cfg(feature = "sqlite")]
            Tables::Sqlite(pool) => {
                sqlx::query("UPDATE products SET status = 'inactive' WHERE id = ?")
                    .bind(id)
                    .execute(pool)
                    .await
                    .expect("Failed to deactivate product");
            }
            #[cfg(feature = "postgres")]
            Tables::Postgres(pool) => {
                sqlx::query("UPDATE products SET status = 'inactive' WHERE id = $1")
                    .bind(id)
                    .execute(pool)
                    .await
                    .expect("Failed to deactivate product");
            }
        }
    }

    pub async fn stock(&self, id: ProductId) -> u32 {
        let stock = match &self.tables {
            Tables::Memory(db) => db.stock(id).await.map(i64::from),
            #[cfg(feature = "sqlite")]
            Tables::Sqlite(pool) => {
                sqlx::query_scalar::<_, i64>("SELECT stock_quantity FROM products WHERE id = ?")
                    .bind(id)
                    .fetch_optional(pool)
                    .await
                    .expect("Failed to read stock")
            }
            #[cfg(feature = "postgres")]
            Tables::Postgres(pool) => {
                sqlx::query_scalar::<_, i64>("SELECT stock_quantity FROM products WHERE id = $1")
                    .bind(id)
                    .fetch_optional(pool)
                    .await
                    .expect("Failed to read stock")
            }
        };
        let stock = stock.unwrap_or_else(|| panic!("product {id} does not exist"));
        u32::try_from(stock).expect("stock must never be negative")
    }

    pub async fn order_count(&self) -> u64 {
        let count = match &self.tables {
            Tables::Memory(db) => db.order_count().await as i64,
            #[cfg(feature = "sqlite")]
            Tables::Sqlite(pool) => sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders")
                .fetch_one(pool)
                .await
                .expect("Failed to count orders"),
            #[cfg(feature = "postgres")]
            Tables::Postgres(pool) => sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders")
                .fetch_one(pool)
                .await
                .expect("Failed to count orders"),
        };
        count as u64
    }
}
