//! Relational store: connection pool, per-request sessions and schema bootstrap

use std::str::FromStr;

use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};

use crate::config::DatabaseConfig;

/// Tables are created only when missing; existing data is left untouched.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS bins (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        bin_identifier TEXT NOT NULL UNIQUE,
        location TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'Active' CHECK (status IN ('Active', 'Deleted')),
        last_maintenance TEXT,
        air_quality_status TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sensors (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        bin_id INTEGER NOT NULL REFERENCES bins (id),
        sensor_name TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sensor_readings (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        sensor_id INTEGER NOT NULL REFERENCES sensors (id) ON DELETE CASCADE,
        reading_value REAL NOT NULL,
        reading_timestamp TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS contact_messages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        email TEXT NOT NULL,
        message TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_sensors_bin ON sensors (bin_id)",
    "CREATE INDEX IF NOT EXISTS idx_readings_sensor_time ON sensor_readings (sensor_id, reading_timestamp)",
];

/// Handle to the relational store.
///
/// Cloning is cheap; every clone shares the same pool. Requests never share a
/// session: each one takes its own connection or transaction from here.
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Build a store from configuration.
    ///
    /// Connections are opened lazily so an unreachable store surfaces as a
    /// per-request connection error rather than a startup failure.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(config.acquire_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_lazy_with(options);

        tracing::debug!(
            "Store configured for {} (max {} connections)",
            config.url,
            config.max_connections
        );
        Ok(Self { pool })
    }

    /// Private in-memory store with the schema already applied.
    ///
    /// A single connection is kept open for the lifetime of the pool, since an
    /// in-memory SQLite database disappears with its last connection.
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create any missing tables and indexes
    pub async fn init_schema(&self) -> Result<(), sqlx::Error> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        tracing::debug!("Schema ready ({} statements)", SCHEMA.len());
        Ok(())
    }

    /// Session for a read request
    pub async fn acquire(&self) -> Result<PoolConnection<Sqlite>, sqlx::Error> {
        self.pool.acquire().await
    }

    /// Session for a write request. Dropping it without commit rolls back.
    ///
    /// The write lock is taken up front, so concurrent writers queue on the
    /// busy timeout instead of failing when a read inside the transaction
    /// has to be upgraded to a write.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
        self.pool.begin_with("BEGIN IMMEDIATE").await
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
