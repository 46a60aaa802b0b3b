use crate::config::AppConfig;
use crate::errors::ServiceError;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use std::time::Duration;
use tracing::{debug, info};

/// Type alias for a database connection pool
pub type DbPool = DatabaseConnection;

/// Configuration for database connection
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections
    pub max_connections: u32,
    /// Minimum number of connections
    pub min_connections: u32,
    /// Connection timeout duration
    pub connect_timeout: Duration,
    /// Idle timeout duration
    pub idle_timeout: Duration,
    /// Acquire connection timeout
    pub acquire_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            acquire_timeout: Duration::from_secs(8),
        }
    }
}

/// Establishes a connection pool to the database
pub async fn establish_connection(database_url: &str) -> Result<DbPool, DbErr> {
    let config = DbConfig {
        url: database_url.to_string(),
        ..Default::default()
    };

    establish_connection_with_config(&config).await
}

/// Establishes a connection pool using settings from the application config
pub async fn establish_connection_from_app_config(cfg: &AppConfig) -> Result<DbPool, DbErr> {
    let config = DbConfig {
        url: cfg.database_url.clone(),
        max_connections: cfg.db_max_connections,
        min_connections: cfg.db_min_connections,
        ..Default::default()
    };

    establish_connection_with_config(&config).await
}

/// Establishes a connection pool to the database with custom configuration
pub async fn establish_connection_with_config(config: &DbConfig) -> Result<DbPool, DbErr> {
    debug!("Configuring database connection with: {:?}", config);

    let mut opt = ConnectOptions::new(config.url.clone());

    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(config.connect_timeout)
        .idle_timeout(config.idle_timeout)
        .acquire_timeout(config.acquire_timeout)
        .sqlx_logging(false);

    let pool = Database::connect(opt).await?;
    info!("Database connection established");

    Ok(pool)
}

/// Idempotent DDL for the tables the engine owns. The statements are
/// written to run on both PostgreSQL and SQLite (tests).
const SCHEMA_STATEMENTS: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS suppliers (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        contact_email TEXT,
        phone TEXT,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL,
        updated_at TIMESTAMP WITH TIME ZONE
    )"#,
    r#"CREATE TABLE IF NOT EXISTS products (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        sku TEXT NOT NULL,
        price NUMERIC NOT NULL,
        supplier_id UUID,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL,
        updated_at TIMESTAMP WITH TIME ZONE
    )"#,
    r#"CREATE TABLE IF NOT EXISTS inventory_items (
        id UUID PRIMARY KEY,
        product_id UUID NOT NULL,
        quantity INTEGER NOT NULL,
        threshold INTEGER NOT NULL,
        reorder_level INTEGER NOT NULL,
        reorder_quantity INTEGER NOT NULL,
        safety_stock INTEGER NOT NULL,
        price NUMERIC NOT NULL,
        demand_label TEXT,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL,
        updated_at TIMESTAMP WITH TIME ZONE
    )"#,
    r#"CREATE TABLE IF NOT EXISTS orders (
        id UUID PRIMARY KEY,
        order_number TEXT NOT NULL,
        order_type TEXT NOT NULL,
        status TEXT NOT NULL,
        supplier_id UUID,
        customer_id UUID,
        total_amount NUMERIC NOT NULL,
        payment_status TEXT NOT NULL,
        rejection_reason TEXT,
        gateway_order_ref TEXT,
        gateway_payment_ref TEXT,
        gateway_signature TEXT,
        notes TEXT,
        actual_delivery_date TIMESTAMP WITH TIME ZONE,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL,
        updated_at TIMESTAMP WITH TIME ZONE,
        version INTEGER NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS order_items (
        id UUID PRIMARY KEY,
        order_id UUID NOT NULL,
        product_id UUID NOT NULL,
        quantity INTEGER NOT NULL,
        requested_price NUMERIC NOT NULL,
        proposed_price NUMERIC,
        negotiation_status TEXT NOT NULL,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL,
        updated_at TIMESTAMP WITH TIME ZONE
    )"#,
    r#"CREATE TABLE IF NOT EXISTS order_status_history (
        id UUID PRIMARY KEY,
        order_id UUID NOT NULL,
        status TEXT NOT NULL,
        changed_by TEXT NOT NULL,
        comments TEXT,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS quality_checks (
        id UUID PRIMARY KEY,
        order_id UUID NOT NULL,
        checked_by TEXT NOT NULL,
        status TEXT NOT NULL,
        comments TEXT,
        parameters JSON,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS sales_transactions (
        id UUID PRIMARY KEY,
        product_id UUID NOT NULL,
        quantity INTEGER NOT NULL,
        total NUMERIC NOT NULL,
        cashier_id TEXT NOT NULL,
        transaction_type TEXT NOT NULL,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_orders_gateway_order_ref ON orders (gateway_order_ref)",
    "CREATE INDEX IF NOT EXISTS idx_order_items_order_id ON order_items (order_id)",
    "CREATE INDEX IF NOT EXISTS idx_order_status_history_order_id ON order_status_history (order_id)",
    "CREATE INDEX IF NOT EXISTS idx_inventory_items_product_id ON inventory_items (product_id)",
];

/// Create the schema if it does not exist yet.
pub async fn bootstrap_schema(db: &DbPool) -> Result<(), ServiceError> {
    for sql in SCHEMA_STATEMENTS {
        db.execute_unprepared(sql).await?;
    }
    info!("Schema bootstrap complete");
    Ok(())
}
