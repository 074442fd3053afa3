//! Database bootstrap.
//!
//! Owns pool construction, schema creation and the optional
//! reset-on-startup. The gateway must not accept traffic until `prepare` has
//! returned: schema first, then the CSV catalog bootstrap, then the HTTP
//! listener and the scheduler.
//!
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::config::GatewayConfig;
use crate::error::Result;

/// New orders draw ids from a sequence that starts above the legacy dataset's
/// highest order id, so migrated rows and new rows never collide.
pub const ORDER_ID_SEQUENCE_START: i64 = 3_422_000;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id                               BIGSERIAL PRIMARY KEY,
    external_id                      UUID NOT NULL UNIQUE,
    first_name                       TEXT NOT NULL,
    last_name                        TEXT NOT NULL,
    email                            TEXT NOT NULL UNIQUE,
    password_hash                    TEXT NOT NULL,
    phone                            TEXT,
    street                           TEXT,
    city                             TEXT,
    postal_code                      TEXT,
    country                          TEXT,
    last_login_at                    TIMESTAMPTZ,
    last_notifications_viewed_at     TIMESTAMPTZ NOT NULL DEFAULT now(),
    days_between_order_notifications INT NOT NULL DEFAULT 7
        CHECK (days_between_order_notifications BETWEEN 1 AND 365),
    order_notifications_start_at     TIMESTAMPTZ NOT NULL DEFAULT now(),
    order_notifications_next_at      TIMESTAMPTZ NOT NULL DEFAULT now(),
    pending_order_notification       BOOLEAN NOT NULL DEFAULT FALSE,
    order_notifications_via_email    BOOLEAN NOT NULL DEFAULT FALSE,
    last_notification_sent_at        TIMESTAMPTZ,
    created_at                       TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at                       TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS idx_users_external_id ON users (external_id);
CREATE INDEX IF NOT EXISTS idx_users_notifications_due
    ON users (order_notifications_next_at);

CREATE TABLE IF NOT EXISTS departments (
    department_id INT PRIMARY KEY,
    department    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS aisles (
    aisle_id INT PRIMARY KEY,
    aisle    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS products (
    product_id    INT PRIMARY KEY,
    product_name  TEXT NOT NULL,
    aisle_id      INT NOT NULL REFERENCES aisles (aisle_id),
    department_id INT NOT NULL REFERENCES departments (department_id)
);

CREATE TABLE IF NOT EXISTS product_enriched (
    product_id  INT PRIMARY KEY REFERENCES products (product_id),
    description TEXT,
    price       NUMERIC(12,2) CHECK (price >= 0),
    image_url   TEXT
);

CREATE TABLE IF NOT EXISTS carts (
    id         BIGSERIAL PRIMARY KEY,
    user_id    BIGINT NOT NULL UNIQUE REFERENCES users (id) ON DELETE CASCADE,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS cart_items (
    cart_id           BIGINT NOT NULL REFERENCES carts (id) ON DELETE CASCADE,
    product_id        INT NOT NULL REFERENCES products (product_id),
    quantity          INT NOT NULL CHECK (quantity >= 1),
    add_to_cart_order INT NOT NULL,
    reordered         BOOLEAN NOT NULL DEFAULT FALSE,
    PRIMARY KEY (cart_id, product_id)
);

CREATE SEQUENCE IF NOT EXISTS orders_id_seq START WITH 3422000;

CREATE TABLE IF NOT EXISTS orders (
    id              BIGINT PRIMARY KEY DEFAULT nextval('orders_id_seq'),
    user_id         BIGINT REFERENCES users (id) ON DELETE SET NULL,
    order_number    INT NOT NULL,
    status          TEXT NOT NULL DEFAULT 'pending',
    delivery_name   TEXT,
    phone           TEXT,
    street          TEXT,
    city            TEXT,
    postal_code     TEXT,
    country         TEXT,
    tracking_number TEXT,
    carrier         TEXT,
    tracking_url    TEXT,
    invoice         TEXT,
    total_items     INT NOT NULL DEFAULT 0,
    total_price     NUMERIC(12,2) NOT NULL DEFAULT 0,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at      TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS idx_orders_user_id ON orders (user_id);

CREATE TABLE IF NOT EXISTS order_items (
    order_id          BIGINT NOT NULL REFERENCES orders (id) ON DELETE CASCADE,
    product_id        INT NOT NULL REFERENCES products (product_id),
    quantity          INT NOT NULL CHECK (quantity >= 1),
    add_to_cart_order INT NOT NULL,
    reordered         BOOLEAN NOT NULL DEFAULT FALSE,
    PRIMARY KEY (order_id, product_id)
);

CREATE TABLE IF NOT EXISTS order_status_history (
    history_id BIGSERIAL PRIMARY KEY,
    order_id   BIGINT NOT NULL REFERENCES orders (id) ON DELETE CASCADE,
    status     TEXT NOT NULL,
    changed_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    changed_by TEXT,
    note       TEXT
);

CREATE INDEX IF NOT EXISTS idx_order_status_history_order_id
    ON order_status_history (order_id);
CREATE INDEX IF NOT EXISTS idx_order_status_history_changed_at
    ON order_status_history (changed_at);
"#;

const DROP_ALL: &str = r#"
DROP TABLE IF EXISTS order_status_history CASCADE;
DROP TABLE IF EXISTS order_items CASCADE;
DROP TABLE IF EXISTS orders CASCADE;
DROP SEQUENCE IF EXISTS orders_id_seq;
DROP TABLE IF EXISTS cart_items CASCADE;
DROP TABLE IF EXISTS carts CASCADE;
DROP TABLE IF EXISTS product_enriched CASCADE;
DROP TABLE IF EXISTS products CASCADE;
DROP TABLE IF EXISTS aisles CASCADE;
DROP TABLE IF EXISTS departments CASCADE;
DROP TABLE IF EXISTS users CASCADE;
"#;

/// Connects a pool against the configured `DATABASE_URL`.
///
/// # Arguments
///
/// * `config` - The gateway configuration holding the connection string.
///
/// # Returns
///
/// A connected `PgPool`.
///
pub async fn connect(config: &GatewayConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(config.database_url().expose_secret())
        .await?;
    Ok(pool)
}

/// Prepares the schema: optional reset, then idempotent creation.
///
/// Runs before the gateway accepts any traffic. With
/// `RESET_DATABASE_ON_STARTUP` set, all schemas are dropped and recreated
/// first; otherwise existing tables are left untouched.
pub async fn prepare(pool: &PgPool, config: &GatewayConfig) -> Result<()> {
    if config.reset_database_on_startup {
        warn!("RESET_DATABASE_ON_STARTUP set; dropping all schemas");
        sqlx::raw_sql(DROP_ALL).execute(pool).await?;
    }
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    info!("database schema ready");
    Ok(())
}

/// Liveness probe used by the `/health` endpoint.
pub async fn ping(pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
