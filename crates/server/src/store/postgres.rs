//! `PostgreSQL` store.
//!
//! Users and orders carry document-shaped fields (cart, reset token, order
//! lines) as JSONB so the whole record stays the unit of consistency; the
//! remaining columns are typed. All saves are single-statement upserts.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::Row;
use uuid::Uuid;

use tangelo_core::{Email, ProductId, UserId};

use super::{Store, StoreError};
use crate::models::{Cart, Order, OrderLine, Product, ResetToken, User};

/// A [`Store`] backed by `PostgreSQL`.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect to the database with sensible pool defaults.
    pub async fn connect(database_url: &SecretString) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .min_connections(2)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url.expose_secret())
            .await?;

        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the schema if it does not exist yet.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id            UUID PRIMARY KEY,
    name          TEXT NOT NULL,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    product_ids   UUID[] NOT NULL DEFAULT '{}',
    cart          JSONB NOT NULL DEFAULT '{"items": []}',
    reset_token   JSONB
);

CREATE TABLE IF NOT EXISTS products (
    id          UUID PRIMARY KEY,
    name        TEXT NOT NULL,
    description TEXT NOT NULL,
    price       NUMERIC NOT NULL,
    image_url   TEXT,
    creator     UUID NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL,
    updated_at  TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS orders (
    id                UUID PRIMARY KEY,
    user_id           UUID NOT NULL,
    user_email        TEXT NOT NULL,
    lines             JSONB NOT NULL,
    total             NUMERIC NOT NULL,
    payment_intent_id TEXT NOT NULL,
    created_at        TIMESTAMPTZ NOT NULL
);

CREATE INDEX IF NOT EXISTS orders_user_id_idx ON orders (user_id);
"#;

fn user_from_row(row: &PgRow) -> Result<User, StoreError> {
    let email: String = row.try_get("email")?;
    let email = Email::parse(&email)
        .map_err(|e| StoreError::DataCorruption(format!("invalid email in database: {e}")))?;

    let product_ids: Vec<Uuid> = row.try_get("product_ids")?;
    let Json(cart): Json<Cart> = row.try_get("cart")?;
    let reset_token: Option<Json<ResetToken>> = row.try_get("reset_token")?;

    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email,
        password_hash: row.try_get("password_hash")?,
        product_ids: product_ids.into_iter().map(ProductId::from_uuid).collect(),
        cart,
        reset_token: reset_token.map(|Json(t)| t),
    })
}

fn product_from_row(row: &PgRow) -> Result<Product, StoreError> {
    Ok(Product {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        price: row.try_get::<Decimal, _>("price")?,
        image_url: row.try_get("image_url")?,
        creator: row.try_get("creator")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

fn order_from_row(row: &PgRow) -> Result<Order, StoreError> {
    let email: String = row.try_get("user_email")?;
    let user_email = Email::parse(&email)
        .map_err(|e| StoreError::DataCorruption(format!("invalid email in database: {e}")))?;

    let Json(lines): Json<Vec<OrderLine>> = row.try_get("lines")?;

    Ok(Order {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        user_email,
        lines,
        total: row.try_get::<Decimal, _>("total")?,
        payment_intent_id: row.try_get("payment_intent_id")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

#[async_trait]
impl Store for PgStore {
    async fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, StoreError> {
        let row = sqlx::query("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_user_by_reset_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query("SELECT * FROM users WHERE reset_token->>'value' = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn save_user(&self, user: &User) -> Result<(), StoreError> {
        let product_ids: Vec<Uuid> = user.product_ids.iter().map(|p| p.as_uuid()).collect();

        sqlx::query(
            r"
            INSERT INTO users (id, name, email, password_hash, product_ids, cart, reset_token)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                email = EXCLUDED.email,
                password_hash = EXCLUDED.password_hash,
                product_ids = EXCLUDED.product_ids,
                cart = EXCLUDED.cart,
                reset_token = EXCLUDED.reset_token
            ",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&product_ids)
        .bind(Json(&user.cart))
        .bind(user.reset_token.as_ref().map(Json))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return StoreError::Conflict("email already exists".to_owned());
            }
            StoreError::Database(e)
        })?;

        Ok(())
    }

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(product_from_row).transpose()
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query("SELECT * FROM products ORDER BY created_at")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(product_from_row).collect()
    }

    async fn save_product(&self, product: &Product) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO products (id, name, description, price, image_url, creator, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                price = EXCLUDED.price,
                image_url = EXCLUDED.image_url,
                updated_at = EXCLUDED.updated_at
            ",
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.image_url)
        .bind(product.creator)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(order_from_row).collect()
    }

    async fn save_order(&self, order: &Order) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO orders (id, user_id, user_email, lines, total, payment_intent_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(order.id)
        .bind(order.user_id)
        .bind(&order.user_email)
        .bind(Json(&order.lines))
        .bind(order.total)
        .bind(&order.payment_intent_id)
        .bind(order.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
