//! Persistence capability.
//!
//! The service layer treats storage as a capability: find-by-id,
//! find-by-query, save, delete. [`Store`] is the seam; [`MemoryStore`]
//! backs tests and credential-less development, [`PgStore`] backs
//! production.
//!
//! Saves are whole-record upserts. The user record (with its embedded cart
//! and reset token) is the unit of consistency: concurrent saves of the
//! same record are last-write-wins.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use thiserror::Error;

use tangelo_core::{Email, ProductId, UserId};

use crate::models::{Order, Product, User};

/// Errors surfaced by a store implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored record could not be decoded into its domain type.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// A uniqueness constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),
}

/// Storage capability for users, products, and orders.
#[async_trait]
pub trait Store: Send + Sync {
    // Users

    async fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError>;

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, StoreError>;

    /// Look up the user holding an outstanding reset token with this value.
    async fn find_user_by_reset_token(&self, token: &str) -> Result<Option<User>, StoreError>;

    /// Upsert the whole user record.
    async fn save_user(&self, user: &User) -> Result<(), StoreError>;

    // Products

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    async fn list_products(&self) -> Result<Vec<Product>, StoreError>;

    /// Upsert the whole product record.
    async fn save_product(&self, product: &Product) -> Result<(), StoreError>;

    /// Delete a product. Returns `false` if it did not exist.
    async fn delete_product(&self, id: ProductId) -> Result<bool, StoreError>;

    // Orders

    async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, StoreError>;

    /// Persist a new order. Orders are never updated afterwards.
    async fn save_order(&self, order: &Order) -> Result<(), StoreError>;
}
