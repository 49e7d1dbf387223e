//! In-memory store.
//!
//! Backs the test suite and credential-less local development. Records are
//! cloned on the way in and out, so callers never observe aliased state.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use tangelo_core::{Email, OrderId, ProductId, UserId};

use super::{Store, StoreError};
use crate::models::{Order, Product, User};

/// A [`Store`] holding everything in process memory.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<UserId, User>>,
    products: RwLock<HashMap<ProductId, Product>>,
    orders: RwLock<HashMap<OrderId, Order>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| &u.email == email)
            .cloned())
    }

    async fn find_user_by_reset_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| {
                u.reset_token
                    .as_ref()
                    .is_some_and(|t| t.value == token)
            })
            .cloned())
    }

    async fn save_user(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        let duplicate_email = users
            .values()
            .any(|u| u.email == user.email && u.id != user.id);
        if duplicate_email {
            return Err(StoreError::Conflict("email already exists".to_owned()));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let mut products: Vec<Product> = self.products.read().await.values().cloned().collect();
        products.sort_by_key(|p| p.created_at);
        Ok(products)
    }

    async fn save_product(&self, product: &Product) -> Result<(), StoreError> {
        self.products
            .write()
            .await
            .insert(product.id, product.clone());
        Ok(())
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, StoreError> {
        Ok(self.products.write().await.remove(&id).is_some())
    }

    async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, StoreError> {
        let mut orders: Vec<Order> = self
            .orders
            .read()
            .await
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.created_at);
        Ok(orders)
    }

    async fn save_order(&self, order: &Order) -> Result<(), StoreError> {
        self.orders.write().await.insert(order.id, order.clone());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn user(email: &str) -> User {
        User::new(
            "Test".to_owned(),
            Email::parse(email).unwrap(),
            "hash".to_owned(),
        )
    }

    #[tokio::test]
    async fn save_and_find_user_by_email() {
        let store = MemoryStore::new();
        let u = user("a@x.com");
        store.save_user(&u).await.unwrap();

        let found = store
            .find_user_by_email(&Email::parse("a@x.com").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, u.id);
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = MemoryStore::new();
        store.save_user(&user("a@x.com")).await.unwrap();

        let err = store.save_user(&user("a@x.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn resaving_same_user_is_an_update() {
        let store = MemoryStore::new();
        let mut u = user("a@x.com");
        store.save_user(&u).await.unwrap();

        u.name = "Renamed".to_owned();
        store.save_user(&u).await.unwrap();

        let found = store.find_user(u.id).await.unwrap().unwrap();
        assert_eq!(found.name, "Renamed");
    }

    #[tokio::test]
    async fn delete_product_reports_existence() {
        let store = MemoryStore::new();
        let id = ProductId::generate();
        assert!(!store.delete_product(id).await.unwrap());
    }
}
