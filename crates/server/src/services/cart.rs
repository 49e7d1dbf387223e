//! Cart service: per-user cart mutations and resolution against live
//! product data.

use serde::Serialize;

use tangelo_core::{ProductId, UserId};

use super::require_user;
use crate::error::{AppError, Result};
use crate::models::{Cart, Product};
use crate::store::Store;

/// A cart item joined with its live product record.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedCartItem {
    /// The live product.
    pub product: Product,
    /// Selected quantity.
    pub quantity: u32,
}

/// A cart with every surviving item resolved for display.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedCart {
    /// Resolved items. Items whose product was deleted are omitted.
    pub items: Vec<ResolvedCartItem>,
}

/// Cart service.
pub struct CartService<'a> {
    store: &'a dyn Store,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// The caller's cart, resolved against live product data.
    pub async fn get_cart(&self, user_id: UserId) -> Result<ResolvedCart> {
        let user = require_user(self.store, user_id).await?;
        self.resolve(&user.cart).await
    }

    /// Add one unit of a product to the caller's cart.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the product does not exist and
    /// `InvalidOperation` if the caller authored it. Both checks run before
    /// any mutation.
    pub async fn add_to_cart(&self, user_id: UserId, product_id: ProductId) -> Result<ResolvedCart> {
        let mut user = require_user(self.store, user_id).await?;

        let product = self
            .store
            .find_product(product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found!".to_owned()))?;

        if product.creator == user.id {
            return Err(AppError::InvalidOperation(
                "You cannot add your own product to your cart".to_owned(),
            ));
        }

        user.cart.add(product_id);
        self.store.save_user(&user).await?;

        self.resolve(&user.cart).await
    }

    /// Remove a product's item from the caller's cart entirely.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no item for that product is in the cart.
    pub async fn remove_from_cart(&self, user_id: UserId, product_id: ProductId) -> Result<()> {
        let mut user = require_user(self.store, user_id).await?;

        if !user.cart.remove(product_id) {
            return Err(AppError::NotFound(
                "Product not found in cart".to_owned(),
            ));
        }

        self.store.save_user(&user).await?;
        Ok(())
    }

    /// Empty the caller's cart. Idempotent.
    pub async fn clear_cart(&self, user_id: UserId) -> Result<ResolvedCart> {
        let mut user = require_user(self.store, user_id).await?;

        user.cart.clear();
        self.store.save_user(&user).await?;

        Ok(ResolvedCart { items: Vec::new() })
    }

    /// Join cart items against live products, silently skipping items whose
    /// product has been deleted.
    pub(crate) async fn resolve(&self, cart: &Cart) -> Result<ResolvedCart> {
        let mut items = Vec::with_capacity(cart.items().len());

        for item in cart.items() {
            if let Some(product) = self.store.find_product(item.product_id).await? {
                items.push(ResolvedCartItem {
                    product,
                    quantity: item.quantity,
                });
            }
        }

        Ok(ResolvedCart { items })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tangelo_core::Email;

    use crate::models::User;
    use crate::store::MemoryStore;

    async fn seed_user(store: &MemoryStore, email: &str) -> User {
        let user = User::new(
            "Test".to_owned(),
            Email::parse(email).unwrap(),
            "hash".to_owned(),
        );
        store.save_user(&user).await.unwrap();
        user
    }

    async fn seed_product(store: &MemoryStore, creator: UserId, name: &str) -> Product {
        let product = Product::new(
            name.to_owned(),
            "A fine product".to_owned(),
            dec!(10),
            None,
            creator,
        );
        store.save_product(&product).await.unwrap();
        product
    }

    #[tokio::test]
    async fn adding_twice_accumulates_into_one_item() {
        let store = MemoryStore::new();
        let buyer = seed_user(&store, "buyer@x.com").await;
        let seller = seed_user(&store, "seller@x.com").await;
        let product = seed_product(&store, seller.id, "Widget").await;
        let service = CartService::new(&store);

        service.add_to_cart(buyer.id, product.id).await.unwrap();
        let cart = service.add_to_cart(buyer.id, product.id).await.unwrap();

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 2);
        assert_eq!(cart.items[0].product.id, product.id);
    }

    #[tokio::test]
    async fn own_product_is_rejected_and_cart_unchanged() {
        let store = MemoryStore::new();
        let seller = seed_user(&store, "seller@x.com").await;
        let product = seed_product(&store, seller.id, "Widget").await;
        let service = CartService::new(&store);

        let err = service.add_to_cart(seller.id, product.id).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidOperation(_)));

        let stored = store.find_user(seller.id).await.unwrap().unwrap();
        assert!(stored.cart.is_empty());
    }

    #[tokio::test]
    async fn adding_missing_product_is_not_found() {
        let store = MemoryStore::new();
        let buyer = seed_user(&store, "buyer@x.com").await;
        let service = CartService::new(&store);

        let err = service
            .add_to_cart(buyer.id, ProductId::generate())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn removing_absent_item_is_not_found_and_cart_unchanged() {
        let store = MemoryStore::new();
        let buyer = seed_user(&store, "buyer@x.com").await;
        let seller = seed_user(&store, "seller@x.com").await;
        let product = seed_product(&store, seller.id, "Widget").await;
        let service = CartService::new(&store);

        service.add_to_cart(buyer.id, product.id).await.unwrap();

        let err = service
            .remove_from_cart(buyer.id, ProductId::generate())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let stored = store.find_user(buyer.id).await.unwrap().unwrap();
        assert_eq!(stored.cart.items().len(), 1);
    }

    #[tokio::test]
    async fn remove_deletes_the_item_not_a_unit() {
        let store = MemoryStore::new();
        let buyer = seed_user(&store, "buyer@x.com").await;
        let seller = seed_user(&store, "seller@x.com").await;
        let product = seed_product(&store, seller.id, "Widget").await;
        let service = CartService::new(&store);

        service.add_to_cart(buyer.id, product.id).await.unwrap();
        service.add_to_cart(buyer.id, product.id).await.unwrap();
        service.remove_from_cart(buyer.id, product.id).await.unwrap();

        let stored = store.find_user(buyer.id).await.unwrap().unwrap();
        assert!(stored.cart.is_empty());
    }

    #[tokio::test]
    async fn deleted_products_vanish_from_the_resolved_cart() {
        let store = MemoryStore::new();
        let buyer = seed_user(&store, "buyer@x.com").await;
        let seller = seed_user(&store, "seller@x.com").await;
        let kept = seed_product(&store, seller.id, "Kept").await;
        let deleted = seed_product(&store, seller.id, "Deleted").await;
        let service = CartService::new(&store);

        service.add_to_cart(buyer.id, kept.id).await.unwrap();
        service.add_to_cart(buyer.id, deleted.id).await.unwrap();
        store.delete_product(deleted.id).await.unwrap();

        let cart = service.get_cart(buyer.id).await.unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].product.id, kept.id);
    }

    #[tokio::test]
    async fn unknown_identity_is_unauthorized() {
        let store = MemoryStore::new();
        let service = CartService::new(&store);

        let err = service.get_cart(UserId::generate()).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
    }
}
