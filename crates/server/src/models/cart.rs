//! Cart domain type and its mutation rules.

use serde::{Deserialize, Serialize};

use tangelo_core::ProductId;

/// One selected product in a cart.
///
/// Holds a weak reference to the product; the live record is joined in at
/// read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// The selected product.
    pub product_id: ProductId,
    /// How many units are selected. Always positive.
    pub quantity: u32,
}

/// A user's cart: at most one item per distinct product.
///
/// The cart is embedded in the [`super::User`] record and persisted as a
/// whole; these methods only mutate in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// The current items.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Whether the cart holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add one unit of a product.
    ///
    /// Increments the existing item's quantity, or inserts a new item with
    /// quantity 1. Quantities accumulate; a product never appears twice.
    pub fn add(&mut self, product_id: ProductId) {
        match self.items.iter_mut().find(|i| i.product_id == product_id) {
            Some(item) => item.quantity += 1,
            None => self.items.push(CartItem {
                product_id,
                quantity: 1,
            }),
        }
    }

    /// Remove a product's item entirely (not a decrement).
    ///
    /// Returns `false` if no item for that product exists.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        self.items.len() < before
    }

    /// Drop every item. Idempotent.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_twice_accumulates_quantity() {
        let product = ProductId::generate();
        let mut cart = Cart::new();
        cart.add(product);
        cart.add(product);

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 2);
    }

    #[test]
    fn add_distinct_products_keeps_separate_items() {
        let mut cart = Cart::new();
        cart.add(ProductId::generate());
        cart.add(ProductId::generate());

        assert_eq!(cart.items().len(), 2);
        assert!(cart.items().iter().all(|i| i.quantity == 1));
    }

    #[test]
    fn remove_deletes_item_entirely() {
        let product = ProductId::generate();
        let mut cart = Cart::new();
        cart.add(product);
        cart.add(product);

        assert!(cart.remove(product));
        assert!(cart.is_empty());
    }

    #[test]
    fn remove_missing_item_reports_false() {
        let mut cart = Cart::new();
        cart.add(ProductId::generate());

        assert!(!cart.remove(ProductId::generate()));
        assert_eq!(cart.items().len(), 1);
    }

    #[test]
    fn clear_is_idempotent() {
        let mut cart = Cart::new();
        cart.add(ProductId::generate());
        cart.clear();
        cart.clear();

        assert!(cart.is_empty());
    }
}
