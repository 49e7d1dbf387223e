//! Order domain types.
//!
//! An order is an immutable point-in-time receipt. Product fields are
//! denormalized copies taken at checkout; later edits or deletions of the
//! source product never show through.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tangelo_core::{Email, OrderId, ProductId, UserId};

/// A priced, quantified snapshot of one product within an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    /// ID of the purchased product at checkout time.
    pub product_id: ProductId,
    /// Product name at checkout time.
    pub name: String,
    /// Product description at checkout time.
    pub description: String,
    /// Unit price at checkout time, in the shop currency's major unit.
    pub price: Decimal,
    /// Product image at checkout time.
    pub image_url: Option<String>,
    /// Purchased quantity.
    pub quantity: u32,
}

impl OrderLine {
    /// Price times quantity for this line.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// A completed purchase.
///
/// Created once at checkout, read-only thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique order ID.
    pub id: OrderId,
    /// The purchasing user.
    pub user_id: UserId,
    /// The purchaser's email at checkout time.
    pub user_email: Email,
    /// Snapshots of the purchased products.
    pub lines: Vec<OrderLine>,
    /// Sum of all line totals.
    pub total: Decimal,
    /// Reference to the payment session at the external processor.
    pub payment_intent_id: String,
    /// When the order was placed.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn line_total_multiplies_price_by_quantity() {
        let line = OrderLine {
            product_id: ProductId::generate(),
            name: "Widget".to_owned(),
            description: "A widget".to_owned(),
            price: dec!(10.50),
            image_url: None,
            quantity: 3,
        };

        assert_eq!(line.line_total(), dec!(31.50));
    }
}
