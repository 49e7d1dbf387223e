//! Product domain type.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tangelo_core::{ProductId, UserId};

/// A product listing.
///
/// Every product has exactly one creator; only the creator may mutate or
/// delete it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Long-form description.
    pub description: String,
    /// Price in the shop currency's major unit. Non-negative.
    pub price: Decimal,
    /// Public URL of the product image, if one was uploaded.
    pub image_url: Option<String>,
    /// The authoring user.
    pub creator: UserId,
    /// When the product was created.
    pub created_at: DateTime<Utc>,
    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Create a new product authored by `creator`.
    #[must_use]
    pub fn new(
        name: String,
        description: String,
        price: Decimal,
        image_url: Option<String>,
        creator: UserId,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ProductId::generate(),
            name,
            description,
            price,
            image_url,
            creator,
            created_at: now,
            updated_at: now,
        }
    }
}
