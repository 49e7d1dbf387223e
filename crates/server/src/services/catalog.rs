//! Catalog service: product CRUD with creator-only mutation.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;

use tangelo_core::{ProductId, UserId};

use super::require_user;
use crate::assets::AssetStore;
use crate::error::{AppError, FieldError, Result};
use crate::models::Product;
use crate::store::Store;

/// Minimum product name length.
const MIN_NAME_LENGTH: usize = 3;

/// Minimum product description length.
const MIN_DESCRIPTION_LENGTH: usize = 5;

/// Incoming product fields for create and update.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    /// Display name.
    pub name: String,
    /// Long-form description.
    pub description: String,
    /// Price in the shop currency's major unit.
    pub price: Decimal,
    /// Public image URL, typically minted by the upload endpoint.
    pub image_url: Option<String>,
}

/// Catalog service.
pub struct CatalogService<'a> {
    store: &'a dyn Store,
    assets: Option<&'a dyn AssetStore>,
}

impl<'a> CatalogService<'a> {
    /// Create a new catalog service.
    #[must_use]
    pub const fn new(store: &'a dyn Store, assets: Option<&'a dyn AssetStore>) -> Self {
        Self { store, assets }
    }

    /// All products, oldest first.
    pub async fn list_products(&self) -> Result<Vec<Product>> {
        Ok(self.store.list_products().await?)
    }

    /// One product by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the product does not exist.
    pub async fn get_product(&self, product_id: ProductId) -> Result<Product> {
        self.store
            .find_product(product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found!".to_owned()))
    }

    /// Create a product authored by the caller.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` with per-field messages if validation fails.
    pub async fn create_product(&self, user_id: UserId, input: ProductInput) -> Result<Product> {
        let mut user = require_user(self.store, user_id).await?;
        validate_input(&input)?;

        let product = Product::new(
            input.name.trim().to_owned(),
            input.description.trim().to_owned(),
            input.price,
            input.image_url,
            user.id,
        );
        self.store.save_product(&product).await?;

        user.product_ids.push(product.id);
        self.store.save_user(&user).await?;

        Ok(product)
    }

    /// Update a product. Only its creator may do so.
    ///
    /// The image reference is only replaced when a new one is supplied.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown product, `Unauthorized` when the
    /// caller is not the creator, and `InvalidInput` on validation failure.
    pub async fn update_product(
        &self,
        user_id: UserId,
        product_id: ProductId,
        input: ProductInput,
    ) -> Result<Product> {
        let user = require_user(self.store, user_id).await?;
        let mut product = self.get_product(product_id).await?;

        if product.creator != user.id {
            return Err(AppError::Unauthorized);
        }

        validate_input(&input)?;

        product.name = input.name.trim().to_owned();
        product.description = input.description.trim().to_owned();
        product.price = input.price;
        if let Some(image_url) = input.image_url {
            product.image_url = Some(image_url);
        }
        product.updated_at = Utc::now();

        self.store.save_product(&product).await?;
        Ok(product)
    }

    /// Delete a product. Only its creator may do so.
    ///
    /// The product id is removed from the creator's authored list, and any
    /// associated image is deleted from the object store best-effort - a
    /// storage failure never blocks or fails the delete.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown product and `Unauthorized` when the
    /// caller is not the creator.
    pub async fn delete_product(&self, user_id: UserId, product_id: ProductId) -> Result<bool> {
        let mut user = require_user(self.store, user_id).await?;
        let product = self.get_product(product_id).await?;

        if product.creator != user.id {
            return Err(AppError::Unauthorized);
        }

        let deleted = self.store.delete_product(product_id).await?;

        user.product_ids.retain(|id| *id != product_id);
        self.store.save_user(&user).await?;

        if let (Some(assets), Some(image_url)) = (self.assets, product.image_url.as_deref()) {
            if let Err(e) = assets.delete(image_url).await {
                tracing::warn!(product_id = %product_id, error = %e, "image cleanup failed");
            }
        }

        Ok(deleted)
    }
}

fn validate_input(input: &ProductInput) -> Result<()> {
    let mut errors = Vec::new();

    if input.name.trim().len() < MIN_NAME_LENGTH {
        errors.push(FieldError::new(
            "name",
            format!("name must be at least {MIN_NAME_LENGTH} characters"),
        ));
    }

    if input.description.trim().len() < MIN_DESCRIPTION_LENGTH {
        errors.push(FieldError::new(
            "description",
            format!("description must be at least {MIN_DESCRIPTION_LENGTH} characters"),
        ));
    }

    if input.price < Decimal::ZERO {
        errors.push(FieldError::new("price", "price must not be negative"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::InvalidInput(errors))
    }
}
