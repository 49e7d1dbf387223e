//! Cart route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use tangelo_core::ProductId;

use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::services::cart::{CartService, ResolvedCart};
use crate::state::AppState;

/// Add-to-cart payload.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
}

/// `GET /api/cart`
pub async fn get_cart(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<ResolvedCart>> {
    let service = CartService::new(state.store());
    Ok(Json(service.get_cart(user_id).await?))
}

/// `POST /api/cart/items`
pub async fn add_item(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<ResolvedCart>> {
    let service = CartService::new(state.store());
    Ok(Json(service.add_to_cart(user_id, req.product_id).await?))
}

/// `DELETE /api/cart/items/{product_id}`
pub async fn remove_item(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(product_id): Path<ProductId>,
) -> Result<Json<bool>> {
    let service = CartService::new(state.store());
    service.remove_from_cart(user_id, product_id).await?;
    Ok(Json(true))
}

/// `POST /api/cart/clear`
pub async fn clear(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<ResolvedCart>> {
    let service = CartService::new(state.store());
    Ok(Json(service.clear_cart(user_id).await?))
}
