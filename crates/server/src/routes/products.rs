//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use tangelo_core::ProductId;

use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::models::Product;
use crate::services::catalog::{CatalogService, ProductInput};
use crate::state::AppState;

/// Product listing wrapper.
#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub products: Vec<Product>,
}

/// `GET /api/products`
pub async fn list(State(state): State<AppState>) -> Result<Json<ProductListResponse>> {
    let service = CatalogService::new(state.store(), state.assets());
    let products = service.list_products().await?;
    Ok(Json(ProductListResponse { products }))
}

/// `GET /api/products/{id}`
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    let service = CatalogService::new(state.store(), state.assets());
    Ok(Json(service.get_product(id).await?))
}

/// `POST /api/products`
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(input): Json<ProductInput>,
) -> Result<Json<Product>> {
    let service = CatalogService::new(state.store(), state.assets());
    Ok(Json(service.create_product(user_id, input).await?))
}

/// `PUT /api/products/{id}`
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<ProductId>,
    Json(input): Json<ProductInput>,
) -> Result<Json<Product>> {
    let service = CatalogService::new(state.store(), state.assets());
    Ok(Json(service.update_product(user_id, id, input).await?))
}

/// `DELETE /api/products/{id}`
pub async fn remove(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<ProductId>,
) -> Result<Json<bool>> {
    let service = CatalogService::new(state.store(), state.assets());
    Ok(Json(service.delete_product(user_id, id).await?))
}
