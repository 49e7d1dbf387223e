//! Image upload route handler.
//!
//! Thin pass-through to the object-storage capability. The returned URL is
//! what clients put into a product's `image_url`.

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    pub filename: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

/// `POST /api/uploads`
pub async fn upload(
    State(state): State<AppState>,
    CurrentUser(_user_id): CurrentUser,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Result<Json<UploadResponse>> {
    let Some(assets) = state.assets() else {
        return Err(AppError::InvalidOperation(
            "Image uploads are not configured".to_owned(),
        ));
    };

    if body.is_empty() {
        return Err(AppError::invalid_field("file", "no file uploaded"));
    }

    // Prefix with a fresh UUID so distinct uploads never collide
    let name = format!("{}-{}", Uuid::new_v4(), params.filename);
    let url = assets
        .upload(&name, body.to_vec())
        .await
        .map_err(|e| AppError::Internal(format!("asset upload failed: {e}")))?;

    Ok(Json(UploadResponse { url }))
}
