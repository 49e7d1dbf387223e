//! Checkout and order-history route handlers.

use axum::{Json, extract::State};

use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::models::Order;
use crate::services::checkout::{CheckoutReceipt, CheckoutService};
use crate::state::AppState;

/// `POST /api/checkout`
pub async fn checkout(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<CheckoutReceipt>> {
    let service = CheckoutService::new(
        state.store(),
        state.gateway(),
        state.mailer(),
        state.config().currency,
    );
    Ok(Json(service.checkout(user_id).await?))
}

/// `GET /api/orders`
pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<Vec<Order>>> {
    let service = CheckoutService::new(
        state.store(),
        state.gateway(),
        state.mailer(),
        state.config().currency,
    );
    Ok(Json(service.list_orders(user_id).await?))
}
