//! Business logic, one service per concern.
//!
//! Services borrow capabilities (store, gateway, mailer, assets) rather
//! than owning them; handlers construct them per request from [`crate::state::AppState`].

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod token;

use tangelo_core::UserId;

use crate::error::{AppError, Result};
use crate::models::User;
use crate::store::Store;

/// Resolve a confirmed identity to an existing user.
///
/// A verified token whose user no longer resolves is indistinguishable from
/// no identity at all: both are `Unauthorized`.
pub(crate) async fn require_user(store: &dyn Store, user_id: UserId) -> Result<User> {
    store
        .find_user(user_id)
        .await?
        .ok_or(AppError::Unauthorized)
}
