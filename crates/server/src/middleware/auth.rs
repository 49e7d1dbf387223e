//! Bearer-credential extractor.
//!
//! The identity travels in the `Authorization` header, never in operation
//! payloads. Extraction only verifies the token signature and expiry; the
//! service layer resolves the id to an existing user and treats a dangling
//! id exactly like a missing credential.

use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};

use tangelo_core::UserId;

use crate::error::AppError;
use crate::state::AppState;

/// Extractor for the verified identity behind a request.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(CurrentUser(user_id): CurrentUser) -> impl IntoResponse {
///     format!("hello {user_id}")
/// }
/// ```
pub struct CurrentUser(pub UserId);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(AppError::Unauthorized)?;

        let user_id = state.tokens().verify(token).ok_or(AppError::Unauthorized)?;

        Ok(Self(user_id))
    }
}
