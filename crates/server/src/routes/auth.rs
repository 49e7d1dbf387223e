//! Account and password-reset route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use tangelo_core::{ProductId, UserId};

use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::models::User;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Registration payload.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Login payload.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login result: the confirmed identity and its bearer token.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user_id: UserId,
    pub token: String,
}

/// Client-facing view of a user. Never carries the password hash.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub product_ids: Vec<ProductId>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email.into_inner(),
            product_ids: user.product_ids,
        }
    }
}

/// Confirmation string wrapper.
#[derive(Debug, Serialize)]
pub struct Confirmation {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ValidateTokenRequest {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub user_id: UserId,
    pub new_password: String,
}

/// `POST /api/users`
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<UserResponse>> {
    let service = AuthService::new(state.store(), state.tokens(), state.mailer());
    let user = service.register(&req.name, &req.email, &req.password).await?;
    Ok(Json(user.into()))
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let service = AuthService::new(state.store(), state.tokens(), state.mailer());
    let (user, token) = service.login(&req.email, &req.password).await?;
    Ok(Json(AuthResponse {
        user_id: user.id,
        token,
    }))
}

/// `GET /api/users/{id}`
pub async fn get_user(
    State(state): State<AppState>,
    CurrentUser(_caller): CurrentUser,
    Path(id): Path<UserId>,
) -> Result<Json<UserResponse>> {
    let service = AuthService::new(state.store(), state.tokens(), state.mailer());
    let user = service.get_user(id).await?;
    Ok(Json(user.into()))
}

/// `POST /api/auth/password/reset`
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<Confirmation>> {
    let service = AuthService::new(state.store(), state.tokens(), state.mailer());
    service.request_password_reset(&req.email).await?;
    Ok(Json(Confirmation {
        message: "A reset token has been sent to your email".to_owned(),
    }))
}

/// `POST /api/auth/password/validate`
pub async fn validate_token(
    State(state): State<AppState>,
    Json(req): Json<ValidateTokenRequest>,
) -> Result<Json<UserResponse>> {
    let service = AuthService::new(state.store(), state.tokens(), state.mailer());
    let user = service.validate_reset_token(&req.token).await?;
    Ok(Json(user.into()))
}

/// `POST /api/auth/password/change`
pub async fn change_password(
    State(state): State<AppState>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<Confirmation>> {
    let service = AuthService::new(state.store(), state.tokens(), state.mailer());
    service.change_password(req.user_id, &req.new_password).await?;
    Ok(Json(Confirmation {
        message: "Password changed successfully".to_owned(),
    }))
}
