//! Account service: registration, login, and the password-reset flow.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;

use tangelo_core::{Email, UserId};

use super::require_user;
use super::token::TokenIssuer;
use crate::error::{AppError, FieldError, Result};
use crate::mail::Mailer;
use crate::models::{ResetToken, User};
use crate::store::{Store, StoreError};

/// Minimum password length for a password change.
const MIN_PASSWORD_LENGTH: usize = 8;

/// How long a reset token stays valid.
const RESET_TOKEN_LIFETIME_MINUTES: i64 = 15;

/// Length of the opaque reset token value.
const RESET_TOKEN_LENGTH: usize = 32;

/// Account service.
pub struct AuthService<'a> {
    store: &'a dyn Store,
    tokens: &'a TokenIssuer,
    mailer: &'a dyn Mailer,
}

impl<'a> AuthService<'a> {
    /// Create a new account service.
    #[must_use]
    pub const fn new(store: &'a dyn Store, tokens: &'a TokenIssuer, mailer: &'a dyn Mailer) -> Self {
        Self {
            store,
            tokens,
            mailer,
        }
    }

    /// Register a new user.
    ///
    /// The password is accepted as-is; the length policy only applies when a
    /// password is changed through the reset flow.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` with per-field messages if the name or email
    /// fails validation, or if the email is already registered.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<User> {
        let mut errors = Vec::new();

        let name = name.trim();
        if name.is_empty() {
            errors.push(FieldError::new("name", "name must not be empty"));
        }

        let email = match Email::parse(email) {
            Ok(email) => Some(email),
            Err(e) => {
                errors.push(FieldError::new("email", e.to_string()));
                None
            }
        };

        if !errors.is_empty() {
            return Err(AppError::InvalidInput(errors));
        }
        let email = email.ok_or_else(|| AppError::Internal("email validated but absent".into()))?;

        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::invalid_field(
                "email",
                "User with this email exists already, please log in",
            ));
        }

        let user = User::new(name.to_owned(), email, hash_password(password)?);

        match self.store.save_user(&user).await {
            Ok(()) => Ok(user),
            // Concurrent registration can still hit the unique index
            Err(StoreError::Conflict(_)) => Err(AppError::invalid_field(
                "email",
                "User with this email exists already, please log in",
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Login with email and password, returning the user and a bearer token.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` for an unknown email and a wrong password
    /// alike - callers cannot probe which accounts exist.
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, String)> {
        let Ok(email) = Email::parse(email) else {
            return Err(AppError::Unauthorized);
        };

        let user = self
            .store
            .find_user_by_email(&email)
            .await?
            .ok_or(AppError::Unauthorized)?;

        verify_password(password, &user.password_hash)?;

        let token = self
            .tokens
            .issue(user.id, &user.email)
            .map_err(|e| AppError::Internal(format!("token signing failed: {e}")))?;

        Ok((user, token))
    }

    /// Fetch a user by id for an authenticated caller.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such user exists.
    pub async fn get_user(&self, user_id: UserId) -> Result<User> {
        self.store
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User with this id does not exist".to_owned()))
    }

    /// Issue a password-reset token and mail it to the user.
    ///
    /// Value and expiration are set together; any previously outstanding
    /// token is overwritten. Mail delivery is best-effort.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no account uses this email.
    pub async fn request_password_reset(&self, email: &str) -> Result<()> {
        let Ok(email) = Email::parse(email) else {
            return Err(AppError::NotFound(
                "No user with this email was found".to_owned(),
            ));
        };

        let mut user = self
            .store
            .find_user_by_email(&email)
            .await?
            .ok_or_else(|| AppError::NotFound("No user with this email was found".to_owned()))?;

        let token = ResetToken {
            value: generate_token_value(),
            expires_at: Utc::now() + Duration::minutes(RESET_TOKEN_LIFETIME_MINUTES),
            validated: false,
        };

        user.reset_token = Some(token.clone());
        self.store.save_user(&user).await?;

        if let Err(e) = self
            .mailer
            .send_password_reset(&user.email, &token.value, token.expires_at)
            .await
        {
            tracing::warn!(user_id = %user.id, error = %e, "password reset mail failed");
        }

        Ok(())
    }

    /// Validate a reset token, marking it ready for a password change.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` if the token is unknown or expired. The
    /// validated flag is never set on an expired token.
    pub async fn validate_reset_token(&self, token: &str) -> Result<User> {
        let mut user = self
            .store
            .find_user_by_reset_token(token)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let Some(reset) = user.reset_token.as_mut() else {
            return Err(AppError::Unauthorized);
        };

        if reset.is_expired(Utc::now()) {
            return Err(AppError::Unauthorized);
        }

        reset.validated = true;
        self.store.save_user(&user).await?;

        Ok(user)
    }

    /// Replace the user's password after a validated reset.
    ///
    /// The token is strictly single-use: a successful change clears it
    /// entirely, so a second change with the same token fails.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` unless a validated token is outstanding, and
    /// `InvalidInput` if the new password fails the length policy.
    pub async fn change_password(&self, user_id: UserId, new_password: &str) -> Result<()> {
        let mut user = require_user(self.store, user_id).await?;

        let validated = user
            .reset_token
            .as_ref()
            .is_some_and(|t| t.validated && !t.is_expired(Utc::now()));
        if !validated {
            return Err(AppError::Unauthorized);
        }

        if new_password.len() < MIN_PASSWORD_LENGTH {
            return Err(AppError::invalid_field(
                "password",
                &format!("password must be at least {MIN_PASSWORD_LENGTH} characters"),
            ));
        }

        user.password_hash = hash_password(new_password)?;
        user.reset_token = None;
        self.store.save_user(&user).await?;

        Ok(())
    }
}

/// Hash a password with Argon2 and a fresh salt.
fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

/// Verify a password against a stored hash.
///
/// A malformed stored hash and a wrong password both come back as
/// `Unauthorized`.
fn verify_password(password: &str, stored_hash: &str) -> Result<()> {
    let parsed = PasswordHash::new(stored_hash).map_err(|_| AppError::Unauthorized)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AppError::Unauthorized)
}

/// Random alphanumeric reset-token value.
fn generate_token_value() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(RESET_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}
