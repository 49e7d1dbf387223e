//! User domain types, including the password-reset token state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tangelo_core::{Email, ProductId, UserId};

use super::Cart;

/// A registered user.
///
/// The cart and the outstanding reset token are embedded: the whole record
/// is the unit of consistency, read-modify-write with last write wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Login email, unique across users.
    pub email: Email,
    /// Argon2 hash of the password.
    pub password_hash: String,
    /// Products this user has authored.
    pub product_ids: Vec<ProductId>,
    /// The user's cart.
    pub cart: Cart,
    /// Outstanding password-reset token, if any. At most one per user.
    pub reset_token: Option<ResetToken>,
}

impl User {
    /// Create a fresh user with an empty cart and no products.
    #[must_use]
    pub fn new(name: String, email: Email, password_hash: String) -> Self {
        Self {
            id: UserId::generate(),
            name,
            email,
            password_hash,
            product_ids: Vec::new(),
            cart: Cart::new(),
            reset_token: None,
        }
    }

    /// Whether this user authored the given product.
    #[must_use]
    pub fn owns_product(&self, product_id: ProductId) -> bool {
        self.product_ids.contains(&product_id)
    }
}

/// A single-use password-reset credential.
///
/// Value and expiration are set together at issuance. A successful password
/// change clears the whole token; an expired token can only be replaced by
/// reissuing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetToken {
    /// Opaque random token value.
    pub value: String,
    /// Instant after which the token is rejected.
    pub expires_at: DateTime<Utc>,
    /// Set by a successful validation; required before a password change.
    pub validated: bool,
}

impl ResetToken {
    /// Whether the token is past its expiration.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn reset_token_expiry_is_exclusive() {
        let now = Utc::now();
        let token = ResetToken {
            value: "tok".to_owned(),
            expires_at: now,
            validated: false,
        };

        assert!(!token.is_expired(now));
        assert!(token.is_expired(now + Duration::seconds(1)));
    }

    #[test]
    fn new_user_starts_empty() {
        let email = Email::parse("a@x.com").expect("valid email");
        let user = User::new("A".to_owned(), email, "hash".to_owned());

        assert!(user.cart.is_empty());
        assert!(user.product_ids.is_empty());
        assert!(user.reset_token.is_none());
    }
}
