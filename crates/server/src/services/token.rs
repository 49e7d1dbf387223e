//! Access-token issuance and verification.
//!
//! The bearer credential is an HS256 JWT carrying the user id and email,
//! valid for ten hours. Verification yields the user id or nothing -
//! downstream code treats an unverifiable token and an unknown user the
//! same way.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use tangelo_core::{Email, UserId};

/// Token lifetime.
const TOKEN_LIFETIME_HOURS: i64 = 10;

/// JWT claims for access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: String,
    /// Email address at issuance time.
    pub email: String,
    /// Issued-at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

/// Signs and verifies access tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer").finish_non_exhaustive()
    }
}

impl TokenIssuer {
    /// Create an issuer from the signing secret.
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let secret = secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    /// Issue a token for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    pub fn issue(&self, user_id: UserId, email: &Email) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.as_str().to_owned(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(TOKEN_LIFETIME_HOURS)).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
    }

    /// Verify a token, returning the user id it was issued for.
    ///
    /// Expired, malformed, or wrongly signed tokens all yield `None`.
    #[must_use]
    pub fn verify(&self, token: &str) -> Option<UserId> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default()).ok()?;
        data.claims.sub.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(&SecretString::from("test-secret-long-enough-for-hs256"))
    }

    #[test]
    fn issued_tokens_verify_to_the_same_user() {
        let issuer = issuer();
        let user_id = UserId::generate();
        let email = Email::parse("a@x.com").expect("valid email");

        let token = issuer.issue(user_id, &email).expect("token issued");
        assert_eq!(issuer.verify(&token), Some(user_id));
    }

    #[test]
    fn tampered_tokens_are_rejected() {
        let issuer = issuer();
        let user_id = UserId::generate();
        let email = Email::parse("a@x.com").expect("valid email");

        let mut token = issuer.issue(user_id, &email).expect("token issued");
        token.push('x');
        assert_eq!(issuer.verify(&token), None);
    }

    #[test]
    fn tokens_from_another_secret_are_rejected() {
        let other = TokenIssuer::new(&SecretString::from("a-completely-different-secret"));
        let user_id = UserId::generate();
        let email = Email::parse("a@x.com").expect("valid email");

        let token = other.issue(user_id, &email).expect("token issued");
        assert_eq!(issuer().verify(&token), None);
    }
}
