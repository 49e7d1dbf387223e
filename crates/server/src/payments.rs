//! Payment gateway capability.
//!
//! Checkout needs exactly one thing from the processor: turn a set of line
//! items and a total into a payment session the client can confirm.
//! [`PaymentGateway`] is that seam; [`StripeGateway`] implements it against
//! the Stripe PaymentIntents API. Single attempt, fail fast - retries are
//! the caller's business (and checkout deliberately has none).

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

use tangelo_core::Money;

use crate::models::OrderLine;

/// Stripe API base URL.
const STRIPE_BASE_URL: &str = "https://api.stripe.com";

/// Errors from the payment processor.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The processor rejected the request.
    #[error("api error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The amount cannot be represented on the wire.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
}

/// A created payment session.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentSession {
    /// Processor-side identifier, persisted on the order.
    pub id: String,
    /// Client-facing secret used to confirm the payment.
    pub client_secret: String,
}

/// Capability to create a payment session for a priced set of line items.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_session(
        &self,
        lines: &[OrderLine],
        total: Money,
    ) -> Result<PaymentSession, PaymentError>;
}

/// [`PaymentGateway`] backed by Stripe PaymentIntents.
pub struct StripeGateway {
    client: reqwest::Client,
    secret_key: SecretString,
    base_url: String,
}

impl StripeGateway {
    /// Create a new gateway client.
    #[must_use]
    pub fn new(secret_key: SecretString) -> Self {
        Self::with_base_url(secret_key, STRIPE_BASE_URL.to_owned())
    }

    /// Create a gateway client against a non-default endpoint.
    #[must_use]
    pub fn with_base_url(secret_key: SecretString, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            secret_key,
            base_url,
        }
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_session(
        &self,
        lines: &[OrderLine],
        total: Money,
    ) -> Result<PaymentSession, PaymentError> {
        let amount = total
            .minor_units()
            .ok_or_else(|| PaymentError::InvalidAmount(total.amount.to_string()))?;
        if amount < 0 {
            return Err(PaymentError::InvalidAmount(total.amount.to_string()));
        }

        let item_count: u32 = lines.iter().map(|l| l.quantity).sum();
        let description = format!("Tangelo order ({item_count} items)");

        let params = [
            ("amount", amount.to_string()),
            ("currency", total.currency.code().to_lowercase()),
            ("description", description),
            ("automatic_payment_methods[enabled]", "true".to_owned()),
        ];

        let response = self
            .client
            .post(format!("{}/v1/payment_intents", self.base_url))
            .bearer_auth(self.secret_key.expose_secret())
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<PaymentSession>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tangelo_core::CurrencyCode;

    #[test]
    fn session_deserializes_from_stripe_shape() {
        let json = r#"{"id":"pi_123","client_secret":"pi_123_secret_abc","object":"payment_intent"}"#;
        let session: PaymentSession = serde_json::from_str(json).expect("valid session json");
        assert_eq!(session.id, "pi_123");
        assert_eq!(session.client_secret, "pi_123_secret_abc");
    }

    #[test]
    fn negative_total_is_rejected_before_the_wire() {
        let total = Money::new(dec!(-1), CurrencyCode::Usd);
        assert!(total.minor_units().is_some_and(|units| units < 0));
    }
}
