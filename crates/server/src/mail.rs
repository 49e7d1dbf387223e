//! Transactional mail capability.
//!
//! Two messages leave this system: a purchase receipt after checkout and a
//! password-reset token. Both are best-effort - callers log failures and
//! move on. [`SendGridMailer`] implements the capability against the
//! SendGrid v3 send API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use thiserror::Error;

use tangelo_core::Email;

use crate::models::Order;

/// SendGrid API base URL.
const SENDGRID_BASE_URL: &str = "https://api.sendgrid.com";

/// Sender display name on outgoing mail.
const FROM_NAME: &str = "Tangelo Shop";

/// Errors from the mail provider.
#[derive(Debug, Error)]
pub enum MailError {
    /// HTTP request failed.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider rejected the request.
    #[error("api error: {status} - {message}")]
    Api { status: u16, message: String },
}

/// Capability to send transactional mail.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send a purchase receipt for a persisted order.
    async fn send_receipt(&self, to: &Email, order: &Order) -> Result<(), MailError>;

    /// Send a password-reset token with its expiration.
    async fn send_password_reset(
        &self,
        to: &Email,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), MailError>;
}

/// [`Mailer`] backed by the SendGrid v3 API.
pub struct SendGridMailer {
    client: reqwest::Client,
    api_key: SecretString,
    from_address: Email,
    base_url: String,
}

impl SendGridMailer {
    /// Create a new mail client.
    #[must_use]
    pub fn new(api_key: SecretString, from_address: Email) -> Self {
        Self::with_base_url(api_key, from_address, SENDGRID_BASE_URL.to_owned())
    }

    /// Create a mail client against a non-default endpoint.
    #[must_use]
    pub fn with_base_url(api_key: SecretString, from_address: Email, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            from_address,
            base_url,
        }
    }

    async fn send(
        &self,
        to: &Email,
        subject: &str,
        text: String,
        html: String,
    ) -> Result<(), MailError> {
        let body = json!({
            "personalizations": [{ "to": [{ "email": to.as_str() }] }],
            "from": { "email": self.from_address.as_str(), "name": FROM_NAME },
            "subject": subject,
            "content": [
                { "type": "text/plain", "value": text },
                { "type": "text/html", "value": html },
            ],
        });

        let response = self
            .client
            .post(format!("{}/v3/mail/send", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MailError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}

#[async_trait]
impl Mailer for SendGridMailer {
    async fn send_receipt(&self, to: &Email, order: &Order) -> Result<(), MailError> {
        self.send(
            to,
            "Purchase receipt",
            receipt_text(order),
            receipt_html(order),
        )
        .await
    }

    async fn send_password_reset(
        &self,
        to: &Email,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), MailError> {
        self.send(
            to,
            "Password Reset",
            reset_text(token, expires_at),
            reset_html(token, expires_at),
        )
        .await
    }
}

/// Plain-text invoice body.
fn receipt_text(order: &Order) -> String {
    let mut body = String::new();
    body.push_str("Invoice\n");
    body.push_str("------------------------------\n");
    body.push_str(&format!("Total Price: ${:.2}\n", order.total));
    body.push_str("------------------------------\n");
    body.push_str("Products:\n");
    for line in &order.lines {
        body.push_str(&format!(
            "Name: {}\nPrice: ${:.2}\nQuantity: {}\n--------------------------------\n",
            line.name, line.price, line.quantity
        ));
    }
    body
}

/// HTML invoice body.
fn receipt_html(order: &Order) -> String {
    let rows: String = order
        .lines
        .iter()
        .map(|line| {
            format!(
                "<tr><td>{}</td><td>${:.2}</td><td>{}</td></tr>",
                line.name, line.price, line.quantity
            )
        })
        .collect();

    format!(
        "<h1>Invoice</h1>\
         <table><tr><td><b>Total Price:</b></td><td>${:.2}</td></tr></table>\
         <h2>Products</h2>\
         <table><tr><th>Name</th><th>Price</th><th>Quantity</th></tr>{rows}</table>",
        order.total
    )
}

/// Plain-text password-reset body.
fn reset_text(token: &str, expires_at: DateTime<Utc>) -> String {
    format!(
        "Password Reset\n\n\
         Hello,\n\n\
         We have received a request to reset your password. \
         Please use the following reset token to proceed:\n\n\
         {token}\n\n\
         Token Expiration: {expires_at}\n\n\
         If you did not request a password reset, please disregard this email.\n\n\
         Thank you!"
    )
}

/// HTML password-reset body.
fn reset_html(token: &str, expires_at: DateTime<Utc>) -> String {
    format!(
        "<h1>Password Reset</h1>\
         <p>Hello,</p>\
         <p>We have received a request to reset your password. \
         Please use the following reset token to proceed:</p>\
         <p><strong>{token}</strong></p>\
         <p>Token Expiration: {expires_at}</p>\
         <p>If you did not request a password reset, please disregard this email.</p>\
         <p>Thank you!</p>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tangelo_core::{OrderId, ProductId, UserId};

    use crate::models::OrderLine;

    fn order() -> Order {
        Order {
            id: OrderId::generate(),
            user_id: UserId::generate(),
            user_email: Email::parse("a@x.com").expect("valid email"),
            lines: vec![OrderLine {
                product_id: ProductId::generate(),
                name: "Widget".to_owned(),
                description: "A widget".to_owned(),
                price: dec!(10),
                image_url: None,
                quantity: 2,
            }],
            total: dec!(20),
            payment_intent_id: "pi_123".to_owned(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn receipt_bodies_list_total_and_lines() {
        let order = order();
        let text = receipt_text(&order);
        assert!(text.contains("Total Price: $20.00"));
        assert!(text.contains("Name: Widget"));
        assert!(text.contains("Quantity: 2"));

        let html = receipt_html(&order);
        assert!(html.contains("<td>Widget</td>"));
        assert!(html.contains("$10.00"));
    }

    #[test]
    fn reset_bodies_carry_token_and_expiration() {
        let expires = Utc::now();
        let text = reset_text("tok-123", expires);
        assert!(text.contains("tok-123"));
        assert!(text.contains(&expires.to_string()));

        let html = reset_html("tok-123", expires);
        assert!(html.contains("<strong>tok-123</strong>"));
    }
}
