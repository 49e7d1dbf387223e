//! Tangelo server library.
//!
//! Everything the binary wires together lives here so integration tests can
//! assemble the same application in-process with substitute capabilities.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod assets;
pub mod config;
pub mod error;
pub mod mail;
pub mod middleware;
pub mod models;
pub mod payments;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

use axum::{Router, extract::State, http::StatusCode, routing::get};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use state::AppState;

/// Assemble the full application router.
#[must_use]
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness health check. Does not touch dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check: verifies the store answers queries.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().list_products().await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::net::IpAddr;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::{DateTime, Utc};
    use http_body_util::BodyExt;
    use secrecy::SecretString;
    use tower::ServiceExt;

    use tangelo_core::{CurrencyCode, Email, Money};

    use crate::config::ServerConfig;
    use crate::mail::{MailError, Mailer};
    use crate::models::{Order, OrderLine};
    use crate::payments::{PaymentError, PaymentGateway, PaymentSession};
    use crate::store::MemoryStore;

    struct NullGateway;

    #[async_trait]
    impl PaymentGateway for NullGateway {
        async fn create_session(
            &self,
            _lines: &[OrderLine],
            _total: Money,
        ) -> Result<PaymentSession, PaymentError> {
            Ok(PaymentSession {
                id: "pi_null".to_owned(),
                client_secret: "pi_null_secret".to_owned(),
            })
        }
    }

    struct NullMailer;

    #[async_trait]
    impl Mailer for NullMailer {
        async fn send_receipt(&self, _to: &Email, _order: &Order) -> Result<(), MailError> {
            Ok(())
        }

        async fn send_password_reset(
            &self,
            _to: &Email,
            _token: &str,
            _expires_at: DateTime<Utc>,
        ) -> Result<(), MailError> {
            Ok(())
        }
    }

    fn test_app() -> Router {
        let config = ServerConfig {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 0,
            database_url: None,
            jwt_secret: SecretString::from("router-test-secret-0123456789"),
            stripe_secret_key: SecretString::from("sk_test_unused"),
            sendgrid_api_key: SecretString::from("sg_unused"),
            mail_from: Email::parse("shop@tangelo.test").unwrap(),
            currency: CurrencyCode::Usd,
            assets: None,
        };
        let state = AppState::new(
            config,
            Arc::new(MemoryStore::new()),
            Arc::new(NullGateway),
            Arc::new(NullMailer),
            None,
        );
        app(state)
    }

    #[tokio::test]
    async fn health_answers_ok() {
        let response = test_app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_route_without_credentials_yields_error_body() {
        let response = test_app()
            .oneshot(Request::get("/api/cart").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "Not authorized");
        assert_eq!(body["code"], 401);
    }

    #[tokio::test]
    async fn unknown_route_is_plain_not_found() {
        let response = test_app()
            .oneshot(Request::get("/api/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
