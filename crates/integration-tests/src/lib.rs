//! End-to-end test harness for Tangelo.
//!
//! Spawns the real axum application on an ephemeral port with the in-memory
//! store and recording doubles for the payment gateway and mailer, then
//! drives it over HTTP with `reqwest`.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;

use tangelo_core::{CurrencyCode, Email, Money};
use tangelo_server::config::ServerConfig;
use tangelo_server::mail::{MailError, Mailer};
use tangelo_server::models::{Order, OrderLine};
use tangelo_server::payments::{PaymentError, PaymentGateway, PaymentSession};
use tangelo_server::state::AppState;
use tangelo_server::store::MemoryStore;

/// Gateway double: succeeds with a fixed session, or fails on demand.
pub struct RecordingGateway {
    /// When true, every call fails like a processor outage.
    pub fail: Mutex<bool>,
    /// Totals of every session created.
    pub charged: Mutex<Vec<Money>>,
}

impl RecordingGateway {
    #[must_use]
    pub fn new() -> Self {
        Self {
            fail: Mutex::new(false),
            charged: Mutex::new(Vec::new()),
        }
    }

    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }
}

impl Default for RecordingGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGateway for RecordingGateway {
    async fn create_session(
        &self,
        _lines: &[OrderLine],
        total: Money,
    ) -> Result<PaymentSession, PaymentError> {
        if *self.fail.lock().unwrap() {
            return Err(PaymentError::Api {
                status: 502,
                message: "processor down".to_owned(),
            });
        }
        self.charged.lock().unwrap().push(total);
        Ok(PaymentSession {
            id: "pi_e2e".to_owned(),
            client_secret: "pi_e2e_secret".to_owned(),
        })
    }
}

/// Mailer double: records reset tokens so tests can complete the flow.
#[derive(Default)]
pub struct RecordingMailer {
    /// Reset tokens handed out, most recent last.
    pub reset_tokens: Mutex<Vec<String>>,
    /// Order ids receipts were sent for.
    pub receipts: Mutex<Vec<String>>,
}

impl RecordingMailer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn last_reset_token(&self) -> Option<String> {
        self.reset_tokens.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_receipt(&self, _to: &Email, order: &Order) -> Result<(), MailError> {
        self.receipts.lock().unwrap().push(order.id.to_string());
        Ok(())
    }

    async fn send_password_reset(
        &self,
        _to: &Email,
        token: &str,
        _expires_at: DateTime<Utc>,
    ) -> Result<(), MailError> {
        self.reset_tokens.lock().unwrap().push(token.to_owned());
        Ok(())
    }
}

/// A running in-process server plus the doubles behind it.
pub struct TestContext {
    pub client: reqwest::Client,
    pub base_url: String,
    pub gateway: Arc<RecordingGateway>,
    pub mailer: Arc<RecordingMailer>,
}

impl TestContext {
    /// Spawn the application on an ephemeral port.
    pub async fn spawn() -> Self {
        let config = ServerConfig {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 0,
            database_url: None,
            jwt_secret: SecretString::from("integration-test-secret-0123456789"),
            stripe_secret_key: SecretString::from("sk_test_unused"),
            sendgrid_api_key: SecretString::from("sg_unused"),
            mail_from: Email::parse("shop@tangelo.test").unwrap(),
            currency: CurrencyCode::Usd,
            assets: None,
        };

        let gateway = Arc::new(RecordingGateway::new());
        let mailer = Arc::new(RecordingMailer::new());

        let state = AppState::new(
            config,
            Arc::new(MemoryStore::new()),
            gateway.clone(),
            mailer.clone(),
            None,
        );
        let app = tangelo_server::app(state);

        let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            client: reqwest::Client::new(),
            base_url: format!("http://{addr}"),
            gateway,
            mailer,
        }
    }

    /// Absolute URL for an API path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}
