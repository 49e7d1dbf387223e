//! Application state shared across handlers.

use std::sync::Arc;

use crate::assets::AssetStore;
use crate::config::ServerConfig;
use crate::mail::Mailer;
use crate::payments::PaymentGateway;
use crate::services::token::TokenIssuer;
use crate::store::Store;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Every external capability (store, payment
/// gateway, mailer, asset store) sits behind a trait object so tests can
/// substitute doubles.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    store: Arc<dyn Store>,
    gateway: Arc<dyn PaymentGateway>,
    mailer: Arc<dyn Mailer>,
    assets: Option<Arc<dyn AssetStore>>,
    tokens: TokenIssuer,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        config: ServerConfig,
        store: Arc<dyn Store>,
        gateway: Arc<dyn PaymentGateway>,
        mailer: Arc<dyn Mailer>,
        assets: Option<Arc<dyn AssetStore>>,
    ) -> Self {
        let tokens = TokenIssuer::new(&config.jwt_secret);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                gateway,
                mailer,
                assets,
                tokens,
            }),
        }
    }

    /// The server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// The persistence capability.
    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    /// The payment gateway capability.
    #[must_use]
    pub fn gateway(&self) -> &dyn PaymentGateway {
        self.inner.gateway.as_ref()
    }

    /// The transactional mail capability.
    #[must_use]
    pub fn mailer(&self) -> &dyn Mailer {
        self.inner.mailer.as_ref()
    }

    /// The object-storage capability, if configured.
    #[must_use]
    pub fn assets(&self) -> Option<&dyn AssetStore> {
        self.inner.assets.as_deref()
    }

    /// The access-token issuer.
    #[must_use]
    pub fn tokens(&self) -> &TokenIssuer {
        &self.inner.tokens
    }
}
