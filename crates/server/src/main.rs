//! Tangelo - e-commerce API server.
//!
//! # Architecture
//!
//! - Axum web framework serving a JSON API
//! - `PostgreSQL` (or an in-memory store for local development) for users,
//!   products, and orders
//! - Stripe for payment sessions, SendGrid for transactional mail, and a
//!   GCS bucket for product images

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tangelo_server::assets::{AssetStore, GcsAssetStore};
use tangelo_server::config::ServerConfig;
use tangelo_server::mail::SendGridMailer;
use tangelo_server::payments::StripeGateway;
use tangelo_server::state::AppState;
use tangelo_server::store::{MemoryStore, PgStore, Store};

#[tokio::main]
async fn main() {
    // .env is optional; environment always wins
    let _ = dotenvy::dotenv();

    let config = ServerConfig::from_env().expect("Failed to load configuration");

    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tangelo_server=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            let store = PgStore::connect(url)
                .await
                .expect("Failed to connect to database");
            store.migrate().await.expect("Failed to run migrations");
            tracing::info!("connected to postgres");
            Arc::new(store)
        }
        None => {
            tracing::warn!("no TANGELO_DATABASE_URL set, using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let gateway = Arc::new(StripeGateway::new(config.stripe_secret_key.clone()));
    let mailer = Arc::new(SendGridMailer::new(
        config.sendgrid_api_key.clone(),
        config.mail_from.clone(),
    ));
    let assets: Option<Arc<dyn AssetStore>> = config.assets.as_ref().map(|a| {
        Arc::new(GcsAssetStore::new(a.bucket.clone(), a.access_token.clone()))
            as Arc<dyn AssetStore>
    });

    let state = AppState::new(config.clone(), store, gateway, mailer, assets);
    let app = tangelo_server::app(state);

    let addr = config.socket_addr();
    tracing::info!("tangelo listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
