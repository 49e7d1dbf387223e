//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `TANGELO_JWT_SECRET` - Access-token signing secret
//! - `STRIPE_SECRET_KEY` - Payment gateway API key
//! - `SENDGRID_API_KEY` - Transactional mail API key
//! - `TANGELO_MAIL_FROM` - Sender address for outgoing mail
//!
//! ## Optional
//! - `TANGELO_DATABASE_URL` - `PostgreSQL` connection string; without it the
//!   server runs on the in-memory store
//! - `TANGELO_HOST` - Bind address (default: 127.0.0.1)
//! - `TANGELO_PORT` - Listen port (default: 3000)
//! - `TANGELO_CURRENCY` - Shop currency code (default: USD)
//! - `TANGELO_ASSET_BUCKET` - Object-storage bucket for product images
//! - `TANGELO_ASSET_TOKEN` - Object-storage access token (required with the
//!   bucket)

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

use tangelo_core::{CurrencyCode, Email};

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Object-storage configuration.
#[derive(Debug, Clone)]
pub struct AssetConfig {
    /// Bucket holding product images.
    pub bucket: String,
    /// Access token for the bucket.
    pub access_token: SecretString,
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// IP address to bind the server to.
    pub host: IpAddr,
    /// Port to listen on.
    pub port: u16,
    /// `PostgreSQL` connection URL; `None` selects the in-memory store.
    pub database_url: Option<SecretString>,
    /// Access-token signing secret.
    pub jwt_secret: SecretString,
    /// Payment gateway API key.
    pub stripe_secret_key: SecretString,
    /// Transactional mail API key.
    pub sendgrid_api_key: SecretString,
    /// Sender address for outgoing mail.
    pub mail_from: Email,
    /// Shop currency applied to all payments.
    pub currency: CurrencyCode,
    /// Object-storage configuration; `None` disables image uploads.
    pub assets: Option<AssetConfig>,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required variable is missing or a value
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = optional("TANGELO_HOST")?
            .map(|v| parse_var("TANGELO_HOST", &v))
            .transpose()?
            .unwrap_or_else(|| IpAddr::from([127, 0, 0, 1]));

        let port = optional("TANGELO_PORT")?
            .map(|v| parse_var("TANGELO_PORT", &v))
            .transpose()?
            .unwrap_or(3000);

        let currency = optional("TANGELO_CURRENCY")?
            .map(|v| {
                v.parse::<CurrencyCode>()
                    .map_err(|e| ConfigError::InvalidEnvVar("TANGELO_CURRENCY".to_owned(), e))
            })
            .transpose()?
            .unwrap_or_default();

        let mail_from = required("TANGELO_MAIL_FROM")?;
        let mail_from = Email::parse(&mail_from).map_err(|e| {
            ConfigError::InvalidEnvVar("TANGELO_MAIL_FROM".to_owned(), e.to_string())
        })?;

        let assets = match optional("TANGELO_ASSET_BUCKET")? {
            Some(bucket) => Some(AssetConfig {
                bucket,
                access_token: SecretString::from(required("TANGELO_ASSET_TOKEN")?),
            }),
            None => None,
        };

        Ok(Self {
            host,
            port,
            database_url: optional("TANGELO_DATABASE_URL")?.map(SecretString::from),
            jwt_secret: SecretString::from(required("TANGELO_JWT_SECRET")?),
            stripe_secret_key: SecretString::from(required("STRIPE_SECRET_KEY")?),
            sendgrid_api_key: SecretString::from(required("SENDGRID_API_KEY")?),
            mail_from,
            currency,
            assets,
        })
    }

    /// The socket address to bind to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn required(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_owned()))
}

fn optional(name: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(name) {
        Ok(v) if v.is_empty() => Ok(None),
        Ok(v) => Ok(Some(v)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(ConfigError::InvalidEnvVar(name.to_owned(), e.to_string())),
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidEnvVar(name.to_owned(), e.to_string()))
}
