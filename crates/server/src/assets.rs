//! Object-storage capability for product images.
//!
//! Uploads return a public URL that is stored on the product; deletes are
//! best-effort cleanup when a product goes away. [`GcsAssetStore`] talks to
//! a Google Cloud Storage bucket over its JSON upload API.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Errors from the object store.
#[derive(Debug, Error)]
pub enum AssetError {
    /// HTTP request failed.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store rejected the request.
    #[error("api error: {status} - {message}")]
    Api { status: u16, message: String },
}

/// Capability to upload and delete binary assets.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Upload bytes under the given object name, returning the public URL.
    async fn upload(&self, name: &str, bytes: Vec<u8>) -> Result<String, AssetError>;

    /// Delete the object behind a previously returned public URL.
    async fn delete(&self, url: &str) -> Result<(), AssetError>;
}

/// [`AssetStore`] backed by a Google Cloud Storage bucket.
pub struct GcsAssetStore {
    client: reqwest::Client,
    bucket: String,
    access_token: SecretString,
    api_base: String,
}

impl GcsAssetStore {
    /// Public URL prefix for objects in a bucket.
    const PUBLIC_BASE: &'static str = "https://storage.googleapis.com";

    /// GCS JSON API base URL.
    const API_BASE: &'static str = "https://storage.googleapis.com";

    /// Create a new asset store client.
    #[must_use]
    pub fn new(bucket: String, access_token: SecretString) -> Self {
        Self::with_api_base(bucket, access_token, Self::API_BASE.to_owned())
    }

    /// Create an asset store client against a non-default endpoint.
    #[must_use]
    pub fn with_api_base(bucket: String, access_token: SecretString, api_base: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            bucket,
            access_token,
            api_base,
        }
    }

    /// The public URL an object will be served from.
    #[must_use]
    pub fn public_url(&self, name: &str) -> String {
        format!("{}/{}/{name}", Self::PUBLIC_BASE, self.bucket)
    }

    /// Extract the object name from one of our public URLs.
    fn object_name<'a>(&self, url: &'a str) -> Option<&'a str> {
        let prefix = format!("{}/{}/", Self::PUBLIC_BASE, self.bucket);
        url.strip_prefix(prefix.as_str())
    }
}

#[async_trait]
impl AssetStore for GcsAssetStore {
    async fn upload(&self, name: &str, bytes: Vec<u8>) -> Result<String, AssetError> {
        let url = format!(
            "{}/upload/storage/v1/b/{}/o?uploadType=media&name={name}",
            self.api_base, self.bucket
        );

        let response = self
            .client
            .post(url)
            .bearer_auth(self.access_token.expose_secret())
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AssetError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(self.public_url(name))
    }

    async fn delete(&self, url: &str) -> Result<(), AssetError> {
        // URLs not minted by this store are ignored
        let Some(name) = self.object_name(url) else {
            return Ok(());
        };

        let endpoint = format!("{}/storage/v1/b/{}/o/{name}", self.api_base, self.bucket);

        let response = self
            .client
            .delete(endpoint)
            .bearer_auth(self.access_token.expose_secret())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() && status != reqwest::StatusCode::NOT_FOUND {
            let message = response.text().await.unwrap_or_default();
            return Err(AssetError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> GcsAssetStore {
        GcsAssetStore::new("tangelo-assets".to_owned(), SecretString::from("token"))
    }

    #[test]
    fn public_url_points_into_the_bucket() {
        assert_eq!(
            store().public_url("shoe.png"),
            "https://storage.googleapis.com/tangelo-assets/shoe.png"
        );
    }

    #[test]
    fn object_name_round_trips_through_public_url() {
        let store = store();
        let url = store.public_url("shoe.png");
        assert_eq!(store.object_name(&url), Some("shoe.png"));
        assert_eq!(store.object_name("https://elsewhere.example/x.png"), None);
    }
}
