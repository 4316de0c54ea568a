//! Blob storage client
//!
//! Uploads and deletes objects in the remote service's storage buckets
//! and derives public URLs for stored objects.

use crate::auth::TokenCell;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Network storage client
#[derive(Debug, Clone)]
pub struct StorageClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    token: TokenCell,
}

impl StorageClient {
    pub fn new(config: &ClientConfig, token: TokenCell) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            token,
        })
    }

    /// Public URL of an object in a public bucket.
    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{bucket}/{path}", self.base_url)
    }

    fn object_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/{bucket}/{path}", self.base_url)
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let bearer = self.token.get().unwrap_or_else(|| self.api_key.clone());
        request
            .header("apikey", &self.api_key)
            .bearer_auth(bearer)
    }

    /// Upload an object, replacing any existing one at the same path.
    /// Returns the public URL.
    pub async fn upload(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> ClientResult<String> {
        tracing::debug!(bucket, path, len = bytes.len(), "uploading object");
        let response = self
            .authed(self.client.post(self.object_url(bucket, path)))
            .header("Content-Type", content_type)
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            let text = response.text().await?;
            return Err(ClientError::Internal(format!(
                "{bucket}/{path}: upload failed: {text}"
            )));
        }
        Ok(self.public_url(bucket, path))
    }

    /// Delete an object.
    pub async fn delete(&self, bucket: &str, path: &str) -> ClientResult<()> {
        let response = self
            .authed(self.client.delete(self.object_url(bucket, path)))
            .send()
            .await?;
        if !response.status().is_success() {
            let text = response.text().await?;
            return Err(ClientError::Internal(format!(
                "{bucket}/{path}: delete failed: {text}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_url_has_the_expected_shape() {
        let config = ClientConfig::new("https://db.example.co/", "anon-key");
        let storage = StorageClient::new(&config, TokenCell::default()).unwrap();
        assert_eq!(
            storage.public_url("product-images", "p1/front.webp"),
            "https://db.example.co/storage/v1/object/public/product-images/p1/front.webp"
        );
    }
}
