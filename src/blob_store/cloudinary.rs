use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::Path;

use super::{BlobStore, UploadedBlob};
use crate::configuration::BlobStoreSettings;
use crate::error::{ConfigError, UploadError};

/// Signed-upload client for a Cloudinary-compatible media host
#[derive(Clone)]
pub struct CloudinaryClient {
    http_client: reqwest::Client,
    base_url: String,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    url: Option<String>,
    secure_url: Option<String>,
}

impl CloudinaryClient {
    pub fn new(settings: &BlobStoreSettings) -> Result<Self, ConfigError> {
        let http_client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| ConfigError::InvalidValue(format!("blob store http client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            cloud_name: settings.cloud_name.clone(),
            api_key: settings.api_key.clone(),
            api_secret: settings.api_secret.clone(),
        })
    }

    fn upload_url(&self) -> String {
        format!("{}/v1_1/{}/auto/upload", self.base_url, self.cloud_name)
    }

    /// Hex SHA-256 over the signed parameters followed by the API secret
    fn sign(&self, timestamp: i64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!("timestamp={}{}", timestamp, self.api_secret).as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

#[async_trait]
impl BlobStore for CloudinaryClient {
    async fn upload(&self, local_path: &Path) -> Result<UploadedBlob, UploadError> {
        if local_path.as_os_str().is_empty() {
            return Err(UploadError::EmptyPath);
        }

        let bytes = tokio::fs::read(local_path)
            .await
            .map_err(|e| UploadError::ReadFailed(e.to_string()))?;
        let file_name = local_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        let timestamp = chrono::Utc::now().timestamp();
        let form = Form::new()
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("signature_algorithm", "sha256")
            .text("signature", self.sign(timestamp))
            .part("file", Part::bytes(bytes).file_name(file_name));

        let response = self
            .http_client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to reach media host: {}", e);
                UploadError::RequestFailed(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), "Media host rejected upload: {}", body);
            return Err(UploadError::Rejected(format!("status {}", status.as_u16())));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| UploadError::Rejected(format!("unreadable response: {}", e)))?;

        body.secure_url
            .or(body.url)
            .map(|url| UploadedBlob { url })
            .ok_or_else(|| UploadError::Rejected("response carried no url".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> CloudinaryClient {
        CloudinaryClient::new(&BlobStoreSettings {
            base_url: "https://api.cloudinary.com/".to_string(),
            cloud_name: "demo".to_string(),
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
            timeout_milliseconds: 1_000,
        })
        .expect("Failed to build client")
    }

    #[test]
    fn test_upload_url() {
        assert_eq!(
            client().upload_url(),
            "https://api.cloudinary.com/v1_1/demo/auto/upload"
        );
    }

    #[test]
    fn test_signature_is_deterministic_hex() {
        let client = client();
        let first = client.sign(1_700_000_000);
        let second = client.sign(1_700_000_000);

        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
        assert_ne!(first, client.sign(1_700_000_001));
    }

    #[tokio::test]
    async fn test_empty_path_rejected() {
        let result = client().upload(Path::new("")).await;
        assert!(matches!(result, Err(UploadError::EmptyPath)));
    }

    #[tokio::test]
    async fn test_missing_file_rejected() {
        let result = client()
            .upload(Path::new("/definitely/not/here.png"))
            .await;
        assert!(matches!(result, Err(UploadError::ReadFailed(_))));
    }
}
