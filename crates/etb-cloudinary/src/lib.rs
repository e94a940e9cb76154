//! Cloudinary adapter.
//!
//! Implements the `etb-core` BlobStore port over the upload REST API with
//! signed multipart requests; the response's `secure_url` is the durable
//! retrieval URL.

use std::time::Duration;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use etb_core::{
    config::CloudinaryConfig,
    errors::Error,
    ports::{BlobStore, ObjectKey},
    Result,
};

const API_BASE: &str = "https://api.cloudinary.com/v1_1";

pub struct CloudinaryClient {
    cfg: CloudinaryConfig,
    http: reqwest::Client,
}

impl CloudinaryClient {
    pub fn new(cfg: CloudinaryConfig, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("http client build failed: {e}")))?;
        Ok(Self { cfg, http })
    }
}

/// Signature over the alphabetically-ordered request parameters plus the API
/// secret. Cloudinary accepts SHA-1 and SHA-256 digests and tells them apart
/// by length.
fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted: Vec<(&str, &str)> = params.to_vec();
    sorted.sort_by_key(|&(k, _)| k);

    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let digest = Sha256::digest(format!("{joined}{api_secret}").as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[async_trait]
impl BlobStore for CloudinaryClient {
    async fn upload(&self, key: &ObjectKey, bytes: Vec<u8>) -> Result<String> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let params = [
            ("folder", key.folder.as_str()),
            ("public_id", key.name.as_str()),
            ("timestamp", timestamp.as_str()),
        ];
        let signature = sign(&params, &self.cfg.api_secret);

        let form = reqwest::multipart::Form::new()
            .text("api_key", self.cfg.api_key.clone())
            .text("timestamp", timestamp)
            .text("public_id", key.name.clone())
            .text("folder", key.folder.clone())
            .text("signature", signature)
            .part(
                "file",
                reqwest::multipart::Part::bytes(bytes)
                    .file_name("photo.jpg")
                    .mime_str("image/jpeg")
                    .map_err(|e| Error::UploadFailed(format!("multipart build failed: {e}")))?,
            );

        let url = format!("{API_BASE}/{}/image/upload", self.cfg.cloud_name);
        let resp = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::UploadFailed(format!("upload request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::UploadFailed(format!(
                "upload rejected: {status} {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let v: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| Error::UploadFailed(format!("upload response malformed: {e}")))?;

        let secure_url = v
            .get("secure_url")
            .and_then(|u| u.as_str())
            .unwrap_or("")
            .to_string();
        if secure_url.is_empty() {
            return Err(Error::UploadFailed(
                "no secure_url in upload response".to_string(),
            ));
        }

        Ok(secure_url)
    }

    async fn probe(&self) -> Result<()> {
        let url = format!("{API_BASE}/{}/usage", self.cfg.cloud_name);
        let resp = self
            .http
            .get(url)
            .basic_auth(&self.cfg.api_key, Some(&self.cfg.api_secret))
            .send()
            .await
            .map_err(|e| Error::StoreUnavailable(format!("cloudinary unreachable: {e}")))?;

        if !resp.status().is_success() {
            return Err(Error::StoreUnavailable(format!(
                "cloudinary returned {}",
                resp.status()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_hex_sha256() {
        let sig = sign(
            &[("timestamp", "1700000000"), ("public_id", "x")],
            "secret",
        );
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn signature_is_independent_of_parameter_order() {
        let a = sign(
            &[("folder", "telegram_bot"), ("public_id", "x"), ("timestamp", "1")],
            "secret",
        );
        let b = sign(
            &[("timestamp", "1"), ("folder", "telegram_bot"), ("public_id", "x")],
            "secret",
        );
        assert_eq!(a, b);
    }

    #[test]
    fn signature_depends_on_the_secret() {
        let params = [("timestamp", "1"), ("public_id", "x")];
        assert_ne!(sign(&params, "secret-a"), sign(&params, "secret-b"));
    }
}
