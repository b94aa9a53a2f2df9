//! CDN-style REST object store
//!
//! Uploads are signed multipart POSTs to `upload_url`; the signature is the
//! SHA-256 of the sorted signed parameters followed by the API secret.
//! Objects are fetched from `<delivery_url>/<public_id>` and removed through
//! the sibling `destroy` endpoint.

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

use super::object_store::{ObjectStore, StoredObject};
use crate::config::RemoteStoreConfig;
use crate::error::{Error, Result};

/// REST object store client
pub struct HttpObjectStore {
    client: Client,
    upload_url: String,
    delivery_url: String,
    api_key: String,
    api_secret: String,
    prefix: String,
    /// Per-request timeout for `fetch_to`; uploads use the client defaults
    fetch_timeout: Duration,
}

/// Fetch timeout when none is configured
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct UploadReply {
    public_id: String,
    secure_url: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DestroyReply {
    result: String,
}

impl HttpObjectStore {
    /// Create a store from its configuration
    pub fn new(config: &RemoteStoreConfig) -> Result<Self> {
        if config.upload_url.trim().is_empty() {
            return Err(Error::Config(
                "HTTP object store requires upload_url".to_string(),
            ));
        }

        Ok(Self {
            client: Client::new(),
            upload_url: config.upload_url.trim_end_matches('/').to_string(),
            delivery_url: config.delivery_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            prefix: config.prefix.clone(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        })
    }

    /// Bound the time a download fetch may take
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    fn destroy_url(&self) -> String {
        match self.upload_url.strip_suffix("/upload") {
            Some(base) => format!("{}/destroy", base),
            None => format!("{}/destroy", self.upload_url),
        }
    }

    fn full_key(&self, key: &str) -> String {
        if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}/{}", self.prefix.trim_end_matches('/'), key)
        }
    }

    fn failure(&self, message: impl Into<String>) -> Error {
        Error::remote_upload(self.name(), message)
    }
}

/// Sign request parameters: `k1=v1&k2=v2<secret>` hashed with SHA-256
pub fn sign_params(params: &[(&str, &str)], secret: &str) -> String {
    let mut sorted: Vec<_> = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn upload(&self, local_path: &Path, key: &str) -> Result<StoredObject> {
        let public_id = self.full_key(key);
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign_params(
            &[
                ("access_mode", "public"),
                ("public_id", public_id.as_str()),
                ("timestamp", timestamp.as_str()),
            ],
            &self.api_secret,
        );

        let file = tokio::fs::File::open(local_path).await?;
        let length = file.metadata().await?.len();
        let file_name = local_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        let content_type = mime_guess::from_path(local_path)
            .first_or_octet_stream()
            .to_string();

        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));
        let part = reqwest::multipart::Part::stream_with_length(body, length)
            .file_name(file_name)
            .mime_str(&content_type)?;

        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("public_id", public_id.clone())
            .text("access_mode", "public")
            .text("timestamp", timestamp)
            .text("api_key", self.api_key.clone())
            .text("signature_algorithm", "sha256")
            .text("signature", signature);

        let response = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.failure(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(self.failure(format!("{} - {}", status, body)));
        }

        let reply: UploadReply = response
            .json()
            .await
            .map_err(|e| self.failure(format!("invalid upload response: {}", e)))?;

        let secure_url = reply
            .secure_url
            .or(reply.url)
            .unwrap_or_else(|| format!("{}/{}", self.delivery_url, reply.public_id));

        tracing::debug!(public_id = %reply.public_id, bytes = length, "Uploaded object");

        Ok(StoredObject {
            public_id: reply.public_id,
            secure_url,
        })
    }

    async fn delete(&self, public_id: &str) -> Result<()> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign_params(
            &[("public_id", public_id), ("timestamp", timestamp.as_str())],
            &self.api_secret,
        );

        let response = self
            .client
            .post(self.destroy_url())
            .form(&[
                ("public_id", public_id),
                ("timestamp", timestamp.as_str()),
                ("api_key", self.api_key.as_str()),
                ("signature_algorithm", "sha256"),
                ("signature", signature.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Internal(format!(
                "Object delete failed: {} - {}",
                status, body
            )));
        }

        let reply: DestroyReply = response.json().await?;
        match reply.result.as_str() {
            "ok" | "not found" => Ok(()),
            other => Err(Error::Internal(format!("Object delete failed: {}", other))),
        }
    }

    async fn fetch_to(&self, public_id: &str, dest: &Path) -> Result<u64> {
        if self.delivery_url.is_empty() {
            return Err(Error::Config(
                "HTTP object store has no delivery_url".to_string(),
            ));
        }

        let url = format!("{}/{}", self.delivery_url, public_id);
        let response = self
            .client
            .get(&url)
            .timeout(self.fetch_timeout)
            .send()
            .await?
            .error_for_status()?;

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        Ok(written)
    }

    fn name(&self) -> &str {
        "http"
    }
}
