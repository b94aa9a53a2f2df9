//! Google Cloud Storage object store

use async_trait::async_trait;
use futures_util::StreamExt;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

use google_cloud_storage::client::{Client as GcsClient, ClientConfig};
use google_cloud_storage::http::object_access_controls::PredefinedObjectAcl;
use google_cloud_storage::http::objects::delete::DeleteObjectRequest;
use google_cloud_storage::http::objects::download::Range;
use google_cloud_storage::http::objects::get::GetObjectRequest;
use google_cloud_storage::http::objects::upload::{Media, UploadObjectRequest, UploadType};

use super::object_store::{ObjectStore, StoredObject};
use crate::config::RemoteStoreConfig;
use crate::error::{Error, Result};

/// Google Cloud Storage object store
pub struct GcsObjectStore {
    client: GcsClient,
    bucket: String,
    prefix: String,
}

impl GcsObjectStore {
    /// Create a new GCS store using ambient service-account credentials
    pub async fn new(config: &RemoteStoreConfig) -> Result<Self> {
        if config.bucket.trim().is_empty() {
            return Err(Error::Config("GCS object store requires bucket".to_string()));
        }

        let client_config = ClientConfig::default()
            .with_auth()
            .await
            .map_err(|e| Error::Config(format!("Failed to create GCS client: {}", e)))?;

        Ok(Self {
            client: GcsClient::new(client_config),
            bucket: config.bucket.clone(),
            prefix: config.prefix.clone(),
        })
    }

    fn object_path(&self, key: &str) -> String {
        if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}/{}", self.prefix.trim_end_matches('/'), key)
        }
    }

    fn public_url(&self, object: &str) -> String {
        format!("https://storage.googleapis.com/{}/{}", self.bucket, object)
    }
}

#[async_trait]
impl ObjectStore for GcsObjectStore {
    async fn upload(&self, local_path: &Path, key: &str) -> Result<StoredObject> {
        let object = self.object_path(key);

        let file = tokio::fs::File::open(local_path).await?;
        let length = file.metadata().await?.len();

        let mut media = Media::new(object.clone());
        media.content_type = mime_guess::from_path(local_path)
            .first_or_octet_stream()
            .to_string()
            .into();
        media.content_length = Some(length);

        self.client
            .upload_streamed_object(
                &UploadObjectRequest {
                    bucket: self.bucket.clone(),
                    predefined_acl: Some(PredefinedObjectAcl::PublicRead),
                    ..Default::default()
                },
                ReaderStream::new(file),
                &UploadType::Simple(media),
            )
            .await
            .map_err(|e| Error::remote_upload(self.name(), e.to_string()))?;

        Ok(StoredObject {
            secure_url: self.public_url(&object),
            public_id: object,
        })
    }

    async fn delete(&self, public_id: &str) -> Result<()> {
        self.client
            .delete_object(&DeleteObjectRequest {
                bucket: self.bucket.clone(),
                object: public_id.to_string(),
                ..Default::default()
            })
            .await
            .map_err(|e| Error::Internal(format!("Failed to delete from GCS: {}", e)))
    }

    async fn fetch_to(&self, public_id: &str, dest: &Path) -> Result<u64> {
        let mut stream = self
            .client
            .download_streamed_object(
                &GetObjectRequest {
                    bucket: self.bucket.clone(),
                    object: public_id.to_string(),
                    ..Default::default()
                },
                &Range::default(),
            )
            .await
            .map_err(|e| Error::Internal(format!("Failed to download from GCS: {}", e)))?;

        let mut file = tokio::fs::File::create(dest).await?;
        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk =
                chunk.map_err(|e| Error::Internal(format!("GCS download interrupted: {}", e)))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        Ok(written)
    }

    fn name(&self) -> &str {
        "gcs"
    }
}
