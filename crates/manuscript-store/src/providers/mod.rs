//! Remote object store providers
//!
//! Trait-based abstraction so the pipeline and download resolver can talk to
//! a CDN-style REST store, Google Cloud Storage, or nothing at all.

pub mod disabled;
pub mod http_store;
pub mod object_store;

#[cfg(feature = "gcp")]
pub mod gcs;

use std::sync::Arc;
use std::time::Duration;

use crate::config::{RemoteStoreConfig, RemoteStoreKind};
use crate::error::Result;

pub use disabled::DisabledObjectStore;
pub use http_store::HttpObjectStore;
pub use object_store::{ObjectStore, StoredObject};

#[cfg(feature = "gcp")]
pub use gcs::GcsObjectStore;

/// Build the store described by `config`; `fetch_timeout` bounds download fetches
pub async fn build_object_store(
    config: &RemoteStoreConfig,
    fetch_timeout: Duration,
) -> Result<Arc<dyn ObjectStore>> {
    match config.kind {
        RemoteStoreKind::Disabled => Ok(Arc::new(DisabledObjectStore)),
        RemoteStoreKind::Http => Ok(Arc::new(
            HttpObjectStore::new(config)?.with_fetch_timeout(fetch_timeout),
        )),
        #[cfg(feature = "gcp")]
        RemoteStoreKind::Gcs => Ok(Arc::new(GcsObjectStore::new(config).await?)),
        #[cfg(not(feature = "gcp"))]
        RemoteStoreKind::Gcs => Err(crate::error::Error::Config(
            "GCS object store requires the `gcp` feature".to_string(),
        )),
    }
}
