//! Object store provider trait for remote file storage

use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;

/// What a remote store hands back after an upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Identifier used to fetch or delete the object later
    pub public_id: String,
    /// Publicly resolvable URL
    pub secure_url: String,
}

/// Trait for remote object storage
///
/// Implementations:
/// - `HttpObjectStore`: CDN-style REST store
/// - `GcsObjectStore`: Google Cloud Storage (feature `gcp`)
/// - `DisabledObjectStore`: no remote configured
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload a local file under `key`, requesting public read access
    async fn upload(&self, local_path: &Path, key: &str) -> Result<StoredObject>;

    /// Delete an object by identifier
    async fn delete(&self, public_id: &str) -> Result<()>;

    /// Download an object into `dest`, returning the byte count
    async fn fetch_to(&self, public_id: &str, dest: &Path) -> Result<u64>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
