//! Placeholder store used when no remote backend is configured

use async_trait::async_trait;
use std::path::Path;

use super::object_store::{ObjectStore, StoredObject};
use crate::error::{Error, Result};

/// Store that rejects every operation, so uploads degrade to local-only
#[derive(Debug, Default)]
pub struct DisabledObjectStore;

#[async_trait]
impl ObjectStore for DisabledObjectStore {
    async fn upload(&self, _local_path: &Path, _key: &str) -> Result<StoredObject> {
        Err(Error::remote_upload(self.name(), "no remote store configured"))
    }

    async fn delete(&self, _public_id: &str) -> Result<()> {
        Err(Error::internal("no remote store configured"))
    }

    async fn fetch_to(&self, _public_id: &str, _dest: &Path) -> Result<u64> {
        Err(Error::internal("no remote store configured"))
    }

    fn name(&self) -> &str {
        "disabled"
    }
}
