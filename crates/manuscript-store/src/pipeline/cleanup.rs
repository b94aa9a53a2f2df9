//! Local cleanup: staged files are deleted once stored remotely, kept otherwise

use std::path::Path;
use std::sync::Arc;

use crate::intake::StagedFile;
use crate::providers::ObjectStore;

/// Delete a staged file whose primary upload succeeded
pub async fn discard_uploaded(file: StagedFile) {
    tracing::debug!(path = %file.path().display(), "Removing uploaded local copy");
    file.discard().await;
}

/// Keep a staged file whose primary upload failed; returns its local name
pub fn retain_failed(file: StagedFile) -> String {
    tracing::debug!(path = %file.path().display(), "Retaining local copy");
    file.retain()
}

/// Best-effort removal of a retained local file; returns whether it was removed
pub async fn remove_local(root: &Path, local_name: &str) -> bool {
    let Some(name) = Path::new(local_name).file_name() else {
        return false;
    };
    let path = root.join(name);
    match tokio::fs::remove_file(&path).await {
        Ok(()) => {
            tracing::info!(path = %path.display(), "Removed local file");
            true
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => {
            tracing::warn!(path = %path.display(), "Failed to remove local file: {}", e);
            false
        }
    }
}

/// Best-effort deletion of a remote object; returns whether it succeeded
pub async fn remove_remote(store: &Arc<dyn ObjectStore>, public_id: &str) -> bool {
    match store.delete(public_id).await {
        Ok(()) => {
            tracing::info!(id = %public_id, backend = store.name(), "Deleted remote object");
            true
        }
        Err(e) => {
            tracing::warn!(
                id = %public_id,
                backend = store.name(),
                "Failed to delete remote object: {}",
                e
            );
            false
        }
    }
}
