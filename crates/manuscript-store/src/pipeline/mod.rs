//! Storage pipeline: upload both files, clean up locally, write the record
//!
//! The two files of an upload go through upload → cleanup concurrently; the
//! record is written once both outcomes are known.

pub mod cleanup;
pub mod uploader;
pub mod writer;

use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::intake::ValidatedUpload;
use crate::providers::ObjectStore;
use crate::storage::RecordDb;
use crate::types::{DocumentRecord, FileKind, RecordKind, UploadFlags};

pub use uploader::UploadOutcome;

/// Orchestrates remote storage, local cleanup and persistence
#[derive(Clone)]
pub struct UploadPipeline {
    primary: Arc<dyn ObjectStore>,
    mirror: Option<Arc<dyn ObjectStore>>,
    db: RecordDb,
    storage_root: PathBuf,
}

impl UploadPipeline {
    pub fn new(
        primary: Arc<dyn ObjectStore>,
        mirror: Option<Arc<dyn ObjectStore>>,
        db: RecordDb,
        storage_root: PathBuf,
    ) -> Self {
        Self {
            primary,
            mirror,
            db,
            storage_root,
        }
    }

    /// Store both files and write the record
    pub async fn ingest(&self, upload: ValidatedUpload) -> Result<(DocumentRecord, UploadFlags)> {
        let ValidatedUpload {
            kind,
            metadata,
            docx,
            pdf,
            pdf_derived,
        } = upload;

        tracing::info!(
            collection = %kind,
            title = %metadata.title,
            pdf_derived,
            "Storing upload"
        );

        let mirror = self.mirror.as_ref();
        let (docx, pdf) = tokio::join!(
            uploader::store_file(&self.primary, mirror, kind, FileKind::Docx, docx),
            uploader::store_file(&self.primary, mirror, kind, FileKind::Pdf, pdf),
        );

        let flags = writer::upload_flags(&docx, &pdf);
        let new_record = writer::build_record(kind, metadata, &docx, &pdf);

        match self.db.insert(&new_record) {
            Ok(record) => {
                if flags.any_failed() {
                    tracing::warn!(
                        id = %record.id,
                        error = flags.error.as_deref().unwrap_or_default(),
                        "Record saved with local fallback"
                    );
                } else {
                    tracing::info!(id = %record.id, collection = %kind, "Record saved");
                }
                Ok((record, flags))
            }
            Err(e) => {
                tracing::error!(collection = %kind, "Failed to persist record: {}", e);
                self.rollback(&[&docx, &pdf]).await;
                Err(match e {
                    Error::RecordPersist(msg) => Error::RecordPersist(msg),
                    other => Error::RecordPersist(other.to_string()),
                })
            }
        }
    }

    /// Undo the side effects of an upload whose record could not be written
    async fn rollback(&self, outcomes: &[&UploadOutcome]) {
        for outcome in outcomes {
            if outcome.retained {
                cleanup::remove_local(&self.storage_root, &outcome.local_name).await;
            }
            if let Some(object) = &outcome.remote {
                cleanup::remove_remote(&self.primary, &object.public_id).await;
            }
            if let (Some(store), Some(object)) = (&self.mirror, &outcome.mirror) {
                cleanup::remove_remote(store, &object.public_id).await;
            }
        }
    }

    /// Delete a record and, best-effort, its remote objects and local copies
    ///
    /// Returns the number of remote deletions that failed.
    pub async fn delete_record(&self, kind: RecordKind, id: &Uuid) -> Result<usize> {
        let record = self
            .db
            .get(kind, id)?
            .ok_or_else(|| Error::NotFound(format!("{} {}", kind, id)))?;

        let mut failures = 0;
        for file_kind in [FileKind::Docx, FileKind::Pdf] {
            let file = record.file(file_kind);
            if let Some(remote_id) = file.remote_id {
                if !cleanup::remove_remote(&self.primary, remote_id).await {
                    failures += 1;
                }
            }
            if let (Some(store), Some(mirror_id)) = (&self.mirror, file.mirror_id) {
                if !cleanup::remove_remote(store, mirror_id).await {
                    failures += 1;
                }
            }
            if let Some(local_name) = file.local_name {
                cleanup::remove_local(&self.storage_root, local_name).await;
            }
        }

        self.db.delete(kind, id)?;
        tracing::info!(id = %id, collection = %kind, failures, "Record deleted");
        Ok(failures)
    }
}
