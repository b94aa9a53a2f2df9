//! Storage uploader: pushes one staged file to the primary and mirror stores

use std::sync::Arc;

use crate::error::Error;
use crate::intake::{staging::sanitize_file_name, StagedFile};
use crate::providers::{ObjectStore, StoredObject};
use crate::types::{FileKind, FileLocation, RecordKind};

use super::cleanup;

/// Outcome of storing one file; remote failures are values, not errors
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub kind: FileKind,
    pub local_name: String,
    pub original_name: String,
    /// Primary store result
    pub remote: Option<StoredObject>,
    /// Mirror store result (never affects cleanup)
    pub mirror: Option<StoredObject>,
    /// Primary failure message
    pub error: Option<String>,
    /// Whether the staged file was kept on disk
    pub retained: bool,
}

impl UploadOutcome {
    pub fn failed(&self) -> bool {
        self.remote.is_none()
    }

    /// Location fields for the record
    pub fn location(&self) -> FileLocation {
        FileLocation {
            local_name: Some(self.local_name.clone()),
            original_name: Some(self.original_name.clone()),
            remote_id: self.remote.as_ref().map(|o| o.public_id.clone()),
            remote_url: self.remote.as_ref().map(|o| o.secure_url.clone()),
            mirror_id: self.mirror.as_ref().map(|o| o.public_id.clone()),
        }
    }
}

/// Remote key: `<collection>/<unix-millis>-<file stem>.<ext>`
///
/// The extension keeps the PDF and DOCX of one upload apart when they share
/// a stem and are stored within the same millisecond.
pub fn remote_key(collection: RecordKind, kind: FileKind, original_name: &str) -> String {
    let stem = crate::intake::file_stem(original_name);
    format!(
        "{}/{}-{}.{}",
        collection.table(),
        chrono::Utc::now().timestamp_millis(),
        sanitize_file_name(stem),
        kind.extension()
    )
}

/// Upload a staged file, then delete it on primary success or keep it on failure
pub async fn store_file(
    primary: &Arc<dyn ObjectStore>,
    mirror: Option<&Arc<dyn ObjectStore>>,
    collection: RecordKind,
    kind: FileKind,
    file: StagedFile,
) -> UploadOutcome {
    let key = remote_key(collection, kind, file.original_name());

    let primary_upload = primary.upload(file.path(), &key);
    let mirror_upload = async {
        match mirror {
            Some(store) => Some(store.upload(file.path(), &key).await),
            None => None,
        }
    };
    let (primary_result, mirror_result) = tokio::join!(primary_upload, mirror_upload);

    let mirror = match mirror_result {
        Some(Ok(object)) => {
            tracing::info!(key = %key, id = %object.public_id, "Mirror upload succeeded");
            Some(object)
        }
        Some(Err(e)) => {
            tracing::warn!(key = %key, "Mirror upload failed: {}", e);
            None
        }
        None => None,
    };

    let original_name = file.original_name().to_string();
    match primary_result {
        Ok(object) => {
            tracing::info!(
                file = %original_name,
                id = %object.public_id,
                backend = primary.name(),
                "Remote upload succeeded"
            );
            let local_name = file.local_name().to_string();
            cleanup::discard_uploaded(file).await;
            UploadOutcome {
                kind,
                local_name,
                original_name,
                remote: Some(object),
                mirror,
                error: None,
                retained: false,
            }
        }
        Err(e) => {
            let message = match e {
                Error::RemoteUpload { message, .. } => message,
                other => other.to_string(),
            };
            tracing::warn!(
                file = %original_name,
                backend = primary.name(),
                "Remote upload failed, keeping local copy: {}",
                message
            );
            let local_name = cleanup::retain_failed(file);
            UploadOutcome {
                kind,
                local_name,
                original_name,
                remote: None,
                mirror,
                error: Some(message),
                retained: true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_key_shape() {
        let key = remote_key(RecordKind::Journal, FileKind::Pdf, "My Paper.final.pdf");
        let (collection, rest) = key.split_once('/').unwrap();
        assert_eq!(collection, "journals");
        let (millis, name) = rest.split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(name, "My_Paper.final.pdf");
    }

    #[test]
    fn test_same_stem_keys_differ_by_kind() {
        let docx = remote_key(RecordKind::Submission, FileKind::Docx, "survey.docx");
        let pdf = remote_key(RecordKind::Submission, FileKind::Pdf, "survey.pdf");
        assert!(docx.ends_with("-survey.docx"));
        assert!(pdf.ends_with("-survey.pdf"));
        assert_ne!(docx, pdf);
    }
}
