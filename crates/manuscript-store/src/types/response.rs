//! API response shapes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::record::{DocumentRecord, FileKind, RecordStatus};

/// Remote-upload outcome flags reported back to the client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadFlags {
    pub docx_failed: bool,
    pub pdf_failed: bool,
    /// Combined error message of the failed uploads
    pub error: Option<String>,
}

impl UploadFlags {
    /// True when any remote upload failed
    pub fn any_failed(&self) -> bool {
        self.docx_failed || self.pdf_failed
    }
}

/// Record as returned from upload endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSummary {
    pub id: Uuid,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub authors: Vec<String>,
    pub keywords: Vec<String>,
    pub status: RecordStatus,
    pub has_docx: bool,
    pub has_pdf: bool,
    pub docx_link: Option<String>,
    pub pdf_link: Option<String>,
    /// Legacy name: true when any remote upload failed
    pub google_drive_upload_failed: bool,
    /// Legacy name: remote upload error message
    pub google_drive_error: Option<String>,
    pub docx_upload_failed: bool,
    pub pdf_upload_failed: bool,
    pub created_at: DateTime<Utc>,
}

impl RecordSummary {
    /// Build the summary for a freshly written record
    pub fn new(record: &DocumentRecord, flags: &UploadFlags) -> Self {
        Self {
            id: record.id,
            title: record.title.clone(),
            abstract_text: record.abstract_text.clone(),
            authors: record.authors.clone(),
            keywords: record.keywords.clone(),
            status: record.status,
            has_docx: record.docx_local_name.is_some() || record.docx_remote_id.is_some(),
            has_pdf: record.pdf_local_name.is_some() || record.pdf_remote_id.is_some(),
            docx_link: file_link(record, FileKind::Docx),
            pdf_link: file_link(record, FileKind::Pdf),
            google_drive_upload_failed: flags.any_failed(),
            google_drive_error: flags.error.clone(),
            docx_upload_failed: flags.docx_failed,
            pdf_upload_failed: flags.pdf_failed,
            created_at: record.created_at,
        }
    }
}

/// Public link for a file: the remote URL when stored remotely, else the download route
pub fn file_link(record: &DocumentRecord, kind: FileKind) -> Option<String> {
    let file = record.file(kind);
    if let Some(url) = file.remote_url {
        return Some(url.to_string());
    }
    if file.local_name.is_some() || file.remote_id.is_some() || file.mirror_id.is_some() {
        return Some(format!("/download/{}/{}", kind.extension(), record.id));
    }
    None
}

/// Response for `POST /api/journals` and `POST /api/submissions`
#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    pub message: String,
    #[serde(flatten)]
    pub body: UploadBody,
}

/// Keyed by collection so journals answer `{journal: ...}` and submissions `{submission: ...}`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadBody {
    Journal(RecordSummary),
    Submission(RecordSummary),
}

/// Response for record listings
#[derive(Debug, Clone, Serialize)]
pub struct RecordListResponse {
    pub records: Vec<DocumentRecord>,
    pub total: usize,
}

/// Body of `PATCH /:id/status`
#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

/// Response for record deletion
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub id: Uuid,
    pub message: String,
    /// Remote objects that could not be deleted (logged, not fatal)
    pub remote_delete_failures: usize,
}
