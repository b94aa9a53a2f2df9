//! Journal and submission records as persisted in the document store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which collection a record belongs to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// Published journal article (PDF + DOCX uploaded together)
    Journal,
    /// Manuscript submission (DOCX uploaded, PDF derived)
    Submission,
}

impl RecordKind {
    /// Database table backing this collection
    pub fn table(&self) -> &'static str {
        match self {
            Self::Journal => "journals",
            Self::Submission => "submissions",
        }
    }

    /// Singular label used in messages and response keys
    pub fn label(&self) -> &'static str {
        match self {
            Self::Journal => "journal",
            Self::Submission => "submission",
        }
    }

    /// Statuses a record of this kind may take
    pub fn allowed_statuses(&self) -> &'static [RecordStatus] {
        match self {
            Self::Journal => &[
                RecordStatus::Submitted,
                RecordStatus::Reviewed,
                RecordStatus::Accepted,
                RecordStatus::Published,
            ],
            Self::Submission => &[
                RecordStatus::Submitted,
                RecordStatus::UnderReview,
                RecordStatus::Accepted,
                RecordStatus::Rejected,
            ],
        }
    }

    /// Check whether `status` is valid for this kind
    pub fn allows(&self, status: RecordStatus) -> bool {
        self.allowed_statuses().contains(&status)
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Editorial status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum RecordStatus {
    Submitted,
    Reviewed,
    UnderReview,
    Accepted,
    Published,
    Rejected,
}

impl RecordStatus {
    /// Wire/database representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::Reviewed => "reviewed",
            Self::UnderReview => "under-review",
            Self::Accepted => "accepted",
            Self::Published => "published",
            Self::Rejected => "rejected",
        }
    }

    /// Parse the wire representation (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "submitted" => Some(Self::Submitted),
            "reviewed" => Some(Self::Reviewed),
            "under-review" | "under_review" => Some(Self::UnderReview),
            "accepted" => Some(Self::Accepted),
            "published" => Some(Self::Published),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two file slots of a record
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Pdf,
    Docx,
}

impl FileKind {
    /// Canonical extension (without the dot)
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }

    /// Content type served on download
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    /// Parse the `:kind` path segment of download routes
    pub fn from_segment(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            _ => None,
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Borrowed view of one file slot of a record
#[derive(Debug, Clone, Copy)]
pub struct FileRef<'a> {
    pub kind: FileKind,
    pub local_name: Option<&'a str>,
    pub original_name: Option<&'a str>,
    pub remote_id: Option<&'a str>,
    pub remote_url: Option<&'a str>,
    pub mirror_id: Option<&'a str>,
}

/// A journal or submission record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub id: Uuid,
    pub kind: RecordKind,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub authors: Vec<String>,
    pub keywords: Vec<String>,
    pub docx_local_name: Option<String>,
    pub pdf_local_name: Option<String>,
    pub docx_original_name: Option<String>,
    pub pdf_original_name: Option<String>,
    pub docx_remote_id: Option<String>,
    pub pdf_remote_id: Option<String>,
    pub docx_remote_url: Option<String>,
    pub pdf_remote_url: Option<String>,
    pub docx_mirror_id: Option<String>,
    pub pdf_mirror_id: Option<String>,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentRecord {
    /// View one file slot
    pub fn file(&self, kind: FileKind) -> FileRef<'_> {
        match kind {
            FileKind::Pdf => FileRef {
                kind,
                local_name: self.pdf_local_name.as_deref(),
                original_name: self.pdf_original_name.as_deref(),
                remote_id: self.pdf_remote_id.as_deref(),
                remote_url: self.pdf_remote_url.as_deref(),
                mirror_id: self.pdf_mirror_id.as_deref(),
            },
            FileKind::Docx => FileRef {
                kind,
                local_name: self.docx_local_name.as_deref(),
                original_name: self.docx_original_name.as_deref(),
                remote_id: self.docx_remote_id.as_deref(),
                remote_url: self.docx_remote_url.as_deref(),
                mirror_id: self.docx_mirror_id.as_deref(),
            },
        }
    }
}

/// Where one file ended up after the upload pipeline
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileLocation {
    pub local_name: Option<String>,
    pub original_name: Option<String>,
    pub remote_id: Option<String>,
    pub remote_url: Option<String>,
    pub mirror_id: Option<String>,
}

/// Everything needed to insert a record; id and timestamps come from the store
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub kind: RecordKind,
    pub title: String,
    pub abstract_text: String,
    pub authors: Vec<String>,
    pub keywords: Vec<String>,
    pub docx: FileLocation,
    pub pdf: FileLocation,
    pub status: RecordStatus,
}
