//! Error types for the manuscript store

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// Result type alias for manuscript store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Whether error responses carry the underlying detail (off in production)
static EXPOSE_DETAIL: AtomicBool = AtomicBool::new(true);

/// Toggle inclusion of `error.detail` in JSON error bodies
pub fn expose_error_detail(enabled: bool) {
    EXPOSE_DETAIL.store(enabled, Ordering::Relaxed);
}

/// Sources tried by the download resolver before giving up
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AttemptedSources {
    /// Remote object identifiers (primary and mirror)
    pub remote_ids: Vec<String>,
    /// Remote URLs after attachment rewrite
    pub remote_urls: Vec<String>,
    /// Local filesystem candidates, in scan order
    pub local_paths: Vec<String>,
}

/// Manuscript store errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Required text fields missing or malformed (every failing field listed)
    #[error("Validation failed: {}", .fields.join(", "))]
    Validation { fields: Vec<String> },

    /// Malformed or oversized request body
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A required file part was not supplied
    #[error("Missing required file: {0}")]
    MissingFile(String),

    /// Extension, declared MIME type or signature bytes do not match
    #[error("Invalid file type for '{filename}': {message}")]
    FileType { filename: String, message: String },

    /// File name looks like traversal, a device name or an executable
    #[error("Suspicious file name '{filename}': {reason}")]
    SuspiciousFileName { filename: String, reason: String },

    /// A single remote upload failed (captured per file, never fatal)
    #[error("Remote upload to {backend} failed: {message}")]
    RemoteUpload { backend: String, message: String },

    /// The record could not be written
    #[error("Failed to persist record: {0}")]
    RecordPersist(String),

    /// Record or file not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Every download strategy failed
    #[error("No download source available for {record_id} ({kind})")]
    DownloadSourceExhausted {
        record_id: String,
        kind: String,
        attempted: AttemptedSources,
    },

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a file type error
    pub fn file_type(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileType {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create a suspicious file name error
    pub fn suspicious(filename: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SuspiciousFileName {
            filename: filename.into(),
            reason: reason.into(),
        }
    }

    /// Create a remote upload error
    pub fn remote_upload(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RemoteUpload {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Stable machine-readable error type
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "ConfigError",
            Error::Validation { .. } => "ValidationError",
            Error::BadRequest(_) => "BadRequestError",
            Error::MissingFile(_) => "MissingFileError",
            Error::FileType { .. } => "FileTypeError",
            Error::SuspiciousFileName { .. } => "SuspiciousFileNameError",
            Error::RemoteUpload { .. } => "RemoteUploadError",
            Error::RecordPersist(_) => "RecordPersistError",
            Error::NotFound(_) => "NotFoundError",
            Error::DownloadSourceExhausted { .. } => "DownloadSourceExhaustedError",
            Error::Database(_) => "DatabaseError",
            Error::Io(_) => "IoError",
            Error::Json(_) => "JsonError",
            Error::Http(_) => "HttpError",
            Error::Internal(_) => "InternalError",
        }
    }

    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Validation { .. }
            | Error::BadRequest(_)
            | Error::MissingFile(_)
            | Error::FileType { .. }
            | Error::SuspiciousFileName { .. }
            | Error::Json(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) | Error::DownloadSourceExhausted { .. } => StatusCode::NOT_FOUND,
            Error::RemoteUpload { .. } | Error::Http(_) => StatusCode::BAD_GATEWAY,
            Error::Config(_)
            | Error::RecordPersist(_)
            | Error::Database(_)
            | Error::Io(_)
            | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message; internal failures are not echoed verbatim
    fn public_message(&self) -> String {
        match self {
            Error::Validation { fields } => {
                format!("Missing or invalid required fields: {}", fields.join(", "))
            }
            Error::RecordPersist(_) => "Failed to save record".to_string(),
            Error::Database(_) | Error::Io(_) | Error::Internal(_) | Error::Config(_) => {
                "Internal server error".to_string()
            }
            Error::DownloadSourceExhausted { kind, .. } => {
                format!("{} file not found in any storage location", kind.to_uppercase())
            }
            other => other.to_string(),
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(err.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, kind = self.kind(), "request failed");
        }

        let mut error = json!({ "type": self.kind() });
        match &self {
            Error::Validation { fields } => {
                error["fields"] = json!(fields);
            }
            Error::DownloadSourceExhausted { attempted, .. } => {
                error["attempted"] = json!(attempted);
            }
            _ => {}
        }
        if EXPOSE_DETAIL.load(Ordering::Relaxed) {
            error["detail"] = json!(self.to_string());
        }

        let body = Json(json!({
            "message": self.public_message(),
            "error": error,
        }));

        (status, body).into_response()
    }
}
