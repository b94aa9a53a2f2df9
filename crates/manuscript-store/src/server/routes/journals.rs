//! Journal upload endpoint

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};

use crate::error::Result;
use crate::intake::{self, UploadForm};
use crate::server::state::AppState;
use crate::types::{RecordSummary, UploadBody, UploadFlags, UploadResponse};

/// POST /api/journals - Upload a journal article (PDF + DOCX)
pub async fn create_journal(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>)> {
    let form = UploadForm::read(&mut multipart, state.storage_root()).await?;
    let upload = intake::validate_journal(form).await?;
    let (record, flags) = state.pipeline().ingest(upload).await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: upload_message("Journal", &flags),
            body: UploadBody::Journal(RecordSummary::new(&record, &flags)),
        }),
    ))
}

/// Success message, noting the local fallback when a remote upload failed
pub fn upload_message(label: &str, flags: &UploadFlags) -> String {
    if flags.any_failed() {
        format!(
            "{} uploaded; remote storage failed, files are kept on the server",
            label
        )
    } else {
        format!("{} uploaded successfully", label)
    }
}
