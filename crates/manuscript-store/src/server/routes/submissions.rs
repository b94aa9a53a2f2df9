//! Submission upload endpoint

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};

use super::journals::upload_message;
use crate::error::Result;
use crate::intake::{self, UploadForm};
use crate::server::state::AppState;
use crate::types::{RecordSummary, UploadBody, UploadResponse};

/// POST /api/submissions - Upload a manuscript (DOCX; the PDF is derived)
pub async fn create_submission(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>)> {
    let form = UploadForm::read(&mut multipart, state.storage_root()).await?;
    let upload = intake::validate_submission(form, state.storage_root()).await?;
    let (record, flags) = state.pipeline().ingest(upload).await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: upload_message("Submission", &flags),
            body: UploadBody::Submission(RecordSummary::new(&record, &flags)),
        }),
    ))
}
