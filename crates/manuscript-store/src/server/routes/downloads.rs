//! File download endpoint

use axum::{
    extract::{Path, State},
    response::Response,
};

use super::records::parse_id;
use crate::error::{Error, Result};
use crate::retrieval::download_response;
use crate::server::state::AppState;
use crate::types::FileKind;

/// GET /download/:kind/:id - Stream a record's PDF or DOCX
///
/// Journals are looked up first, then submissions.
pub async fn download_file(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Response> {
    let kind = FileKind::from_segment(&kind)
        .ok_or_else(|| Error::NotFound(format!("download kind '{}'", kind)))?;
    let uuid = parse_id("record", &id)?;

    let record = state
        .db()
        .find_any(&uuid)?
        .ok_or_else(|| Error::NotFound(format!("record {}", id)))?;

    let download = state.resolver().resolve(&record, kind).await?;
    tracing::debug!(record = %record.id, source = ?download.source, "Download resolved");

    Ok(download_response(&record, kind, download))
}
