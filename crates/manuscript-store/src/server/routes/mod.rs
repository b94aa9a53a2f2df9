//! API routes for the manuscript server

pub mod downloads;
pub mod journals;
pub mod records;
pub mod submissions;

use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::RecordKind;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Journals: multipart upload with a larger body limit, plus management
        .nest(
            "/journals",
            records::collection_routes(RecordKind::Journal).route(
                "/",
                post(journals::create_journal).layer(DefaultBodyLimit::max(max_upload_size)),
            ),
        )
        // Submissions
        .nest(
            "/submissions",
            records::collection_routes(RecordKind::Submission).route(
                "/",
                post(submissions::create_submission)
                    .layer(DefaultBodyLimit::max(max_upload_size)),
            ),
        )
        .nest("/download", download_routes())
        .route("/info", get(info))
}

/// File download routes, mounted at `/download` and `/api/download`
pub fn download_routes() -> Router<AppState> {
    Router::new().route("/:kind/:id", get(downloads::download_file))
}

/// API info endpoint
async fn info(State(state): State<AppState>) -> Result<Json<Value>> {
    let db = state.db();
    Ok(Json(json!({
        "name": "manuscript-store",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Journal and manuscript ingestion with remote storage and local fallback",
        "storage": {
            "primary": state.primary().name(),
            "mirror": state.mirror().map(|m| m.name()),
        },
        "records": {
            "journals": db.count(RecordKind::Journal)?,
            "submissions": db.count(RecordKind::Submission)?,
        },
        "endpoints": {
            "POST /api/journals": "Upload a journal article (pdfFile + docxFile)",
            "POST /api/submissions": "Upload a manuscript submission (file, DOCX)",
            "GET /api/{journals,submissions}": "List records",
            "GET /api/{journals,submissions}/:id": "Get a record",
            "PATCH /api/{journals,submissions}/:id/status": "Update record status",
            "DELETE /api/{journals,submissions}/:id": "Delete a record and its files",
            "GET /download/{pdf,docx}/:id": "Download a record file"
        }
    })))
}
