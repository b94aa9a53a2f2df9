//! Record management routes shared by journals and submissions

use axum::{
    extract::{Path, State},
    routing::{get, patch},
    Json, Router,
};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{
    DeleteResponse, DocumentRecord, RecordKind, RecordListResponse, RecordStatus,
    StatusUpdateRequest,
};

/// List/get/status/delete routes for one collection
pub fn collection_routes(kind: RecordKind) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(move |State(state): State<AppState>| list_records(state, kind)),
        )
        .route(
            "/:id",
            get(move |State(state): State<AppState>, Path(id): Path<String>| {
                get_record(state, kind, id)
            })
            .delete(move |State(state): State<AppState>, Path(id): Path<String>| {
                delete_record(state, kind, id)
            }),
        )
        .route(
            "/:id/status",
            patch(
                move |State(state): State<AppState>,
                      Path(id): Path<String>,
                      Json(body): Json<StatusUpdateRequest>| {
                    update_status(state, kind, id, body)
                },
            ),
        )
}

/// Parse a record id; malformed ids are simply not found
pub fn parse_id(kind: &str, id: &str) -> Result<Uuid> {
    Uuid::parse_str(id).map_err(|_| Error::NotFound(format!("{} {}", kind, id)))
}

async fn list_records(state: AppState, kind: RecordKind) -> Result<Json<RecordListResponse>> {
    let records = state.db().list(kind)?;
    let total = records.len();
    Ok(Json(RecordListResponse { records, total }))
}

async fn get_record(state: AppState, kind: RecordKind, id: String) -> Result<Json<DocumentRecord>> {
    let uuid = parse_id(kind.label(), &id)?;
    state
        .db()
        .get(kind, &uuid)?
        .map(Json)
        .ok_or_else(|| Error::NotFound(format!("{} {}", kind, id)))
}

async fn update_status(
    state: AppState,
    kind: RecordKind,
    id: String,
    body: StatusUpdateRequest,
) -> Result<Json<DocumentRecord>> {
    let uuid = parse_id(kind.label(), &id)?;

    let status = RecordStatus::parse(&body.status)
        .filter(|s| kind.allows(*s))
        .ok_or_else(|| Error::Validation {
            fields: vec!["status".to_string()],
        })?;

    let record = state
        .db()
        .update_status(kind, &uuid, status)?
        .ok_or_else(|| Error::NotFound(format!("{} {}", kind, id)))?;

    tracing::info!(id = %record.id, collection = %kind, status = %status, "Status updated");
    Ok(Json(record))
}

async fn delete_record(state: AppState, kind: RecordKind, id: String) -> Result<Json<DeleteResponse>> {
    let uuid = parse_id(kind.label(), &id)?;
    let failures = state.pipeline().delete_record(kind, &uuid).await?;

    Ok(Json(DeleteResponse {
        id: uuid,
        message: format!("{} deleted", capitalize(kind.label())),
        remote_delete_failures: failures,
    }))
}

/// Upper-case the first letter
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
