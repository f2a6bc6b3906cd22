use axum::{extract::State, Json};
use serde::Serialize;
use tracing::info;

use crate::intake::IntakeStatus;
use crate::record::Record;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct RecordResponse {
    pub record: Record,
    pub version: u64,
}

/// GET /api/v1/record
pub async fn handle_get_record(State(state): State<AppState>) -> Json<RecordResponse> {
    let (record, version) = state.store.snapshot();
    Json(RecordResponse { record, version })
}

/// PATCH /api/v1/record
///
/// Shallow merge: top-level keys in the body replace the stored ones. An empty
/// body changes nothing and keeps the version.
pub async fn handle_merge_record(
    State(state): State<AppState>,
    Json(partial): Json<Record>,
) -> Json<RecordResponse> {
    if partial.is_empty() {
        let (record, version) = state.store.snapshot();
        return Json(RecordResponse { record, version });
    }
    let keys = partial.len();
    let version = state.store.merge(partial);
    info!(keys, version, "Record merged");

    Json(RecordResponse {
        record: state.store.get(),
        version,
    })
}

/// DELETE /api/v1/record
///
/// Back to the empty skeleton; the intake status is cleared with it.
pub async fn handle_reset_record(State(state): State<AppState>) -> Json<RecordResponse> {
    let version = state.store.reset();
    *state.intake_status.write() = IntakeStatus::Idle;
    info!(version, "Record reset");

    Json(RecordResponse {
        record: state.store.get(),
        version,
    })
}
