//! Axum route handlers for edit sessions and the store-backed work-history
//! editor.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::form::session::{ControlInput, EditOutcome, EditSession, SessionView, WorkHistoryOp};
use crate::form::work_history::{WorkExperience, WorkField, WorkHistoryEditor, WorkHistoryError};
use crate::record::Record;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct LoadSessionRequest {
    /// Raw record to edit; the store's current record when absent.
    pub record: Option<Record>,
}

#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub path: String,
    pub value: ControlInput,
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub path: String,
    pub expanded: bool,
}

#[derive(Debug, Serialize)]
pub struct WorkHistoryResponse {
    pub entries: Vec<WorkExperience>,
    pub version: u64,
}

#[derive(Debug, Serialize)]
pub struct SessionWorkHistoryResponse {
    pub entries: Vec<WorkExperience>,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub record: Record,
    pub version: u64,
}

#[derive(Debug, Deserialize)]
pub struct WorkFieldUpdate {
    pub field: WorkField,
    pub value: Value,
}

// ────────────────────────────────────────────────────────────────────────────
// Edit sessions
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/form/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
    body: Option<Json<LoadSessionRequest>>,
) -> (StatusCode, Json<SessionView>) {
    let request = body.map(|Json(req)| req).unwrap_or_default();
    let (current, version) = state.store.snapshot();
    let raw = request.record.unwrap_or(current);

    let cutoff = Utc::now() - Duration::minutes(state.config.session_ttl_minutes);
    let evicted = evict_stale_sessions(&state.sessions, cutoff);
    if evicted > 0 {
        info!(evicted, "Evicted stale edit sessions");
    }

    let session = EditSession::load(&raw, version);
    let view = session.view();
    state.sessions.insert(session.id(), session);
    (StatusCode::CREATED, Json(view))
}

/// Drops every session created before `cutoff`. Returns how many went.
fn evict_stale_sessions(sessions: &DashMap<Uuid, EditSession>, cutoff: DateTime<Utc>) -> usize {
    let before = sessions.len();
    sessions.retain(|_, session| session.created_at() >= cutoff);
    before.saturating_sub(sessions.len())
}

/// GET /api/v1/form/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = state.sessions.get(&id).ok_or_else(|| session_not_found(id))?;
    Ok(Json(session.view()))
}

/// POST /api/v1/form/sessions/:id/edit
pub async fn handle_edit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<EditRequest>,
) -> Result<Json<EditOutcome>, AppError> {
    let mut session = state.sessions.get_mut(&id).ok_or_else(|| session_not_found(id))?;
    let outcome = session.apply_input(&req.path, req.value)?;
    Ok(Json(outcome))
}

/// POST /api/v1/form/sessions/:id/toggle
pub async fn handle_toggle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ToggleRequest>,
) -> Result<Json<ToggleResponse>, AppError> {
    let mut session = state.sessions.get_mut(&id).ok_or_else(|| session_not_found(id))?;
    let expanded = session.toggle_section(&req.path)?;
    Ok(Json(ToggleResponse {
        path: req.path,
        expanded,
    }))
}

/// POST /api/v1/form/sessions/:id/work-history
pub async fn handle_session_work_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(op): Json<WorkHistoryOp>,
) -> Result<Json<SessionWorkHistoryResponse>, AppError> {
    let mut session = state.sessions.get_mut(&id).ok_or_else(|| session_not_found(id))?;
    let entries = session.apply_work_history(op)?;
    Ok(Json(SessionWorkHistoryResponse { entries }))
}

/// POST /api/v1/form/sessions/:id/submit
///
/// Reconstitutes the shadow copy and merges it into the store, but only if the
/// store has not moved on since the session was loaded.
pub async fn handle_submit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SubmitResponse>, AppError> {
    let mut session = state.sessions.get_mut(&id).ok_or_else(|| session_not_found(id))?;
    let record = session.collect()?;
    let version = state.store.compare_and_merge(session.base_version(), record)?;
    session.finish();
    drop(session);
    state.sessions.remove(&id);
    info!(session_id = %id, version, "Form submitted into record store");

    Ok(Json(SubmitResponse {
        record: state.store.get(),
        version,
    }))
}

fn session_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Edit session {id} not found"))
}

// ────────────────────────────────────────────────────────────────────────────
// Store-backed work history
// ────────────────────────────────────────────────────────────────────────────

/// Runs `op` against the store's work history under the store's write lock.
/// The sequence is republished whenever the editor changed it, including the
/// blank entry added on first use.
fn with_work_history<T>(
    state: &AppState,
    op: impl FnOnce(&mut WorkHistoryEditor) -> Result<(T, bool), WorkHistoryError>,
) -> Result<(T, Vec<WorkExperience>, u64), WorkHistoryError> {
    let (result, version) = state.store.update(|record| {
        let mut editor = WorkHistoryEditor::from_record(record);
        let initialized = editor.ensure_entry();
        match op(&mut editor) {
            Ok((out, changed)) => {
                let partial = (initialized || changed).then(|| editor.publish());
                (Ok((out, editor.entries())), partial)
            }
            Err(e) => (Err(e), initialized.then(|| editor.publish())),
        }
    });
    let (out, entries) = result?;
    Ok((out, entries, version))
}

/// GET /api/v1/work-history
pub async fn handle_list_work_history(
    State(state): State<AppState>,
) -> Result<Json<WorkHistoryResponse>, AppError> {
    let ((), entries, version) = with_work_history(&state, |_| Ok(((), false)))?;
    Ok(Json(WorkHistoryResponse { entries, version }))
}

/// POST /api/v1/work-history
pub async fn handle_add_work_experience(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<WorkHistoryResponse>), AppError> {
    let (id, entries, version) = with_work_history(&state, |editor| Ok((editor.add(), true)))?;
    info!(id = %id, "Work-history entry added");
    Ok((StatusCode::CREATED, Json(WorkHistoryResponse { entries, version })))
}

/// PATCH /api/v1/work-history/:id
pub async fn handle_update_work_experience(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<WorkFieldUpdate>,
) -> Result<Json<WorkHistoryResponse>, AppError> {
    let ((), entries, version) = with_work_history(&state, |editor| {
        editor.update(&id, req.field, &req.value)?;
        Ok(((), true))
    })?;
    Ok(Json(WorkHistoryResponse { entries, version }))
}

/// DELETE /api/v1/work-history/:id
///
/// Removing the last remaining entry is refused and leaves the list as is.
pub async fn handle_remove_work_experience(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<WorkHistoryResponse>, AppError> {
    let (removed, entries, version) =
        with_work_history(&state, |editor| {
            let removed = editor.remove(&id);
            Ok((removed, removed))
        })?;
    if !removed && !entries.iter().any(|entry| entry.id == id) {
        return Err(WorkHistoryError::NotFound(id).into());
    }
    Ok(Json(WorkHistoryResponse { entries, version }))
}
