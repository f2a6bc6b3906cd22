pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};

use crate::chat::handlers as chat;
use crate::form::handlers as form;
use crate::intake::handlers as intake;
use crate::record::handlers as record;
use crate::state::AppState;

/// Room for multipart framing on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD;

    Router::new()
        .route("/health", get(health::health_handler))
        // Record store
        .route(
            "/api/v1/record",
            get(record::handle_get_record)
                .patch(record::handle_merge_record)
                .delete(record::handle_reset_record),
        )
        // Resume intake
        .route("/api/v1/resume/upload", post(intake::handle_upload))
        .route("/api/v1/resume/status", get(intake::handle_status))
        // Work history, store-backed
        .route(
            "/api/v1/work-history",
            get(form::handle_list_work_history).post(form::handle_add_work_experience),
        )
        .route(
            "/api/v1/work-history/:id",
            patch(form::handle_update_work_experience)
                .delete(form::handle_remove_work_experience),
        )
        // Form edit sessions
        .route("/api/v1/form/sessions", post(form::handle_create_session))
        .route("/api/v1/form/sessions/:id", get(form::handle_get_session))
        .route("/api/v1/form/sessions/:id/edit", post(form::handle_edit))
        .route("/api/v1/form/sessions/:id/toggle", post(form::handle_toggle))
        .route(
            "/api/v1/form/sessions/:id/work-history",
            post(form::handle_session_work_history),
        )
        .route("/api/v1/form/sessions/:id/submit", post(form::handle_submit))
        // Chat
        .route(
            "/api/v1/chat",
            get(chat::handle_transcript)
                .post(chat::handle_chat)
                .delete(chat::handle_clear),
        )
        .route("/api/v1/chat/stream", post(chat::handle_chat_stream))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
