use axum::{
    extract::{Multipart, State},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::intake::analysis::{analyze_resume, ResumeAnalysis};
use crate::intake::extract::{extract_text, validate_upload, Upload};
use crate::intake::IntakeStatus;
use crate::record::sanitize::sanitize_record;
use crate::record::Record;
use crate::state::AppState;

const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub record: Record,
    pub version: u64,
    pub analysis: Option<ResumeAnalysis>,
    pub extracted_chars: usize,
}

/// POST /api/v1/resume/upload
///
/// Multipart form with a `file` part. On any failure the record is left
/// untouched and the intake status flag carries the user-facing message.
pub async fn handle_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let upload = read_upload(multipart).await?;
    let file_name = upload.file_name.clone();
    *state.intake_status.write() = IntakeStatus::Uploading {
        file_name: file_name.clone(),
        started_at: Utc::now(),
    };

    match run_intake(&state, upload).await {
        Ok(response) => {
            *state.intake_status.write() = IntakeStatus::Success {
                file_name,
                fields: response.record.len(),
                finished_at: Utc::now(),
            };
            Ok(Json(response))
        }
        Err(err) => {
            warn!("Resume intake failed: {err}");
            *state.intake_status.write() = IntakeStatus::Error {
                message: err.user_message(),
                finished_at: Utc::now(),
            };
            Err(err)
        }
    }
}

/// GET /api/v1/resume/status
pub async fn handle_status(State(state): State<AppState>) -> Json<IntakeStatus> {
    Json(state.intake_status.read().clone())
}

async fn run_intake(state: &AppState, upload: Upload) -> Result<UploadResponse, AppError> {
    validate_upload(&upload, state.config.max_upload_bytes)?;
    let text = extract_text(upload.bytes).await?;
    let outcome = analyze_resume(state.llm.as_ref(), &text).await?;

    let version = state.store.merge(sanitize_record(&outcome.record));
    info!(
        file_name = ?upload.file_name,
        version,
        "Resume record merged from upload"
    );

    Ok(UploadResponse {
        record: state.store.get(),
        version,
        analysis: outcome.analysis,
        extracted_chars: text.chars().count(),
    })
}

/// Takes the `file` part, or the first part carrying a file name.
async fn read_upload(mut multipart: Multipart) -> Result<Upload, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some(FILE_FIELD) && field.file_name().is_none() {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Could not read upload: {e}")))?;
        return Ok(Upload {
            file_name,
            content_type,
            bytes,
        });
    }
    Err(AppError::Validation(format!(
        "Missing '{FILE_FIELD}' part in upload"
    )))
}
