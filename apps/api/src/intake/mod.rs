//! Resume intake: PDF upload → text extraction → LLM analysis → store merge.

pub mod analysis;
pub mod extract;
pub mod handlers;
pub mod prompts;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// User-facing status of the most recent upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IntakeStatus {
    Idle,
    Uploading {
        file_name: Option<String>,
        started_at: DateTime<Utc>,
    },
    Success {
        file_name: Option<String>,
        fields: usize,
        finished_at: DateTime<Utc>,
    },
    Error {
        message: String,
        finished_at: DateTime<Utc>,
    },
}
