use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::chat::transcript::ChatTranscript;
use crate::config::Config;
use crate::form::session::EditSession;
use crate::intake::IntakeStatus;
use crate::llm_client::LanguageModel;
use crate::record::store::RecordStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// The single current resume record.
    pub store: RecordStore,
    /// Open form edit sessions keyed by session id.
    pub sessions: Arc<DashMap<Uuid, EditSession>>,
    pub intake_status: Arc<RwLock<IntakeStatus>>,
    pub transcript: ChatTranscript,
    /// Pluggable model. `LlmClient` in production, a scripted fake in tests.
    pub llm: Arc<dyn LanguageModel>,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config, llm: Arc<dyn LanguageModel>) -> Self {
        AppState {
            store: RecordStore::new(),
            sessions: Arc::new(DashMap::new()),
            intake_status: Arc::new(RwLock::new(IntakeStatus::Idle)),
            transcript: ChatTranscript::new(),
            llm,
            config,
        }
    }
}
