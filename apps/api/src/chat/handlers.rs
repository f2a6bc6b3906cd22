use std::convert::Infallible;

use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::{self, unfold, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::chat::build_chat_prompt;
use crate::chat::prompts::{CHAT_SYSTEM, FALLBACK_REPLY};
use crate::chat::transcript::{ChatMessage, ChatTranscript};
use crate::errors::AppError;
use crate::llm_client::TextStream;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub reply: ChatMessage,
    /// True when the model call failed and `reply` is the fallback message.
    pub failed: bool,
}

type EventStream = BoxStream<'static, Result<Event, Infallible>>;

/// GET /api/v1/chat
pub async fn handle_transcript(State(state): State<AppState>) -> Json<Vec<ChatMessage>> {
    Json(state.transcript.messages())
}

/// DELETE /api/v1/chat
pub async fn handle_clear(State(state): State<AppState>) -> StatusCode {
    state.transcript.clear();
    StatusCode::NO_CONTENT
}

/// POST /api/v1/chat
pub async fn handle_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatReply>, AppError> {
    let message = accept_message(&state, &req)?;
    let prompt = build_chat_prompt(&state.store.get(), &message);

    let (reply, failed) = match state.llm.complete(&prompt, CHAT_SYSTEM).await {
        Ok(text) => (ChatMessage::assistant(&text), false),
        Err(e) => {
            warn!("Chat call failed: {e}");
            (ChatMessage::assistant(FALLBACK_REPLY), true)
        }
    };

    Ok(Json(ChatReply {
        reply: state.transcript.push(reply),
        failed,
    }))
}

/// POST /api/v1/chat/stream
///
/// Server-sent events: one `delta` event per fragment in arrival order, then a
/// `done` event carrying the assembled transcript entry.
pub async fn handle_chat_stream(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Sse<EventStream>, AppError> {
    let message = accept_message(&state, &req)?;
    let prompt = build_chat_prompt(&state.store.get(), &message);
    let transcript = state.transcript.clone();

    let events: EventStream = match state.llm.complete_stream(&prompt, CHAT_SYSTEM).await {
        Ok(fragments) => relay(fragments, transcript).boxed(),
        Err(e) => {
            warn!("Chat stream failed to start: {e}");
            let reply = transcript.push(ChatMessage::assistant(FALLBACK_REPLY));
            stream::once(async move { Ok(done_event(&reply, true)) }).boxed()
        }
    };

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

fn accept_message(state: &AppState, req: &ChatRequest) -> Result<String, AppError> {
    let message = req.message.trim();
    if message.is_empty() {
        return Err(AppError::Validation("Message must not be empty".to_string()));
    }
    state.transcript.push(ChatMessage::user(message));
    info!(
        chars = message.len(),
        transcript_len = state.transcript.len(),
        "Chat message received"
    );
    Ok(message.to_string())
}

/// Forwards fragments as they arrive and appends the concatenation to the
/// transcript once the stream ends. A mid-stream error replaces the partial
/// reply with the fallback message.
fn relay(fragments: TextStream, transcript: ChatTranscript) -> EventStream {
    unfold(
        Some((fragments, String::new(), transcript)),
        |state| async move {
            let (mut fragments, mut assembled, transcript) = state?;
            match fragments.next().await {
                Some(Ok(text)) => {
                    assembled.push_str(&text);
                    let event = Event::default().event("delta").data(text.replace('\r', ""));
                    Some((Ok(event), Some((fragments, assembled, transcript))))
                }
                Some(Err(e)) => {
                    warn!("Chat stream failed mid-reply: {e}");
                    let reply = transcript.push(ChatMessage::assistant(FALLBACK_REPLY));
                    Some((Ok(done_event(&reply, true)), None))
                }
                None => {
                    let reply = transcript.push(ChatMessage::assistant(&assembled));
                    Some((Ok(done_event(&reply, false)), None))
                }
            }
        },
    )
    .boxed()
}

fn done_event(reply: &ChatMessage, failed: bool) -> Event {
    let payload = json!({ "reply": reply, "failed": failed });
    Event::default()
        .event("done")
        .data(payload.to_string())
}
