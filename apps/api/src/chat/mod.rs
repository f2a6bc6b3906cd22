//! Career-advice chat grounded in the current resume record.

pub mod handlers;
pub mod prompts;
pub mod transcript;

use crate::chat::prompts::CHAT_PROMPT;
use crate::form::render::pretty_json;
use crate::llm_client::prompts::fill;
use crate::record::Record;

/// Builds the chat prompt from the record (whatever shape it is in) and the
/// user's message.
pub fn build_chat_prompt(record: &Record, message: &str) -> String {
    let resume = pretty_json(&serde_json::Value::Object(record.clone()));
    fill(CHAT_PROMPT, &[("resume", &resume), ("message", message)])
}
