//! In-memory chat transcript.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use pulldown_cmark::{html, Options, Parser};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    /// Markdown source for assistant messages, plain text for user messages.
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(content: &str) -> Self {
        Self {
            role: Role::User,
            content: content.to_string(),
            html: None,
            created_at: Utc::now(),
        }
    }

    pub fn assistant(content: &str) -> Self {
        Self {
            role: Role::Assistant,
            content: content.to_string(),
            html: Some(render_markdown(content)),
            created_at: Utc::now(),
        }
    }
}

pub fn render_markdown(source: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    let parser = Parser::new_ext(source, options);
    let mut out = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Append-only list of messages shared across handlers.
#[derive(Debug, Clone, Default)]
pub struct ChatTranscript {
    messages: Arc<Mutex<Vec<ChatMessage>>>,
}

impl ChatTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message and returns a copy of it.
    pub fn push(&self, message: ChatMessage) -> ChatMessage {
        self.messages.lock().push(message.clone());
        message
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.messages.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    pub fn clear(&self) {
        self.messages.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assistant_messages_render_markdown() {
        let message = ChatMessage::assistant("**Tip:** add metrics");
        assert_eq!(
            message.html.as_deref(),
            Some("<p><strong>Tip:</strong> add metrics</p>\n")
        );
        assert!(ChatMessage::user("**raw**").html.is_none());
    }

    #[test]
    fn test_transcript_keeps_order_and_clears() {
        let transcript = ChatTranscript::new();
        transcript.push(ChatMessage::user("first"));
        transcript.push(ChatMessage::assistant("second"));
        let contents: Vec<String> = transcript.messages().into_iter().map(|m| m.content).collect();
        assert_eq!(contents, ["first", "second"]);

        transcript.clear();
        assert_eq!(transcript.len(), 0);
    }
}
