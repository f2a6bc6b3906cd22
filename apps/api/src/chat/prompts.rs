// Career-advice chat prompt templates.

pub const CHAT_SYSTEM: &str = "\
You are an experienced career advisor. \
Answer the user's question using the resume provided as context. \
Be specific, cite details from the resume where relevant and keep answers concise. \
Format your answer in Markdown.";

pub const CHAT_PROMPT: &str = r#"RESUME (JSON):
{resume}

QUESTION:
{message}"#;

/// Shown in the transcript when the model call fails.
pub const FALLBACK_REPLY: &str = "Sorry, I couldn't process your request. Please try again.";
