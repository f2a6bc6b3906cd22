//! Scripted `LanguageModel` for tests.

use async_trait::async_trait;
use futures::stream::{self as futures_stream, StreamExt};
use parking_lot::Mutex;

use super::{LanguageModel, LlmError, TextStream};

pub struct FakeModel {
    reply: Option<String>,
    fragments: Vec<String>,
    /// Ends the stream with an error after the fragments.
    breaks_mid_stream: bool,
    prompts: Mutex<Vec<String>>,
}

impl FakeModel {
    /// Answers every prompt with `reply`; streams it as a single fragment.
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            fragments: vec![reply.to_string()],
            breaks_mid_stream: false,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Streams `fragments` in order; `complete` returns their concatenation.
    pub fn streaming(fragments: &[&str]) -> Self {
        Self {
            reply: Some(fragments.concat()),
            fragments: fragments.iter().map(|f| f.to_string()).collect(),
            breaks_mid_stream: false,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Streams `fragments`, then fails with a transport-style error.
    pub fn breaking(fragments: &[&str]) -> Self {
        Self {
            breaks_mid_stream: true,
            ..Self::streaming(fragments)
        }
    }

    /// Fails every call with an API error.
    pub fn failing() -> Self {
        Self {
            reply: None,
            fragments: Vec::new(),
            breaks_mid_stream: false,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    fn outcome(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().push(prompt.to_string());
        self.reply.clone().ok_or(LlmError::Api {
            status: 503,
            message: "scripted failure".to_string(),
        })
    }
}

#[async_trait]
impl LanguageModel for FakeModel {
    async fn complete(&self, prompt: &str, _system: &str) -> Result<String, LlmError> {
        self.outcome(prompt)
    }

    async fn complete_stream(&self, prompt: &str, _system: &str) -> Result<TextStream, LlmError> {
        self.outcome(prompt)?;
        let mut fragments: Vec<Result<String, LlmError>> =
            self.fragments.iter().cloned().map(Ok).collect();
        if self.breaks_mid_stream {
            fragments.push(Err(LlmError::Api {
                status: 500,
                message: "stream interrupted".to_string(),
            }));
        }
        Ok(futures_stream::iter(fragments).boxed())
    }

    fn model_name(&self) -> &str {
        "fake"
    }
}
