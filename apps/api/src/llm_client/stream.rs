//! Server-sent-events decoding for streamed Messages API replies.

use serde::Deserialize;

use super::LlmError;

/// One complete SSE event.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SseEvent {
    pub event: Option<String>,
    pub data: String,
}

/// Incremental SSE decoder. Bytes are buffered until a blank line closes an
/// event, so chunks may split events (and UTF-8 sequences) anywhere.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk and returns every event it completed, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some((end, sep_len)) = find_event_end(&self.buffer) {
            let raw: Vec<u8> = self.buffer.drain(..end + sep_len).collect();
            if let Some(event) = parse_event(&String::from_utf8_lossy(&raw[..end])) {
                events.push(event);
            }
        }
        events
    }
}

fn find_event_end(buffer: &[u8]) -> Option<(usize, usize)> {
    let lf = buffer.windows(2).position(|w| w == b"\n\n").map(|i| (i, 2));
    let crlf = buffer.windows(4).position(|w| w == b"\r\n\r\n").map(|i| (i, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

fn parse_event(block: &str) -> Option<SseEvent> {
    let mut event = SseEvent::default();
    let mut data_lines = Vec::new();
    for line in block.lines() {
        let line = line.trim_end_matches('\r');
        if let Some(name) = line.strip_prefix("event:") {
            event.event = Some(name.trim().to_string());
        } else if let Some(data) = line.strip_prefix("data:") {
            data_lines.push(data.strip_prefix(' ').unwrap_or(data));
        }
    }
    if event.event.is_none() && data_lines.is_empty() {
        return None;
    }
    event.data = data_lines.join("\n");
    Some(event)
}

/// What a decoded event means for the text being streamed.
#[derive(Debug, PartialEq)]
pub enum StreamSignal {
    Text(String),
    Stop,
    Ignore,
}

#[derive(Debug, Deserialize)]
struct StreamPayload {
    #[serde(rename = "type")]
    kind: String,
    delta: Option<Delta>,
    error: Option<StreamErrorBody>,
}

#[derive(Debug, Deserialize)]
struct Delta {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamErrorBody {
    message: String,
}

pub fn decode_event(event: &SseEvent) -> Result<StreamSignal, LlmError> {
    if event.data.is_empty() {
        return Ok(StreamSignal::Ignore);
    }
    let payload: StreamPayload = serde_json::from_str(&event.data)?;
    match payload.kind.as_str() {
        "content_block_delta" => Ok(payload
            .delta
            .and_then(|d| d.text)
            .map(StreamSignal::Text)
            .unwrap_or(StreamSignal::Ignore)),
        "message_stop" => Ok(StreamSignal::Stop),
        "error" => Err(LlmError::Api {
            status: 500,
            message: payload
                .error
                .map(|e| e.message)
                .unwrap_or_else(|| "stream error".to_string()),
        }),
        _ => Ok(StreamSignal::Ignore),
    }
}
