use serde::Serialize;
use serde_json::{Value, json};
use tracing::debug;

use super::prompts::system_turn;

const DATA_FIELD: &str = "data:";
const DONE_MARKER: &str = "[DONE]";

/// Outbound body for the provider's chat-completions endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Value>,
    pub stream: bool,
}

impl ChatCompletionRequest {
    /// Prepends the system turn. Input turns are forwarded as-is, without
    /// checking their shape.
    pub fn with_system_prompt(
        model: impl Into<String>,
        input_turns: Vec<Value>,
        stream: bool,
    ) -> Self {
        let mut messages = Vec::with_capacity(input_turns.len() + 1);
        messages.push(json!(system_turn()));
        messages.extend(input_turns);

        Self {
            model: model.into(),
            messages,
            stream,
        }
    }
}

/// `choices[0].message.content` of a batch response.
pub fn extract_message_content(response: &Value) -> Option<String> {
    first_choice_text(response, "message")
}

/// `choices[0].delta.content` of one streamed chunk.
pub fn extract_delta_content(chunk: &Value) -> Option<String> {
    first_choice_text(chunk, "delta")
}

fn first_choice_text(value: &Value, field: &str) -> Option<String> {
    value
        .get("choices")?
        .get(0)?
        .get(field)?
        .get("content")?
        .as_str()
        .map(ToString::to_string)
}

/// Incremental decoder for a server-sent-event completion body.
///
/// Bytes are buffered until a full line is available, so lines and multi-byte
/// characters split across network reads come out whole. Each `data:` line
/// yields the chunk's delta text; `data: [DONE]` ends the stream.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    done: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        if self.done {
            return Vec::new();
        }
        self.buffer.extend_from_slice(chunk);

        let mut deltas = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let line = self.buffer.drain(..=newline).collect::<Vec<_>>();
            if let Some(delta) = self.decode_line(&line[..newline]) {
                deltas.push(delta);
            }
        }
        deltas
    }

    /// Flushes a trailing line that never received its newline.
    pub fn finish(&mut self) -> Vec<String> {
        let line = std::mem::take(&mut self.buffer);
        self.decode_line(&line).into_iter().collect()
    }

    fn decode_line(&mut self, raw: &[u8]) -> Option<String> {
        if self.done {
            return None;
        }

        let line = String::from_utf8_lossy(raw);
        let line = line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with(':') {
            return None;
        }

        let data = line.strip_prefix(DATA_FIELD)?.trim_start();
        if data == DONE_MARKER {
            self.done = true;
            return None;
        }

        match serde_json::from_str::<Value>(data) {
            Ok(chunk) => extract_delta_content(&chunk).filter(|text| !text.is_empty()),
            Err(err) => {
                debug!(error = %err, "skipping undecodable stream event");
                None
            }
        }
    }
}
