//! Incremental framing and per-dialect frame decoding.
//!
//! Response bodies arrive in arbitrary byte chunks. [`LineBuffer`] turns them
//! into complete lines and each dialect decoder turns one line into a
//! [`FrameEvent`].

use crate::registry::WireDialect;
use gateway_core::{Fragment, GatewayError, GatewayResult};
use serde::Deserialize;

/// Prefix of an SSE data line.
const SSE_DATA_PREFIX: &str = "data:";

/// Terminal sentinel of the OpenAI-compatible stream.
const SSE_DONE: &str = "[DONE]";

/// Splits a byte stream into lines, holding only the trailing partial line.
///
/// Splitting happens on raw bytes, so a multi-byte UTF-8 sequence cut across
/// two reads is reassembled before it is decoded.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let Some(last_newline) = self.pending.iter().rposition(|b| *b == b'\n') else {
            return Vec::new();
        };

        let mut complete: Vec<u8> = self.pending.drain(..=last_newline).collect();
        complete.pop();
        complete
            .split(|b| *b == b'\n')
            .map(|line| {
                let line = line.strip_suffix(b"\r").unwrap_or(line);
                String::from_utf8_lossy(line).into_owned()
            })
            .collect()
    }

    /// Take whatever is left once the body has ended.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.pending);
        let rest = rest.strip_suffix(b"\r").unwrap_or(&rest[..]);
        Some(String::from_utf8_lossy(rest).into_owned())
    }

    /// Bytes held for the next line.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

/// Outcome of decoding one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameEvent {
    /// Text to hand to the consumer
    Fragment(Fragment),
    /// Nothing to emit (keep-alives, metadata, empty deltas)
    Skip,
    /// The backend signalled the end of the stream
    Done,
    /// The backend reported an error; the stream ends after it
    Error(String),
    /// Text and an error in the same frame; the text is emitted first
    FragmentThenError(Fragment, String),
}

/// Decode one line in the given dialect.
///
/// `Err` means the frame was malformed. Callers log it and keep reading.
pub fn decode_line(dialect: WireDialect, line: &str) -> GatewayResult<FrameEvent> {
    match dialect {
        WireDialect::Ndjson => decode_ndjson(line),
        WireDialect::OpenAiSse => sse_payload(line).map_or(Ok(FrameEvent::Skip), decode_openai),
        WireDialect::AnthropicSse => {
            sse_payload(line).map_or(Ok(FrameEvent::Skip), decode_anthropic)
        }
        WireDialect::GeminiSse => sse_payload(line).map_or(Ok(FrameEvent::Skip), decode_gemini),
    }
}

/// Payload of an SSE `data:` line, `None` for every other line kind.
fn sse_payload(line: &str) -> Option<&str> {
    line.trim_end()
        .strip_prefix(SSE_DATA_PREFIX)
        .map(str::trim_start)
        .filter(|payload| !payload.is_empty())
}

fn text_fragment(text: &str) -> FrameEvent {
    if text.is_empty() {
        FrameEvent::Skip
    } else {
        FrameEvent::Fragment(Fragment::new(text))
    }
}

// Local NDJSON

#[derive(Debug, Deserialize)]
struct LocalChunk {
    #[serde(default)]
    message: Option<LocalMessage>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    done: bool,
}

#[derive(Debug, Deserialize)]
struct LocalMessage {
    #[serde(default)]
    content: String,
}

fn decode_ndjson(line: &str) -> GatewayResult<FrameEvent> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(FrameEvent::Skip);
    }

    let chunk: LocalChunk = serde_json::from_str(line).map_err(GatewayError::decode)?;

    let content = chunk
        .message
        .map(|message| message.content)
        .filter(|content| !content.is_empty());

    match (content, chunk.error) {
        (Some(content), Some(error)) => Ok(FrameEvent::FragmentThenError(Fragment::new(content), error)),
        (None, Some(error)) => Ok(FrameEvent::Error(error)),
        (Some(content), None) => Ok(FrameEvent::Fragment(Fragment::new(content))),
        (None, None) if chunk.done => Ok(FrameEvent::Done),
        (None, None) => Ok(FrameEvent::Skip),
    }
}

// OpenAI-compatible SSE

#[derive(Debug, Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    delta: CompletionDelta,
}

#[derive(Debug, Default, Deserialize)]
struct CompletionDelta {
    #[serde(default)]
    content: Option<String>,
}

fn decode_openai(payload: &str) -> GatewayResult<FrameEvent> {
    // Checked before JSON decoding: the sentinel is not JSON.
    if payload.trim() == SSE_DONE {
        return Ok(FrameEvent::Done);
    }

    let chunk: CompletionChunk = serde_json::from_str(payload).map_err(GatewayError::decode)?;
    let content = chunk
        .choices
        .first()
        .and_then(|choice| choice.delta.content.as_deref())
        .unwrap_or_default();

    Ok(text_fragment(content))
}

// Gemini SSE

#[derive(Debug, Deserialize)]
struct GeminiChunk {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

fn decode_gemini(payload: &str) -> GatewayResult<FrameEvent> {
    let chunk: GeminiChunk = serde_json::from_str(payload).map_err(GatewayError::decode)?;

    if let Some(error) = chunk.error {
        return Ok(FrameEvent::Error(error.message));
    }

    let text: String = chunk
        .candidates
        .first()
        .and_then(|candidate| candidate.content.as_ref())
        .map(|content| {
            content
                .parts
                .iter()
                .filter_map(|part| part.text.as_deref())
                .collect()
        })
        .unwrap_or_default();

    Ok(text_fragment(&text))
}

// Anthropic SSE

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicEvent {
    ContentBlockDelta { delta: AnthropicDelta },
    MessageStop,
    Error { error: ErrorBody },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct AnthropicDelta {
    #[serde(default)]
    text: Option<String>,
}

fn decode_anthropic(payload: &str) -> GatewayResult<FrameEvent> {
    let event: AnthropicEvent = serde_json::from_str(payload).map_err(GatewayError::decode)?;

    Ok(match event {
        AnthropicEvent::ContentBlockDelta { delta } => {
            text_fragment(delta.text.as_deref().unwrap_or_default())
        }
        AnthropicEvent::MessageStop => FrameEvent::Done,
        AnthropicEvent::Error { error } => FrameEvent::Error(error.message),
        AnthropicEvent::Other => FrameEvent::Skip,
    })
}

/// Best-effort error text from a non-2xx response body.
///
/// Understands `{"error":{"message":..}}` and `{"error":".."}`.
pub fn error_message_from_body(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;

    error
        .get("message")
        .and_then(serde_json::Value::as_str)
        .or_else(|| error.as_str())
        .filter(|message| !message.is_empty())
        .map(String::from)
}
