//! Server-sent events decoding for streamed responses
//!
//! Events are separated by blank lines; each event's `data:` lines are joined
//! with `\n` and parsed as JSON. Only `response.output_text.delta` events
//! yield text.

use std::io::BufRead;

use serde::Deserialize;
use tracing::trace;

use crate::infrastructure::{InfraError, InfraResult};

const DONE_SENTINEL: &str = "[DONE]";

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    delta: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    response: Option<RawFailedResponse>,
}

#[derive(Debug, Deserialize)]
struct RawFailedResponse {
    #[serde(default)]
    error: Option<RawErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RawErrorBody {
    #[serde(default)]
    message: String,
}

/// Decoded meaning of one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Delta(String),
    Failed(String),
    Completed,
    Other,
}

/// Classify the JSON payload of one event.
pub fn classify_event(data: &str) -> InfraResult<StreamEvent> {
    if data.trim() == DONE_SENTINEL {
        return Ok(StreamEvent::Completed);
    }
    let event: RawEvent = serde_json::from_str(data)
        .map_err(|e| InfraError::invalid_response(format!("stream event: {}", e)))?;

    Ok(match event.kind.as_str() {
        "response.output_text.delta" => match event.delta {
            Some(delta) if !delta.is_empty() => StreamEvent::Delta(delta),
            _ => StreamEvent::Other,
        },
        "response.completed" => StreamEvent::Completed,
        "error" => StreamEvent::Failed(
            event
                .message
                .unwrap_or_else(|| "stream reported an error".to_string()),
        ),
        "response.failed" | "response.incomplete" => StreamEvent::Failed(
            event
                .response
                .and_then(|r| r.error)
                .map(|e| e.message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| format!("{} without details", event.kind)),
        ),
        _ => StreamEvent::Other,
    })
}

/// Iterator of text deltas over an SSE body.
pub struct SseDeltas<R> {
    reader: R,
    finished: bool,
}

impl<R: BufRead> SseDeltas<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            finished: false,
        }
    }

    /// Read the next event's joined `data:` payload; `None` at end of body.
    fn next_data(&mut self) -> InfraResult<Option<String>> {
        let mut data: Option<String> = None;
        let mut line = String::new();
        loop {
            line.clear();
            let read = self
                .reader
                .read_line(&mut line)
                .map_err(|e| InfraError::io("read response stream", e))?;
            if read == 0 {
                return Ok(data);
            }

            let line = line.trim_end_matches(['\r', '\n']);
            if line.is_empty() {
                if data.is_some() {
                    return Ok(data);
                }
                continue;
            }
            if let Some(payload) = line.strip_prefix("data:") {
                let payload = payload.strip_prefix(' ').unwrap_or(payload);
                match data.as_mut() {
                    Some(buf) => {
                        buf.push('\n');
                        buf.push_str(payload);
                    }
                    None => data = Some(payload.to_string()),
                }
            }
            // `event:`, `id:`, `retry:` and `:` comments carry nothing we need
        }
    }
}

impl<R: BufRead> Iterator for SseDeltas<R> {
    type Item = InfraResult<String>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            let data = match self.next_data() {
                Ok(Some(data)) => data,
                Ok(None) => {
                    self.finished = true;
                    return None;
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            };
            trace!("sse data: {}", data);

            match classify_event(&data) {
                Ok(StreamEvent::Delta(delta)) => return Some(Ok(delta)),
                Ok(StreamEvent::Other) => continue,
                Ok(StreamEvent::Completed) => self.finished = true,
                Ok(StreamEvent::Failed(message)) => {
                    self.finished = true;
                    return Some(Err(InfraError::Service {
                        status: 200,
                        message,
                    }));
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}
