//! Server-sent-events decoding for streamed model replies.

use std::collections::VecDeque;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::stream::{self, BoxStream};
use futures_util::{Stream, StreamExt};

use crate::wire::GenerateContentResponse;
use crate::{ApiError, FailureKind};

/// Incremental SSE parser. Bytes may be split anywhere, including inside a
/// UTF-8 sequence; only complete lines are interpreted.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds raw bytes and returns the data payload of every event completed by them.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);
        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line[..line.len() - 1]);
            let line = line.strip_suffix('\r').unwrap_or(&line);
            if let Some(event) = self.process_line(line) {
                events.push(event);
            }
        }
        events
    }

    /// Flushes a trailing event that was not terminated by a blank line.
    pub fn finish(&mut self) -> Vec<String> {
        let mut events = Vec::new();
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&rest);
            let line = line.strip_suffix('\r').unwrap_or(&line).to_string();
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }
        if let Some(event) = self.dispatch() {
            events.push(event);
        }
        events
    }

    fn process_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        if field == "data" {
            self.data.push(value.to_string());
        }
        None
    }

    fn dispatch(&mut self) -> Option<String> {
        if self.data.is_empty() {
            return None;
        }
        let payload = self.data.join("\n");
        self.data.clear();
        Some(payload)
    }
}

struct TextStreamState {
    bytes: Pin<Box<dyn Stream<Item = Result<Bytes, ApiError>> + Send>>,
    decoder: SseDecoder,
    pending: VecDeque<Result<String, ApiError>>,
    done: bool,
}

impl TextStreamState {
    fn push_payloads(&mut self, payloads: Vec<String>) {
        for payload in payloads {
            if payload.trim() == "[DONE]" {
                continue;
            }
            match serde_json::from_str::<GenerateContentResponse>(&payload) {
                Ok(response) => {
                    let text = response.text();
                    if !text.is_empty() {
                        self.pending.push_back(Ok(text));
                    }
                }
                Err(err) => self
                    .pending
                    .push_back(Err(ApiError::new(FailureKind::Decode, err.to_string()))),
            }
        }
    }
}

/// Turns an SSE byte stream of generate-content responses into text chunks.
/// The stream ends after the first transport error.
pub fn decode_text_stream<S>(bytes: S) -> BoxStream<'static, Result<String, ApiError>>
where
    S: Stream<Item = Result<Bytes, ApiError>> + Send + 'static,
{
    let state = TextStreamState {
        bytes: Box::pin(bytes),
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        done: false,
    };
    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.done {
                return None;
            }
            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    let payloads = state.decoder.feed(&chunk);
                    state.push_payloads(payloads);
                }
                Some(Err(err)) => {
                    state.done = true;
                    state.pending.push_back(Err(err));
                }
                None => {
                    state.done = true;
                    let payloads = state.decoder.finish();
                    state.push_payloads(payloads);
                }
            }
        }
    })
    .boxed()
}
