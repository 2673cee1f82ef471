//! Incremental parser for the backend's `text/event-stream` responses.

use futures::stream::BoxStream;
use futures::StreamExt;
use serde_json::Value;
use tracing::warn;

use crate::errors::{ClientError, ClientResult};
use crate::models::events::StreamEvent;

/// Incremental event-stream parser.
///
/// Bytes are fed as they arrive. A frame is only complete at a `\n\n`
/// boundary; a trailing partial frame stays buffered until more bytes
/// arrive, and multi-byte UTF-8 sequences split across chunks are carried
/// over to the next feed. Feeding the same bytes in different chunkings
/// always yields the same event sequence.
#[derive(Debug, Default)]
pub struct EventStreamParser {
    /// Bytes that do not yet form complete UTF-8.
    pending: Vec<u8>,
    /// Decoded text up to the last complete frame boundary.
    buffer: String,
    saw_terminal: bool,
}

impl EventStreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a terminal (`result`/`error_final`) event has been decoded.
    pub fn saw_terminal(&self) -> bool {
        self.saw_terminal
    }

    /// Feed one chunk of bytes, returning every event it completed.
    ///
    /// Frames with empty or undecodable payloads are logged and skipped;
    /// they never fail the stream.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.decode_chunk(chunk);

        let mut events = Vec::new();
        while let Some(boundary) = self.buffer.find("\n\n") {
            let frame: String = self.buffer.drain(..boundary + 2).collect();
            if let Some(event) = parse_frame(frame.trim_end_matches('\n')) {
                if event.is_terminal() {
                    self.saw_terminal = true;
                }
                events.push(event);
            }
        }
        events
    }

    fn decode_chunk(&mut self, chunk: &[u8]) {
        self.pending.extend_from_slice(chunk);
        let valid = match std::str::from_utf8(&self.pending) {
            Ok(text) => {
                self.buffer.push_str(text);
                self.pending.len()
            }
            Err(err) => {
                let valid = err.valid_up_to();
                if let Ok(text) = std::str::from_utf8(&self.pending[..valid]) {
                    self.buffer.push_str(text);
                }
                valid
            }
        };
        self.pending.drain(..valid);
    }
}

/// Parse one complete frame: `event:` lines pick the type (default
/// `message`), `data:` lines concatenate into the payload.
fn parse_frame(frame: &str) -> Option<StreamEvent> {
    if frame.trim().is_empty() {
        return None;
    }

    let mut event_type = "message";
    let mut data = String::new();
    for line in frame.split('\n') {
        if let Some(rest) = line.strip_prefix("event:") {
            event_type = rest.trim();
        } else if let Some(rest) = line.strip_prefix("data:") {
            data.push_str(rest);
        }
    }

    if data.trim().is_empty() {
        warn!(event_type, "skipping frame with an empty payload");
        return None;
    }
    let payload: Value = match serde_json::from_str(data.trim()) {
        Ok(value) => value,
        Err(err) => {
            warn!(%err, event_type, "skipping frame with an undecodable payload");
            return None;
        }
    };

    let event = StreamEvent::decode(event_type, payload);
    if event.is_none() {
        warn!(event_type, "skipping frame whose payload does not match its event name");
    }
    event
}

/// Consume a streaming HTTP response into a stream of decoded events.
///
/// Events come out strictly in arrival order. If the transport ends
/// without a terminal event ever having been seen, exactly one
/// [`ClientError::IncompleteResponse`] is yielded before the stream ends.
pub fn event_stream(response: reqwest::Response) -> BoxStream<'static, ClientResult<StreamEvent>> {
    let stream = async_stream::try_stream! {
        let mut parser = EventStreamParser::new();
        let mut bytes = response.bytes_stream();
        while let Some(chunk) = bytes.next().await {
            let chunk = chunk?;
            for event in parser.feed(&chunk) {
                yield event;
            }
        }
        if !parser.saw_terminal() {
            Err(ClientError::IncompleteResponse)?;
        }
    };
    stream.boxed()
}
