// ABOUTME: Incremental decoder for text/event-stream bodies.
// ABOUTME: Turns arbitrary byte chunks into dispatched events and maps them to status updates.

use crate::snapshot::Snapshot;

use super::error::TransportError;

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Event name, `message` when the server sent none.
    pub event: String,
    /// Data lines joined with `\n`.
    pub data: String,
    pub id: Option<String>,
}

/// What a stream event means to the sync core.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Snapshot(Snapshot),
    /// The resource no longer exists.
    Deleted,
    Heartbeat,
}

/// Upper bound on one unterminated line or one event's data.
pub const MAX_EVENT_BYTES: usize = 1024 * 1024;

/// Line-oriented event-stream parser. Chunks may split lines (and UTF-8
/// sequences) anywhere.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    /// Skipping the rest of an oversized line.
    discarding: bool,
    /// Skipping the rest of an oversized event.
    skipping_event: bool,
    event: Option<String>,
    data: Vec<String>,
    data_len: usize,
    last_id: Option<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of body bytes, returning every event completed by it.
    ///
    /// A line or event larger than [`MAX_EVENT_BYTES`] is skipped and the
    /// chunk reports a decode error instead of its events. Decoding resumes
    /// with the next event.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<SseEvent>, TransportError> {
        let mut chunk = chunk;
        if self.discarding {
            let Some(newline) = chunk.iter().position(|b| *b == b'\n') else {
                return Ok(Vec::new());
            };
            self.discarding = false;
            chunk = &chunk[newline + 1..];
        }
        self.buffer.extend_from_slice(chunk);

        let mut overflowed = false;
        let mut events = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=newline).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line).into_owned();
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
            if self.data_len > MAX_EVENT_BYTES {
                self.drop_event();
                overflowed = true;
            }
        }

        if self.buffer.len() > MAX_EVENT_BYTES {
            self.buffer = Vec::new();
            self.discarding = true;
            self.drop_event();
            overflowed = true;
        }

        if overflowed {
            tracing::warn!("Dropped oversized stream event");
            return Err(TransportError::Decode(format!(
                "stream event exceeds {MAX_EVENT_BYTES} bytes"
            )));
        }
        Ok(events)
    }

    /// Forget the event being assembled and ignore its remaining lines.
    fn drop_event(&mut self) {
        self.event = None;
        self.data.clear();
        self.data_len = 0;
        self.skipping_event = true;
    }

    /// Last event id seen.
    pub fn last_event_id(&self) -> Option<&str> {
        self.last_id.as_deref()
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if self.skipping_event {
            self.skipping_event = !line.is_empty();
            return None;
        }
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

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => {
                self.data_len += value.len() + 1;
                self.data.push(value.to_string());
            }
            "id" if !value.contains('\0') => self.last_id = Some(value.to_string()),
            // retry and unknown fields are ignored; reconnect timing is ours
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }

        self.data_len = 0;
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseEvent {
            event: event
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| "message".to_string()),
            data,
            id: self.last_id.clone(),
        })
    }
}

/// Map a raw event to its meaning. Unknown event names yield `None`.
pub fn interpret(event: &SseEvent) -> Result<Option<StreamEvent>, TransportError> {
    match event.event.as_str() {
        "snapshot" | "message" | "update" => Snapshot::from_json(&event.data)
            .map(|snapshot| Some(StreamEvent::Snapshot(snapshot)))
            .map_err(|e| TransportError::Decode(e.to_string())),
        "deleted" => Ok(Some(StreamEvent::Deleted)),
        "ping" | "heartbeat" | "keepalive" => Ok(Some(StreamEvent::Heartbeat)),
        other => {
            tracing::debug!("Ignoring unknown stream event '{}'", other);
            Ok(None)
        }
    }
}
