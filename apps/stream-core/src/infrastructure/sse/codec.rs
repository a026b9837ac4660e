//! SSE Frame Codec
//!
//! Incremental parser for the `text/event-stream` wire format. Bytes arrive
//! in arbitrary chunks; the parser buffers partial lines and emits complete
//! events once their terminating blank line arrives.
//!
//! # Wire Format
//!
//! ```text
//! event: price
//! id: 42
//! data: {"instrument_id":"frxEURUSD","price":"1.09312"}
//!
//! ```
//!
//! Field lines are `name: value`; multiple `data:` lines concatenate with
//! newlines; lines starting with `:` are comments (keep-alives); a blank
//! line dispatches the buffered event. Events with an empty data buffer are
//! not dispatched, per the eventsource processing model.

// =============================================================================
// Event
// =============================================================================

/// One complete server-sent event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseEvent {
    /// Value of the `event:` field, when present.
    pub event: Option<String>,
    /// Value of the `id:` field, when present.
    pub id: Option<String>,
    /// Concatenated `data:` payload.
    pub data: String,
}

// =============================================================================
// Parser
// =============================================================================

/// Incremental SSE parser.
///
/// Feed it raw chunks as they arrive; it returns every event completed by
/// that chunk. State carries across calls, so chunk boundaries may fall
/// anywhere, including mid-line or inside a multi-byte UTF-8 sequence.
#[derive(Debug, Default)]
pub struct SseParser {
    pending: Vec<u8>,
    data: String,
    event: Option<String>,
    id: Option<String>,
}

impl SseParser {
    /// Create a parser with empty buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume a chunk and return the events it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        // Pending bytes stay undecoded until a full line arrives, so a
        // code point split across chunks is reassembled before decoding.
        self.pending.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let mut raw: Vec<u8> = self.pending.drain(..=pos).collect();
            raw.pop();
            if raw.last() == Some(&b'\r') {
                raw.pop();
            }

            let line = String::from_utf8_lossy(&raw);
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }
        events
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }

        // Comment / keep-alive line.
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            // A field name with no colon is a field with an empty value.
            None => (line, ""),
        };

        match field {
            "data" => {
                if !self.data.is_empty() {
                    self.data.push('\n');
                }
                self.data.push_str(value);
            }
            "event" => self.event = Some(value.to_string()),
            "id" => self.id = Some(value.to_string()),
            // "retry" and unknown fields are ignored.
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        let id = self.id.take();
        if self.data.is_empty() {
            return None;
        }
        Some(SseEvent {
            event,
            id,
            data: std::mem::take(&mut self.data),
        })
    }
}
