//! Server-sent-events decoding for the RTDB REST streaming API.
//!
//! Three layers, each usable on its own:
//!
//! ```text
//!  bytes ──▶ LineBuffer ──▶ lines ──▶ SseParser ──▶ SseFrame ──▶ decode() ──▶ RtdbEvent
//! ```
//!
//! - [`LineBuffer`] splits a raw byte stream into `\n`-terminated lines.
//! - [`SseParser`] folds `event:`/`data:` lines into one frame per blank line.
//! - [`decode`] interprets a frame the way the database sends them.
//!
//! ## Wire format
//!
//! ```text
//! event: put
//! data: {"path":"/","data":1}
//!
//! event: keep-alive
//! data: null
//!
//! ```

use serde::Deserialize;
use serde_json::Value;

use crate::error::StreamError;

/// Longest accepted line or accumulated `data:` payload.
pub const MAX_LINE_LEN: usize = 1024;

// ───────────────────────────────────────────────────────────────
// Line splitting
// ───────────────────────────────────────────────────────────────

/// Byte accumulator that yields complete lines.
///
/// An over-long line is dropped whole and reported once.
#[derive(Debug, Default)]
pub struct LineBuffer {
    partial: Vec<u8>,
    discarding: bool,
}

/// One item out of a [`LineBuffer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Text(String),
    /// A line exceeded [`MAX_LINE_LEN`] and was dropped.
    TooLong,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed `bytes`, calling `on_line` for every completed line (without
    /// the terminator, `\r` stripped).
    pub fn push(&mut self, bytes: &[u8], mut on_line: impl FnMut(Line)) {
        for &b in bytes {
            if b == b'\n' {
                if self.discarding {
                    self.discarding = false;
                } else {
                    if self.partial.last() == Some(&b'\r') {
                        self.partial.pop();
                    }
                    let text = String::from_utf8_lossy(&self.partial).into_owned();
                    on_line(Line::Text(text));
                }
                self.partial.clear();
                continue;
            }
            if self.discarding {
                continue;
            }
            if self.partial.len() >= MAX_LINE_LEN {
                self.partial.clear();
                self.discarding = true;
                on_line(Line::TooLong);
                continue;
            }
            self.partial.push(b);
        }
    }

    pub fn reset(&mut self) {
        self.partial.clear();
        self.discarding = false;
    }
}

// ───────────────────────────────────────────────────────────────
// Frame assembly
// ───────────────────────────────────────────────────────────────

/// One dispatched server-sent event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseFrame {
    pub event: heapless::String<32>,
    pub data: String,
    /// The payload exceeded [`MAX_LINE_LEN`] and was cut.
    pub truncated: bool,
}

#[derive(Debug, Default)]
pub struct SseParser {
    pending: SseFrame,
    has_fields: bool,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line.  Returns a frame when `line` is the blank line that
    /// terminates it.
    pub fn push_line(&mut self, line: &str) -> Option<SseFrame> {
        let line = line.strip_suffix('\r').unwrap_or(line);

        if line.is_empty() {
            if !self.has_fields {
                return None;
            }
            self.has_fields = false;
            return Some(core::mem::take(&mut self.pending));
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((f, v)) => (f, v.strip_prefix(' ').unwrap_or(v)),
            None => (line, ""),
        };
        match field {
            "event" => {
                self.pending.event.clear();
                // An over-long name stays empty: unknown event.
                let _ = self.pending.event.push_str(value);
            }
            "data" => {
                let sep = usize::from(!self.pending.data.is_empty());
                if self.pending.data.len() + sep + value.len() > MAX_LINE_LEN {
                    self.pending.truncated = true;
                } else {
                    if sep == 1 {
                        self.pending.data.push('\n');
                    }
                    self.pending.data.push_str(value);
                }
            }
            _ => return None,
        }
        self.has_fields = true;
        None
    }

    pub fn reset(&mut self) {
        self.pending = SseFrame::default();
        self.has_fields = false;
    }
}

// ───────────────────────────────────────────────────────────────
// Event decoding
// ───────────────────────────────────────────────────────────────

/// Meaning of one frame for a leaf subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RtdbEvent {
    /// New value at the subscribed path.
    Value(i64),
    /// Liveness only.
    KeepAlive,
    /// The server ended the subscription; the connection must be closed.
    Closed(&'static str),
    /// Nothing for this channel (child path, unknown event).
    Ignored,
}

#[derive(Deserialize)]
struct Envelope {
    path: String,
    data: Value,
}

pub fn decode(frame: &SseFrame) -> Result<RtdbEvent, StreamError> {
    match frame.event.as_str() {
        "put" | "patch" => {
            if frame.truncated {
                return Err(StreamError::transport("event payload too large"));
            }
            let env: Envelope = serde_json::from_str(&frame.data)
                .map_err(|_| StreamError::transport("malformed event payload"))?;
            if env.path != "/" {
                return Ok(RtdbEvent::Ignored);
            }
            coerce(&env.data).map(RtdbEvent::Value)
        }
        "keep-alive" => Ok(RtdbEvent::KeepAlive),
        "cancel" => Ok(RtdbEvent::Closed("stream cancelled by server")),
        "auth_revoked" => Ok(RtdbEvent::Closed("stream auth revoked")),
        _ => Ok(RtdbEvent::Ignored),
    }
}

/// Integer view of a JSON value: integers as-is, floats truncated,
/// booleans as 1/0.
pub fn coerce(value: &Value) -> Result<i64, StreamError> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|_| i64::MAX))
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or_else(|| StreamError::transport("non-integer payload")),
        Value::Bool(b) => Ok(i64::from(*b)),
        _ => Err(StreamError::transport("non-integer payload")),
    }
}
