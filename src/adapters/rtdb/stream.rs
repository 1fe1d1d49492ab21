//! One RTDB streaming subscription.
//!
//! [`RtdbStream`] turns an [`EventTransport`] into a [`StreamSource`]:
//!
//! - `begin` opens `https://{db}{path}.json` and restarts the keep-alive
//!   window, whether or not the open succeeds.
//! - `read` drains at most [`MAX_LINES_PER_POLL`] buffered lines and
//!   returns the first value event; later events stay buffered.
//! - Any received line refreshes liveness.  Silence for longer than the
//!   keep-alive timeout is reported as [`StreamErrorKind::Timeout`].  This
//!   also applies to a stream that never opened or was closed after an
//!   error, so every dead stream ends up on the resubscribe path.
//!
//! [`StreamErrorKind::Timeout`]: crate::error::StreamErrorKind::Timeout

use log::debug;

use crate::app::ports::StreamSource;
use crate::error::StreamError;

use super::sse::{self, RtdbEvent, SseParser};
use super::{EventTransport, stream_url};

/// Upper bound on lines consumed by a single `read`.
pub const MAX_LINES_PER_POLL: usize = 16;

pub struct RtdbStream<T> {
    transport: T,
    parser: SseParser,
    database_url: String,
    keepalive_timeout_ms: u64,
    /// Start of the current liveness window; `None` until first touched.
    last_activity_ms: Option<u64>,
    open: bool,
}

impl<T: EventTransport> RtdbStream<T> {
    pub fn new(transport: T, database_url: &str, keepalive_timeout_ms: u32) -> Self {
        Self {
            transport,
            parser: SseParser::new(),
            database_url: database_url.into(),
            keepalive_timeout_ms: keepalive_timeout_ms as u64,
            last_activity_ms: None,
            open: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    fn close(&mut self) {
        if self.open {
            self.transport.close();
            self.open = false;
        }
        self.parser.reset();
    }
}

impl<T: EventTransport> StreamSource for RtdbStream<T> {
    fn begin(&mut self, path: &str, now_ms: u64) -> Result<(), StreamError> {
        self.close();
        self.last_activity_ms = Some(now_ms);

        let url = stream_url(&self.database_url, path);
        debug!("rtdb: opening {}", url);
        self.transport.open(&url)?;
        self.open = true;
        Ok(())
    }

    fn read(&mut self, now_ms: u64) -> Result<Option<i64>, StreamError> {
        let mut last = *self.last_activity_ms.get_or_insert(now_ms);

        if self.open {
            for _ in 0..MAX_LINES_PER_POLL {
                let line = match self.transport.next_line() {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        self.close();
                        return Err(e);
                    }
                };
                last = now_ms;
                self.last_activity_ms = Some(now_ms);

                let Some(frame) = self.parser.push_line(&line) else {
                    continue;
                };
                match sse::decode(&frame)? {
                    RtdbEvent::Value(v) => return Ok(Some(v)),
                    RtdbEvent::KeepAlive | RtdbEvent::Ignored => {}
                    RtdbEvent::Closed(why) => {
                        self.close();
                        return Err(StreamError::transport(why));
                    }
                }
            }
        }

        if now_ms.saturating_sub(last) >= self.keepalive_timeout_ms {
            self.close();
            return Err(StreamError::timeout());
        }
        Ok(None)
    }
}
