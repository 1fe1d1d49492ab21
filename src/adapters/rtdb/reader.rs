//! Hand-off between a blocking stream reader and the tick.
//!
//! The reader side owns the HTTP connection: it connects, reads chunks,
//! splits them into lines and pushes each line into a bounded
//! `embassy-sync` channel.  The tick side drains that channel with
//! `try_next`, which never blocks.
//!
//! ```text
//! ┌──────────────┐  LineResult  ┌──────────────┐
//! │ reader thread│────────────▶│   tick loop   │
//! │  (blocking)  │◀ ─ ─ stop ─ ─│  (try_next)   │
//! └──────────────┘              └──────────────┘
//! ```
//!
//! Closing a stream raises the `stop` signal; the reader returns at its
//! next line or while waiting on a full queue.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use embassy_sync::signal::Signal;
use log::warn;

use crate::error::StreamError;

use super::sse::{Line, LineBuffer};

/// Lines buffered between reader and tick.
pub const LINE_QUEUE: usize = 32;

/// Bytes requested per blocking read.
pub const READ_CHUNK: usize = 512;

pub type LineResult = Result<String, StreamError>;

pub struct LineQueue {
    lines: Channel<CriticalSectionRawMutex, LineResult, LINE_QUEUE>,
    stop: Signal<CriticalSectionRawMutex, ()>,
}

impl Default for LineQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl LineQueue {
    pub const fn new() -> Self {
        Self {
            lines: Channel::new(),
            stop: Signal::new(),
        }
    }

    /// Ask the reader to return.  Lines already queued are left in place.
    pub fn stop(&self) {
        self.stop.signal(());
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.signaled()
    }

    /// Next queued line, if any.
    pub fn try_next(&self) -> Option<LineResult> {
        self.lines.try_receive().ok()
    }

    /// Queue `item`, calling `wait` between attempts while the queue is
    /// full.  Returns `false` if the queue was stopped first.
    pub fn deliver(&self, mut item: LineResult, mut wait: impl FnMut()) -> bool {
        loop {
            if self.is_stopped() {
                return false;
            }
            match self.lines.try_send(item) {
                Ok(()) => return true,
                Err(TrySendError::Full(back)) => {
                    item = back;
                    wait();
                }
            }
        }
    }
}

/// Reader body: connect, then read and split lines until the stream ends,
/// fails or `queue` is stopped.  A failed connect or read is delivered as
/// the last item.
pub fn serve<C>(
    queue: &LineQueue,
    connect: impl FnOnce() -> Result<C, StreamError>,
    mut read: impl FnMut(&mut C, &mut [u8]) -> Result<usize, StreamError>,
    mut wait: impl FnMut(),
) {
    let mut conn = match connect() {
        Ok(conn) => conn,
        Err(e) => {
            queue.deliver(Err(e), &mut wait);
            return;
        }
    };

    let mut lines = LineBuffer::new();
    let mut buf = [0u8; READ_CHUNK];
    while !queue.is_stopped() {
        let n = match read(&mut conn, &mut buf) {
            Ok(0) => {
                queue.deliver(Err(StreamError::transport("stream closed by server")), &mut wait);
                return;
            }
            Ok(n) => n,
            Err(e) => {
                queue.deliver(Err(e), &mut wait);
                return;
            }
        };

        let mut open = true;
        lines.push(&buf[..n], |line| match line {
            Line::Text(text) => open = open && queue.deliver(Ok(text), &mut wait),
            Line::TooLong => warn!("rtdb: over-long line dropped"),
        });
        if !open {
            return;
        }
    }
}
