//! ESP-IDF HTTP transports for the RTDB adapter.
//!
//! - [`EspSseTransport`]: `open` only spawns a reader thread.  The thread
//!   makes the streaming GET (following `307` redirects to the serving
//!   node) and feeds lines into a [`LineQueue`], so neither `open` nor
//!   `next_line` blocks the tick.  A failed connect surfaces as the
//!   stream's first `next_line` error.
//! - [`EspProbe`]: one short-lived GET per call, bounded by
//!   `PROBE_TIMEOUT`.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use esp_idf_hal::delay::FreeRtos;
use esp_idf_svc::http::Method;
use esp_idf_svc::http::client::{Configuration, EspHttpConnection};
use log::debug;

use crate::error::{BackendError, StreamError, reason};

use super::reader::{LineQueue, serve};
use super::{EventTransport, HttpProbe};

/// Socket timeout for streams; the server sends keep-alives every ~30 s.
const STREAM_SOCKET_TIMEOUT: Duration = Duration::from_secs(60);
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const READER_STACK: usize = 8 * 1024;
/// Back-off while the line queue is full.
const QUEUE_FULL_WAIT_MS: u32 = 10;
const MAX_REDIRECTS: u8 = 2;

fn client(timeout: Duration) -> Result<EspHttpConnection, esp_idf_svc::sys::EspError> {
    EspHttpConnection::new(&Configuration {
        timeout: Some(timeout),
        crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
        ..Default::default()
    })
}

// ───────────────────────────────────────────────────────────────
// Streaming transport
// ───────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct EspSseTransport {
    queue: Option<Arc<LineQueue>>,
}

impl EspSseTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

fn connect(url: &str) -> Result<EspHttpConnection, StreamError> {
    let fail = |what: &str, e: esp_idf_svc::sys::EspError| StreamError::subscribe(&format!("{what}: {e}"));
    let mut target = String::from(url);

    for _ in 0..=MAX_REDIRECTS {
        let mut conn = client(STREAM_SOCKET_TIMEOUT).map_err(|e| fail("client", e))?;
        conn.initiate_request(Method::Get, &target, &[("Accept", "text/event-stream")])
            .map_err(|e| fail("request", e))?;
        conn.initiate_response().map_err(|e| fail("response", e))?;

        match conn.status() {
            200 => return Ok(conn),
            307 => {
                let Some(location) = conn.header("Location") else {
                    return Err(StreamError::subscribe("redirect without location"));
                };
                debug!("rtdb: redirected to {}", location);
                target = location.to_owned();
            }
            status => return Err(StreamError::subscribe(&format!("HTTP {status}"))),
        }
    }
    Err(StreamError::subscribe("too many redirects"))
}

fn spawn_reader(url: String, queue: Arc<LineQueue>) -> std::io::Result<()> {
    thread::Builder::new()
        .name("rtdb-sse".into())
        .stack_size(READER_STACK)
        .spawn(move || {
            serve(
                &queue,
                || connect(&url),
                |conn, buf| {
                    conn.read(buf)
                        .map_err(|e| StreamError::transport(&format!("read: {e}")))
                },
                || FreeRtos::delay_ms(QUEUE_FULL_WAIT_MS),
            );
            debug!("rtdb: reader for {} finished", url);
        })
        .map(|_| ())
}

impl EventTransport for EspSseTransport {
    fn open(&mut self, url: &str) -> Result<(), StreamError> {
        self.close();
        let queue = Arc::new(LineQueue::new());
        spawn_reader(url.to_owned(), Arc::clone(&queue))
            .map_err(|e| StreamError::subscribe(&format!("reader: {e}")))?;
        self.queue = Some(queue);
        Ok(())
    }

    fn next_line(&mut self) -> Result<Option<String>, StreamError> {
        let Some(queue) = &self.queue else {
            return Ok(None);
        };
        queue.try_next().transpose()
    }

    fn close(&mut self) {
        if let Some(queue) = self.queue.take() {
            queue.stop();
        }
    }
}

impl Drop for EspSseTransport {
    fn drop(&mut self) {
        self.close();
    }
}

// ───────────────────────────────────────────────────────────────
// Readiness probe
// ───────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct EspProbe;

impl HttpProbe for EspProbe {
    fn get_status(&mut self, url: &str) -> Result<u16, BackendError> {
        let unreachable = |e: esp_idf_svc::sys::EspError| BackendError::Unreachable(reason(&e.to_string()));
        let mut conn = client(PROBE_TIMEOUT).map_err(unreachable)?;
        conn.initiate_request(Method::Get, url, &[]).map_err(unreachable)?;
        conn.initiate_response().map_err(unreachable)?;
        Ok(conn.status())
    }
}
