//! Firebase Realtime Database adapter.
//!
//! | Item            | Implements     | Role                                   |
//! |-----------------|----------------|----------------------------------------|
//! | [`RtdbStream`]  | `StreamSource` | one SSE connection per channel         |
//! | [`RtdbBackend`] | `BackendPort`  | shallow-GET readiness probe            |
//! | `sse`           | (parsing)      | line splitting, frames, value coercion |
//! | `reader`        | (threading)    | reader thread to tick line queue       |
//! | `esp_impl`      | transports     | `EspHttpConnection` (espidf only)      |
//!
//! The HTTP layer sits behind [`EventTransport`] and [`HttpProbe`], so
//! everything above it is exercised on the host with scripted transports.

pub mod backend;
pub mod reader;
pub mod sse;
pub mod stream;

#[cfg(target_os = "espidf")]
pub mod esp_impl;

pub use backend::RtdbBackend;
pub use stream::RtdbStream;

use crate::error::{BackendError, StreamError};

/// Line-oriented, non-blocking access to one streaming HTTP response.
pub trait EventTransport {
    /// Open a streaming GET on `url`.  Any previous response is dropped.
    fn open(&mut self, url: &str) -> Result<(), StreamError>;

    /// Next complete line, if one is already buffered.  Never blocks.
    fn next_line(&mut self) -> Result<Option<String>, StreamError>;

    fn close(&mut self);
}

/// One-shot GET returning only the status code.
pub trait HttpProbe {
    fn get_status(&mut self, url: &str) -> Result<u16, BackendError>;
}

/// `https://{host}{path}.json`, the streaming endpoint for a leaf path.
pub fn stream_url(host: &str, path: &str) -> String {
    format!("https://{}/{}.json", host.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Shallow read of the database root.
pub fn probe_url(host: &str) -> String {
    format!("https://{}/.json?shallow=true", host.trim_end_matches('/'))
}
