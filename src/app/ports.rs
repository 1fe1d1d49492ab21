//! Port traits: the hexagonal boundary between the sync engine and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ SyncService (domain)
//! ```
//!
//! Driven adapters (WiFi, realtime database, relays/servos, log sink, clock)
//! implement these traits.  The [`SyncService`](super::service::SyncService)
//! consumes them via generics, so the domain core never touches hardware
//! or sockets directly and every tick can be driven from a test harness.

use crate::error::{BackendError, ConnectivityError, StreamError};

use super::channel::OutputId;
use super::events::AppEvent;

// ───────────────────────────────────────────────────────────────
// Network link
// ───────────────────────────────────────────────────────────────

/// Station-mode network link.
pub trait NetworkPort {
    fn is_connected(&self) -> bool;

    /// Attempt to re-associate with the configured access point.
    /// May block for the duration of one association attempt.
    fn reconnect(&mut self) -> Result<(), ConnectivityError>;
}

// ───────────────────────────────────────────────────────────────
// Backend
// ───────────────────────────────────────────────────────────────

/// Readiness of the remote store as a whole.
pub trait BackendPort {
    fn is_ready(&self) -> bool;

    /// One non-blocking-ish attempt to (re-)establish backend connectivity.
    fn reconnect(&mut self) -> Result<(), BackendError>;

    /// Forget readiness, e.g. after the network link dropped.
    fn invalidate(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Streams
// ───────────────────────────────────────────────────────────────

/// One push-style subscription to a single path of the remote store.
///
/// Each channel owns exactly one source.  `now_ms` is the scheduler's
/// monotonic time, used for keep-alive bookkeeping.
pub trait StreamSource {
    /// Open (or re-open) the stream on `path`.
    fn begin(&mut self, path: &str, now_ms: u64) -> Result<(), StreamError>;

    /// Non-blocking read.
    ///
    /// - `Ok(Some(v))`: a new sample arrived since the last read.
    /// - `Ok(None)`: nothing new.
    /// - `Err(e)`: timeout (`e.is_timeout()`) or transport failure.
    fn read(&mut self, now_ms: u64) -> Result<Option<i64>, StreamError>;
}

// ───────────────────────────────────────────────────────────────
// Outputs
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to drive physical outputs.
pub trait OutputPort {
    /// Drive a two-level output (`true` = HIGH).
    fn write_level(&mut self, output: OutputId, high: bool);

    /// Drive a continuous output to `angle` (0-180).
    fn write_angle(&mut self, output: OutputId, angle: u8);
}

// ───────────────────────────────────────────────────────────────
// Event sink
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`]s through this port.  Adapters
/// decide where they go (serial log, telemetry, ...).
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Time
// ───────────────────────────────────────────────────────────────

/// Monotonic time and the one blocking primitive the firmware uses.
pub trait Clock {
    /// Milliseconds since boot.
    fn now_ms(&self) -> u64;

    fn sleep_ms(&mut self, ms: u32);
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate
// ───────────────────────────────────────────────────────────────

/// Callback the [`TickScheduler`](crate::scheduler::TickScheduler) invokes
/// once per period.
///
/// This decouples the periodic driver from what a tick does; the main loop
/// implements it by running one [`SyncService::tick`](super::service::SyncService::tick).
pub trait TickDelegate {
    fn on_tick(&mut self, now_ms: u64);
}
