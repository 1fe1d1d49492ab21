//! Mock adapters for integration tests.
//!
//! Records every output write and every emitted event so tests can assert
//! on the full history without touching GPIO, LEDC or sockets.

use std::collections::VecDeque;

use cathome::app::channel::OutputId;
use cathome::app::events::AppEvent;
use cathome::app::ports::{BackendPort, Clock, EventSink, NetworkPort, OutputPort, StreamSource};
use cathome::error::{BackendError, ConnectivityError, StreamError, reason};

// ── Output write record ───────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Write {
    Level(OutputId, bool),
    Angle(OutputId, u8),
}

// ── MockOutputs ───────────────────────────────────────────────

#[derive(Default)]
pub struct MockOutputs {
    pub writes: Vec<Write>,
}

#[allow(dead_code)]
impl MockOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_for(&self, output: OutputId) -> Option<Write> {
        self.writes
            .iter()
            .rev()
            .copied()
            .find(|w| matches!(w, Write::Level(o, _) | Write::Angle(o, _) if *o == output))
    }

    pub fn clear(&mut self) {
        self.writes.clear();
    }
}

impl OutputPort for MockOutputs {
    fn write_level(&mut self, output: OutputId, high: bool) {
        self.writes.push(Write::Level(output, high));
    }

    fn write_angle(&mut self, output: OutputId, angle: u8) {
        self.writes.push(Write::Angle(output, angle));
    }
}

// ── MockNetwork ───────────────────────────────────────────────

pub struct MockNetwork {
    pub up: bool,
    /// Whether `reconnect` brings the link back.
    pub reconnect_succeeds: bool,
    pub reconnect_calls: u32,
}

#[allow(dead_code)]
impl MockNetwork {
    pub fn up() -> Self {
        Self {
            up: true,
            reconnect_succeeds: true,
            reconnect_calls: 0,
        }
    }

    pub fn down() -> Self {
        Self {
            up: false,
            reconnect_succeeds: false,
            reconnect_calls: 0,
        }
    }
}

impl NetworkPort for MockNetwork {
    fn is_connected(&self) -> bool {
        self.up
    }

    fn reconnect(&mut self) -> Result<(), ConnectivityError> {
        self.reconnect_calls += 1;
        if self.reconnect_succeeds {
            self.up = true;
            Ok(())
        } else {
            Err(ConnectivityError::ConnectionFailed)
        }
    }
}

// ── MockBackend ───────────────────────────────────────────────

pub struct MockBackend {
    pub ready: bool,
    pub reconnect_succeeds: bool,
    pub reconnect_calls: u32,
    pub invalidations: u32,
}

#[allow(dead_code)]
impl MockBackend {
    pub fn ready() -> Self {
        Self {
            ready: true,
            reconnect_succeeds: true,
            reconnect_calls: 0,
            invalidations: 0,
        }
    }

    pub fn unreachable() -> Self {
        Self {
            ready: false,
            reconnect_succeeds: false,
            reconnect_calls: 0,
            invalidations: 0,
        }
    }
}

impl BackendPort for MockBackend {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn reconnect(&mut self) -> Result<(), BackendError> {
        self.reconnect_calls += 1;
        if self.reconnect_succeeds {
            self.ready = true;
            Ok(())
        } else {
            Err(BackendError::Unreachable(reason("no route")))
        }
    }

    fn invalidate(&mut self) {
        self.invalidations += 1;
        self.ready = false;
    }
}

// ── ScriptedStream ────────────────────────────────────────────

/// Stream whose reads are queued by the test; an empty queue reads
/// `Ok(None)`.
pub struct ScriptedStream {
    pub reads: VecDeque<Result<Option<i64>, StreamError>>,
    pub begin_fails: bool,
    pub begins: u32,
    pub read_calls: u32,
}

#[allow(dead_code)]
impl ScriptedStream {
    pub fn new() -> Self {
        Self {
            reads: VecDeque::new(),
            begin_fails: false,
            begins: 0,
            read_calls: 0,
        }
    }

    pub fn push_value(&mut self, raw: i64) {
        self.reads.push_back(Ok(Some(raw)));
    }

    pub fn push_timeout(&mut self) {
        self.reads.push_back(Err(StreamError::timeout()));
    }

    pub fn push_error(&mut self, why: &str) {
        self.reads.push_back(Err(StreamError::transport(why)));
    }
}

impl StreamSource for ScriptedStream {
    fn begin(&mut self, _path: &str, _now_ms: u64) -> Result<(), StreamError> {
        self.begins += 1;
        if self.begin_fails {
            Err(StreamError::subscribe("HTTP 401"))
        } else {
            Ok(())
        }
    }

    fn read(&mut self, _now_ms: u64) -> Result<Option<i64>, StreamError> {
        self.read_calls += 1;
        self.reads.pop_front().unwrap_or(Ok(None))
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── ManualClock ───────────────────────────────────────────────

/// Clock that only moves when slept on.
#[derive(Default)]
pub struct ManualClock {
    pub now: u64,
    pub sleeps: Vec<u32>,
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now
    }

    fn sleep_ms(&mut self, ms: u32) {
        self.sleeps.push(ms);
        self.now += ms as u64;
    }
}
