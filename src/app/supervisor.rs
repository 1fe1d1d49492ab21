//! Connection supervisor.
//!
//! Owns the process-wide [`ConnectivityState`] and gates every scheduler
//! tick:
//!
//! 1. Link down → try to re-associate (subject to backoff) → `NotReady`.
//! 2. Link up, backend not ready → try to reconnect (subject to backoff)
//!    → `NotReady`.
//! 3. Both up → resubscribe every channel flagged `timed_out` → `Ready`.
//!
//! ## Reconnection policy
//!
//! After a failed recovery attempt the next one waits an exponential
//! backoff (initial → 2× … capped at the configured maximum).  Status is
//! still checked every tick, so recovery by the driver itself is noticed
//! immediately.  Resubscription is never delayed by backoff.

use crate::config::SystemConfig;
use crate::error::reason;

use super::events::AppEvent;
use super::ports::{BackendPort, EventSink, NetworkPort, StreamSource};
use super::subscription::ChannelSubscription;

/// Connectivity as observed at the start of the last tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectivityState {
    pub network_up: bool,
    pub backend_ready: bool,
}

/// Outcome of [`ConnectionSupervisor::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    NotReady,
}

// ───────────────────────────────────────────────────────────────
// Backoff
// ───────────────────────────────────────────────────────────────

/// Exponential retry delay with a ceiling.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial_ms: u32,
    max_ms: u32,
    current_ms: u32,
    next_attempt_ms: Option<u64>,
    failures: u32,
}

impl Backoff {
    pub fn new(initial_ms: u32, max_ms: u32) -> Self {
        Self {
            initial_ms,
            max_ms,
            current_ms: initial_ms,
            next_attempt_ms: None,
            failures: 0,
        }
    }

    /// Whether an attempt is allowed at `now_ms`.
    pub fn may_attempt(&self, now_ms: u64) -> bool {
        self.next_attempt_ms.is_none_or(|at| now_ms >= at)
    }

    pub fn record_failure(&mut self, now_ms: u64) {
        self.next_attempt_ms = Some(now_ms + self.current_ms as u64);
        self.current_ms = self.current_ms.saturating_mul(2).min(self.max_ms);
        self.failures = self.failures.saturating_add(1);
    }

    pub fn reset(&mut self) {
        self.current_ms = self.initial_ms;
        self.next_attempt_ms = None;
        self.failures = 0;
    }

    /// Consecutive failures since the last reset.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Delay that will follow the next failure.
    pub fn current_delay_ms(&self) -> u32 {
        self.current_ms
    }
}

// ───────────────────────────────────────────────────────────────
// Supervisor
// ───────────────────────────────────────────────────────────────

pub struct ConnectionSupervisor {
    state: ConnectivityState,
    network_backoff: Backoff,
    backend_backoff: Backoff,
    last_resubscribed: usize,
}

impl ConnectionSupervisor {
    pub fn new(config: &SystemConfig) -> Self {
        let (initial, max) = (config.reconnect_backoff_initial_ms, config.reconnect_backoff_max_ms);
        Self {
            state: ConnectivityState::default(),
            network_backoff: Backoff::new(initial, max),
            backend_backoff: Backoff::new(initial, max),
            last_resubscribed: 0,
        }
    }

    pub fn state(&self) -> ConnectivityState {
        self.state
    }

    /// Resubscription attempts made by the last tick.
    pub fn last_resubscribed(&self) -> usize {
        self.last_resubscribed
    }

    pub fn network_backoff(&self) -> &Backoff {
        &self.network_backoff
    }

    pub fn backend_backoff(&self) -> &Backoff {
        &self.backend_backoff
    }

    /// Record the state reached by the startup handshake without emitting
    /// transition events.
    pub fn prime(&mut self, net: &impl NetworkPort, backend: &impl BackendPort) {
        let network_up = net.is_connected();
        self.state = ConnectivityState {
            network_up,
            backend_ready: network_up && backend.is_ready(),
        };
    }

    /// Evaluate connectivity, attempt recovery, resubscribe lapsed channels.
    pub fn tick<S: StreamSource>(
        &mut self,
        now_ms: u64,
        net: &mut impl NetworkPort,
        backend: &mut impl BackendPort,
        subscriptions: &mut [ChannelSubscription<S>],
        sink: &mut impl EventSink,
    ) -> Readiness {
        self.last_resubscribed = 0;

        // 1. Network link
        if !net.is_connected() {
            if self.state.network_up {
                sink.emit(&AppEvent::NetworkLost);
            }
            self.state = ConnectivityState::default();
            backend.invalidate();

            if self.network_backoff.may_attempt(now_ms) {
                match net.reconnect() {
                    Ok(()) => self.network_backoff.reset(),
                    Err(_) => {
                        self.network_backoff.record_failure(now_ms);
                        sink.emit(&AppEvent::ReassociationFailed);
                    }
                }
            }
            return Readiness::NotReady;
        }
        if !self.state.network_up {
            self.network_backoff.reset();
            sink.emit(&AppEvent::NetworkRestored);
        }
        self.state.network_up = true;

        // 2. Backend
        if !backend.is_ready() {
            if self.state.backend_ready {
                sink.emit(&AppEvent::BackendLost);
            }
            self.state.backend_ready = false;

            if self.backend_backoff.may_attempt(now_ms) {
                match backend.reconnect() {
                    Ok(()) => self.backend_backoff.reset(),
                    Err(e) => {
                        self.backend_backoff.record_failure(now_ms);
                        sink.emit(&AppEvent::BackendReconnectFailed(reason(&e.to_string())));
                    }
                }
            }
            return Readiness::NotReady;
        }
        if !self.state.backend_ready {
            self.backend_backoff.reset();
            sink.emit(&AppEvent::BackendRestored);
        }
        self.state.backend_ready = true;

        // 3. Lapsed streams only; healthy ones are left alone.
        for sub in subscriptions.iter_mut().filter(|s| s.needs_resubscribe()) {
            self.last_resubscribed += 1;
            // Failure keeps `timed_out` set; retried next ready tick.
            let _ = sub.subscribe(now_ms, sink);
        }
        Readiness::Ready
    }
}
