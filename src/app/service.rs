//! Sync service, the hexagonal core.
//!
//! [`SyncService`] owns the connection supervisor, one subscription per
//! channel and one driver per physical output.  All I/O flows through
//! port traits injected at call sites, so a whole tick can be driven from
//! a test harness.
//!
//! ```text
//!  NetworkPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!  BackendPort ──▶ │          SyncService          │
//! StreamSource ──▶ │ Supervisor · Subscriptions ·  │ ──▶ OutputPort
//!                  │      Mapper · Drivers         │
//!                  └──────────────────────────────┘
//! ```
//!
//! Lifecycle: [`bring_up`](SyncService::bring_up) →
//! [`start`](SyncService::start) → [`tick`](SyncService::tick) forever.
//!
//! One tick:
//!
//! 1. Supervisor gate.  `NotReady` ends the tick: no polls, no writes.
//! 2. Poll every subscription in table order; map each new value and
//!    apply it to the channel's output.
//! 3. Step pass: outputs with a latched direction move one step.  A
//!    direction channel that times out or errors releases its latch.

use log::info;

use crate::config::SystemConfig;

use super::actuator::{ActuatorDriver, TargetKind};
use super::channel::{ChannelKind, OutputId, RemoteChannel};
use super::events::AppEvent;
use super::mapper::{self, ActuatorCommand, Mapped, StepLatch};
use super::ports::{BackendPort, EventSink, NetworkPort, OutputPort, StreamSource};
use super::subscription::{ChannelSubscription, PollOutcome};
use super::supervisor::{ConnectionSupervisor, ConnectivityState, Readiness};

/// What one [`SyncService::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub readiness: Readiness,
    /// Physical writes issued.
    pub applied: usize,
    /// Resubscription attempts made by the supervisor.
    pub resubscribed: usize,
    /// Channels that answered `TimedOut`.
    pub timed_out: usize,
    /// Channels that reported a transport error.
    pub errors: usize,
}

impl TickReport {
    fn new(readiness: Readiness, resubscribed: usize) -> Self {
        Self {
            readiness,
            applied: 0,
            resubscribed,
            timed_out: 0,
            errors: 0,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// SyncService
// ───────────────────────────────────────────────────────────────

pub struct SyncService<S> {
    config: SystemConfig,
    supervisor: ConnectionSupervisor,
    subscriptions: Vec<ChannelSubscription<S>>,
    drivers: [Option<ActuatorDriver>; OutputId::COUNT],
    latches: [StepLatch; OutputId::COUNT],
    tick_count: u64,
}

impl<S: StreamSource> SyncService<S> {
    /// Build one subscription per channel (streams from `make_stream`) and
    /// one driver per output the table references.
    ///
    /// Does **not** touch hardware or the network: call
    /// [`bring_up`](Self::bring_up) and [`start`](Self::start) next.
    pub fn new(
        config: SystemConfig,
        channels: &[RemoteChannel],
        mut make_stream: impl FnMut(&RemoteChannel) -> S,
    ) -> Self {
        let suppress = config.suppress_redundant_writes;
        let mut drivers: [Option<ActuatorDriver>; OutputId::COUNT] = Default::default();

        for ch in channels {
            let slot = &mut drivers[ch.output.index()];
            if slot.is_some() {
                continue;
            }
            *slot = Some(match ch.kind {
                ChannelKind::Binary => ActuatorDriver::binary(ch.output, suppress),
                ChannelKind::Continuous(bounds) | ChannelKind::Direction(_, bounds) => {
                    ActuatorDriver::continuous(ch.output, bounds, config.servo_initial_angle, suppress)
                }
            });
        }

        let subscriptions = channels
            .iter()
            .map(|ch| ChannelSubscription::new(*ch, make_stream(ch)))
            .collect();

        Self {
            supervisor: ConnectionSupervisor::new(&config),
            config,
            subscriptions,
            drivers,
            latches: [StepLatch::default(); OutputId::COUNT],
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Drive every output to its initial state.  Always writes, even with
    /// redundant-write suppression enabled.
    pub fn bring_up(&mut self, out: &mut impl OutputPort) {
        for driver in self.drivers.iter_mut().flatten() {
            driver.bring_up(out);
        }
    }

    /// Record the connectivity reached at boot and open every stream if the
    /// backend is ready.  A failed subscription leaves that channel
    /// unsubscribed; it recovers once its keep-alive window lapses.
    pub fn start(
        &mut self,
        now_ms: u64,
        net: &impl NetworkPort,
        backend: &impl BackendPort,
        sink: &mut impl EventSink,
    ) {
        self.supervisor.prime(net, backend);
        if self.supervisor.state().backend_ready {
            for sub in &mut self.subscriptions {
                let _ = sub.subscribe(now_ms, sink);
            }
        } else {
            info!("Backend not ready at start; streams open on first recovery");
        }

        sink.emit(&AppEvent::Started {
            channels: self.subscriptions.len(),
        });
    }

    // ── Per-tick orchestration ────────────────────────────────

    pub fn tick(
        &mut self,
        now_ms: u64,
        net: &mut impl NetworkPort,
        backend: &mut impl BackendPort,
        out: &mut impl OutputPort,
        sink: &mut impl EventSink,
    ) -> TickReport {
        self.tick_count += 1;

        // 1. Supervisor gate
        let readiness = self
            .supervisor
            .tick(now_ms, net, backend, &mut self.subscriptions, sink);
        let mut report = TickReport::new(readiness, self.supervisor.last_resubscribed());
        if readiness == Readiness::NotReady {
            return report;
        }

        // 2. Poll in table order
        for sub in &mut self.subscriptions {
            let channel = *sub.channel();
            match sub.poll(now_ms, sink) {
                PollOutcome::NewValue(raw) => match mapper::map(channel.kind, raw) {
                    Mapped::Command(cmd) => {
                        if let Some(driver) = self.drivers[channel.output.index()].as_mut() {
                            report.applied += usize::from(drive(driver, cmd, out, sink));
                        }
                    }
                    Mapped::Latch { dir, pressed } => {
                        self.latches[channel.output.index()].set(dir, pressed);
                    }
                },
                PollOutcome::TimedOut => {
                    report.timed_out += 1;
                    release(&mut self.latches[channel.output.index()], channel.kind);
                }
                PollOutcome::Errored(_) => {
                    report.errors += 1;
                    release(&mut self.latches[channel.output.index()], channel.kind);
                }
                PollOutcome::NoData => {}
            }
        }

        // 3. Step pass for latched direction pairs
        let units = self.config.legacy_step_units;
        for (driver, latch) in self.drivers.iter_mut().zip(self.latches) {
            let Some(driver) = driver.as_mut() else { continue };
            let TargetKind::Continuous(bounds) = driver.target().kind else {
                continue;
            };
            if let Some(cmd) = mapper::step(driver.position(), latch, units, bounds) {
                report.applied += usize::from(drive(driver, cmd, out, sink));
            }
        }

        report
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn connectivity(&self) -> ConnectivityState {
        self.supervisor.state()
    }

    pub fn supervisor(&self) -> &ConnectionSupervisor {
        &self.supervisor
    }

    pub fn subscriptions(&self) -> &[ChannelSubscription<S>] {
        &self.subscriptions
    }

    pub fn subscriptions_mut(&mut self) -> &mut [ChannelSubscription<S>] {
        &mut self.subscriptions
    }

    pub fn subscription(&self, path: &str) -> Option<&ChannelSubscription<S>> {
        self.subscriptions.iter().find(|s| s.channel().path == path)
    }

    pub fn driver(&self, output: OutputId) -> Option<&ActuatorDriver> {
        self.drivers[output.index()].as_ref()
    }

    /// Tracked position of `output` (`0`/`1` for binary outputs).
    pub fn position(&self, output: OutputId) -> Option<u8> {
        self.driver(output).map(ActuatorDriver::position)
    }

    /// Total ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}

/// A direction flag whose stream lapsed or failed no longer counts as
/// pressed; the output holds until the flag is heard again.
fn release(latch: &mut StepLatch, kind: ChannelKind) {
    if let ChannelKind::Direction(dir, _) = kind {
        latch.set(dir, false);
    }
}

fn drive(
    driver: &mut ActuatorDriver,
    cmd: ActuatorCommand,
    out: &mut impl OutputPort,
    sink: &mut impl EventSink,
) -> bool {
    let written = driver.apply(cmd, out);
    if written {
        sink.emit(&AppEvent::ActuatorDriven {
            output: driver.target().output,
            command: cmd,
        });
    }
    written
}
