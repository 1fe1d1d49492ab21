//! Integration tests for the SyncService → supervisor → subscriptions →
//! drivers pipeline.
//!
//! Every tick runs against mock adapters, so the full path from a value
//! arriving on a stream to a physical write is observable on the host.

use crate::mock_hw::{MockBackend, MockNetwork, MockOutputs, RecordingSink, ScriptedStream, Write};

use cathome::app::channel::{
    CAMERA_LEFT_PATH, CAMERA_RIGHT_PATH, CAMERA_X_PATH, CAMERA_Y_PATH, HEATING_PAD_PATH, LASER_X_PATH,
    OutputId, TEMPERATURE_SENSOR_PATH, channel_table,
};
use cathome::app::events::AppEvent;
use cathome::app::service::{SyncService, TickReport};
use cathome::app::subscription::ChannelPhase;
use cathome::app::supervisor::Readiness;
use cathome::config::{CameraControl, SystemConfig};
use cathome::error::SyncError;

const TICK_MS: u64 = 20;

struct Rig {
    svc: SyncService<ScriptedStream>,
    net: MockNetwork,
    backend: MockBackend,
    out: MockOutputs,
    sink: RecordingSink,
    now: u64,
}

impl Rig {
    fn with(config: SystemConfig, net: MockNetwork, backend: MockBackend) -> Self {
        let table = channel_table(config.camera_control);
        let mut svc = SyncService::new(config, table, |_| ScriptedStream::new());
        let mut out = MockOutputs::new();
        let mut sink = RecordingSink::new();
        svc.bring_up(&mut out);
        svc.start(0, &net, &backend, &mut sink);
        Self {
            svc,
            net,
            backend,
            out,
            sink,
            now: 0,
        }
    }

    /// Healthy rig with bring-up writes already cleared.
    fn ready() -> Self {
        Self::ready_with(SystemConfig::default())
    }

    fn ready_with(config: SystemConfig) -> Self {
        let mut rig = Self::with(config, MockNetwork::up(), MockBackend::ready());
        rig.out.clear();
        rig
    }

    fn tick(&mut self) -> TickReport {
        self.now += TICK_MS;
        self.svc
            .tick(self.now, &mut self.net, &mut self.backend, &mut self.out, &mut self.sink)
    }

    fn stream(&mut self, path: &str) -> &mut ScriptedStream {
        self.svc
            .subscriptions_mut()
            .iter_mut()
            .find(|s| s.channel().path == path)
            .map(|s| s.source_mut())
            .unwrap_or_else(|| panic!("no channel for {path}"))
    }

    fn begins(&self, path: &str) -> u32 {
        self.svc.subscription(path).map(|s| s.source().begins).unwrap_or(0)
    }
}

// ── Mapping scenarios ─────────────────────────────────────────

#[test]
fn heater_one_turns_heater_on() {
    let mut rig = Rig::ready();
    rig.stream(HEATING_PAD_PATH).push_value(1);

    let report = rig.tick();

    assert_eq!(report.readiness, Readiness::Ready);
    assert_eq!(report.applied, 1);
    assert_eq!(rig.out.writes, vec![Write::Level(OutputId::Heater, true)]);
    assert_eq!(rig.svc.position(OutputId::Heater), Some(1));
}

#[test]
fn heater_zero_turns_heater_off() {
    let mut rig = Rig::ready();
    rig.stream(HEATING_PAD_PATH).push_value(1);
    rig.tick();
    rig.stream(HEATING_PAD_PATH).push_value(0);
    rig.tick();

    assert_eq!(rig.out.last_for(OutputId::Heater), Some(Write::Level(OutputId::Heater, false)));
    assert_eq!(rig.svc.position(OutputId::Heater), Some(0));
}

#[test]
fn relay_treats_values_other_than_one_as_off() {
    let mut rig = Rig::ready();
    rig.stream(TEMPERATURE_SENSOR_PATH).push_value(1);
    rig.tick();
    rig.stream(TEMPERATURE_SENSOR_PATH).push_value(2);
    rig.tick();

    assert_eq!(
        rig.out.writes,
        vec![
            Write::Level(OutputId::SensorRelay, true),
            Write::Level(OutputId::SensorRelay, false),
        ]
    );
}

#[test]
fn camera_x_above_range_is_clamped_to_180() {
    let mut rig = Rig::ready();
    rig.stream(CAMERA_X_PATH).push_value(200);
    rig.tick();

    assert_eq!(rig.out.writes, vec![Write::Angle(OutputId::CameraX, 180)]);
    assert_eq!(rig.svc.position(OutputId::CameraX), Some(180));
}

#[test]
fn laser_x_below_range_is_clamped_to_10() {
    let mut rig = Rig::ready();
    rig.stream(LASER_X_PATH).push_value(5);
    rig.tick();

    assert_eq!(rig.out.writes, vec![Write::Angle(OutputId::LaserX, 10)]);
}

#[test]
fn channels_are_applied_in_table_order() {
    let mut rig = Rig::ready();
    rig.stream(LASER_X_PATH).push_value(100);
    rig.stream(HEATING_PAD_PATH).push_value(1);
    rig.stream(CAMERA_Y_PATH).push_value(30);
    rig.tick();

    assert_eq!(
        rig.out.writes,
        vec![
            Write::Level(OutputId::Heater, true),
            Write::Angle(OutputId::CameraY, 30),
            Write::Angle(OutputId::LaserX, 100),
        ]
    );
}

#[test]
fn one_value_per_channel_per_tick() {
    let mut rig = Rig::ready();
    rig.stream(CAMERA_Y_PATH).push_value(10);
    rig.stream(CAMERA_Y_PATH).push_value(20);

    rig.tick();
    assert_eq!(rig.out.writes, vec![Write::Angle(OutputId::CameraY, 10)]);
    rig.tick();
    assert_eq!(rig.out.last_for(OutputId::CameraY), Some(Write::Angle(OutputId::CameraY, 20)));
}

// ── Bring-up and write suppression ────────────────────────────

#[test]
fn bring_up_writes_every_output_once() {
    let rig = Rig::with(SystemConfig::default(), MockNetwork::up(), MockBackend::ready());

    assert_eq!(
        rig.out.writes,
        vec![
            Write::Level(OutputId::Heater, false),
            Write::Level(OutputId::SensorRelay, false),
            Write::Angle(OutputId::CameraX, 90),
            Write::Angle(OutputId::CameraY, 90),
            Write::Angle(OutputId::LaserX, 90),
            Write::Angle(OutputId::LaserY, 90),
        ]
    );
}

#[test]
fn repeated_value_is_not_rewritten() {
    let mut rig = Rig::ready();
    rig.stream(CAMERA_X_PATH).push_value(45);
    rig.tick();
    rig.stream(CAMERA_X_PATH).push_value(45);
    let report = rig.tick();

    assert_eq!(report.applied, 0);
    assert_eq!(rig.out.writes.len(), 1);
}

#[test]
fn repeated_value_is_rewritten_when_suppression_disabled() {
    let config = SystemConfig {
        suppress_redundant_writes: false,
        ..SystemConfig::default()
    };
    let mut rig = Rig::ready_with(config);
    rig.stream(HEATING_PAD_PATH).push_value(0);
    rig.tick();
    rig.stream(HEATING_PAD_PATH).push_value(0);
    rig.tick();

    assert_eq!(
        rig.out.writes,
        vec![Write::Level(OutputId::Heater, false), Write::Level(OutputId::Heater, false)]
    );
}

// ── Startup ───────────────────────────────────────────────────

#[test]
fn start_subscribes_every_channel_when_backend_ready() {
    let rig = Rig::ready();

    for sub in rig.svc.subscriptions() {
        assert_eq!(sub.source().begins, 1, "{}", sub.channel().path);
        assert_eq!(sub.state().phase(), ChannelPhase::Subscribed);
    }
    assert_eq!(rig.sink.events.last(), Some(&AppEvent::Started { channels: 6 }));
}

#[test]
fn start_with_backend_down_opens_nothing() {
    let rig = Rig::with(SystemConfig::default(), MockNetwork::up(), MockBackend::unreachable());

    for sub in rig.svc.subscriptions() {
        assert_eq!(sub.source().begins, 0);
        assert_eq!(sub.state().phase(), ChannelPhase::Unsubscribed);
    }
    assert!(!rig.svc.connectivity().backend_ready);
}

// ── Network loss ──────────────────────────────────────────────

#[test]
fn network_drop_blocks_writes_until_restored() {
    let mut rig = Rig::ready();
    assert_eq!(rig.tick().readiness, Readiness::Ready);

    rig.net.up = false;
    rig.net.reconnect_succeeds = false;
    rig.stream(HEATING_PAD_PATH).push_value(1);

    for _ in 0..5 {
        let report = rig.tick();
        assert_eq!(report.readiness, Readiness::NotReady);
        assert_eq!(report.applied, 0);
    }
    assert!(rig.out.writes.is_empty());
    assert_eq!(rig.stream(HEATING_PAD_PATH).reads.len(), 1, "no polls while not ready");
    assert!(rig.backend.invalidations >= 1);

    // Link returns; the backend must re-prove readiness first.
    rig.net.up = true;
    assert_eq!(rig.tick().readiness, Readiness::NotReady);
    assert!(rig.out.writes.is_empty());

    let report = rig.tick();
    assert_eq!(report.readiness, Readiness::Ready);
    assert_eq!(rig.out.writes, vec![Write::Level(OutputId::Heater, true)]);
}

#[test]
fn transition_events_fire_once_per_transition() {
    let mut rig = Rig::ready();
    rig.net.up = false;
    rig.net.reconnect_succeeds = false;
    for _ in 0..10 {
        rig.tick();
    }
    rig.net.up = true;
    rig.tick();
    rig.tick();

    assert_eq!(rig.sink.count(|e| *e == AppEvent::NetworkLost), 1);
    assert_eq!(rig.sink.count(|e| *e == AppEvent::NetworkRestored), 1);
    assert_eq!(rig.sink.count(|e| *e == AppEvent::BackendRestored), 1);
}

#[test]
fn reassociation_attempts_are_spaced_by_backoff() {
    let mut rig = Rig::ready();
    rig.net.up = false;
    rig.net.reconnect_succeeds = false;

    // 20 ticks of 20 ms cover 400 ms, inside the first 500 ms backoff.
    for _ in 0..20 {
        rig.tick();
    }
    assert_eq!(rig.net.reconnect_calls, 1);

    // Past the window a second attempt is made.
    for _ in 0..10 {
        rig.tick();
    }
    assert_eq!(rig.net.reconnect_calls, 2);
}

// ── Backend loss ──────────────────────────────────────────────

#[test]
fn backend_loss_blocks_writes_and_reports_once() {
    let mut rig = Rig::ready();
    rig.backend.ready = false;
    rig.backend.reconnect_succeeds = false;
    rig.stream(CAMERA_Y_PATH).push_value(12);

    for _ in 0..5 {
        assert_eq!(rig.tick().readiness, Readiness::NotReady);
    }
    assert!(rig.out.writes.is_empty());
    assert_eq!(rig.sink.count(|e| *e == AppEvent::BackendLost), 1);
    assert!(rig.sink.count(|e| matches!(e, AppEvent::BackendReconnectFailed(_))) >= 1);

    rig.backend.reconnect_succeeds = true;
    // Eventually the backoff allows an attempt which succeeds.
    let mut ready_at = None;
    for i in 0..100 {
        if rig.tick().readiness == Readiness::Ready {
            ready_at = Some(i);
            break;
        }
    }
    assert!(ready_at.is_some(), "backend never recovered");
    assert_eq!(rig.out.writes, vec![Write::Angle(OutputId::CameraY, 12)]);
}

// ── Timeouts and resubscription ───────────────────────────────

#[test]
fn lapsed_channel_is_resubscribed_and_resumes() {
    let mut rig = Rig::ready();
    rig.stream(CAMERA_X_PATH).push_timeout();

    let report = rig.tick();
    assert_eq!(report.timed_out, 1);
    assert_eq!(report.resubscribed, 0);
    assert!(rig.svc.subscription(CAMERA_X_PATH).is_some_and(|s| s.state().timed_out));

    rig.stream(CAMERA_X_PATH).push_value(45);
    let report = rig.tick();
    assert_eq!(report.resubscribed, 1);
    assert_eq!(rig.begins(CAMERA_X_PATH), 2);
    assert_eq!(rig.out.writes, vec![Write::Angle(OutputId::CameraX, 45)]);
    assert_eq!(
        rig.svc.subscription(CAMERA_X_PATH).map(|s| s.state().phase()),
        Some(ChannelPhase::Subscribed)
    );
}

#[test]
fn timed_out_channel_is_not_read_until_resubscribed() {
    let mut rig = Rig::ready();
    rig.backend.ready = true;
    rig.stream(LASER_X_PATH).push_timeout();
    rig.tick();
    let reads_after_timeout = rig.stream(LASER_X_PATH).read_calls;

    // Backend drops: no resubscribe, no reads.
    rig.backend.ready = false;
    rig.backend.reconnect_succeeds = false;
    for _ in 0..5 {
        rig.tick();
    }
    assert_eq!(rig.begins(LASER_X_PATH), 1);
    assert_eq!(rig.stream(LASER_X_PATH).read_calls, reads_after_timeout);

    rig.backend.ready = true;
    rig.tick();
    assert_eq!(rig.begins(LASER_X_PATH), 2);
}

#[test]
fn healthy_channels_are_never_resubscribed() {
    let mut rig = Rig::ready();
    rig.stream(HEATING_PAD_PATH).push_timeout();
    for _ in 0..20 {
        rig.tick();
    }

    for sub in rig.svc.subscriptions() {
        let expected = if sub.channel().path == HEATING_PAD_PATH { 2 } else { 1 };
        assert_eq!(sub.source().begins, expected, "{}", sub.channel().path);
    }
}

#[test]
fn failed_resubscribe_is_retried_next_ready_tick() {
    let mut rig = Rig::ready();
    rig.stream(CAMERA_Y_PATH).push_timeout();
    rig.tick();

    rig.stream(CAMERA_Y_PATH).begin_fails = true;
    rig.tick();
    rig.tick();
    assert_eq!(rig.begins(CAMERA_Y_PATH), 3);
    assert!(rig.svc.subscription(CAMERA_Y_PATH).is_some_and(|s| s.state().timed_out));
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::SubscriptionFailed { path, .. } if *path == CAMERA_Y_PATH)),
        2
    );

    rig.stream(CAMERA_Y_PATH).begin_fails = false;
    rig.tick();
    assert_eq!(rig.begins(CAMERA_Y_PATH), 4);
    assert!(rig.svc.subscription(CAMERA_Y_PATH).is_some_and(|s| !s.state().timed_out));
}

#[test]
fn transport_error_does_not_resubscribe() {
    let mut rig = Rig::ready();
    rig.stream(HEATING_PAD_PATH).push_error("connection reset");
    rig.stream(CAMERA_X_PATH).push_error("connection reset");

    let report = rig.tick();
    assert_eq!(report.errors, 2);
    for _ in 0..5 {
        assert_eq!(rig.tick().resubscribed, 0);
    }
    assert_eq!(rig.begins(HEATING_PAD_PATH), 1);
    assert_eq!(rig.begins(CAMERA_X_PATH), 1);

    // Relays report transport errors, servos stay quiet.
    let reported: Vec<&str> = rig
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::TransportError { path, .. } => Some(*path),
            _ => None,
        })
        .collect();
    assert_eq!(reported, vec![HEATING_PAD_PATH]);
}

// ── Legacy stepping ───────────────────────────────────────────

#[test]
fn legacy_direction_flags_step_camera_x() {
    let config = SystemConfig {
        camera_control: CameraControl::LegacyStepping,
        ..SystemConfig::default()
    };
    let mut rig = Rig::ready_with(config);

    rig.stream(CAMERA_RIGHT_PATH).push_value(1);
    rig.tick();
    assert_eq!(rig.svc.position(OutputId::CameraX), Some(95));

    // Latched: keeps moving while held.
    rig.tick();
    assert_eq!(rig.svc.position(OutputId::CameraX), Some(100));

    rig.stream(CAMERA_RIGHT_PATH).push_value(0);
    rig.tick();
    assert_eq!(rig.svc.position(OutputId::CameraX), Some(100));

    rig.stream(CAMERA_LEFT_PATH).push_value(1);
    rig.tick();
    assert_eq!(rig.svc.position(OutputId::CameraX), Some(95));

    assert_eq!(
        rig.out.writes,
        vec![
            Write::Angle(OutputId::CameraX, 95),
            Write::Angle(OutputId::CameraX, 100),
            Write::Angle(OutputId::CameraX, 95),
        ]
    );
}

#[test]
fn legacy_both_flags_pressed_holds_position() {
    let config = SystemConfig {
        camera_control: CameraControl::LegacyStepping,
        ..SystemConfig::default()
    };
    let mut rig = Rig::ready_with(config);
    rig.stream(CAMERA_LEFT_PATH).push_value(1);
    rig.stream(CAMERA_RIGHT_PATH).push_value(1);
    rig.tick();
    rig.tick();

    assert_eq!(rig.svc.position(OutputId::CameraX), Some(90));
    assert!(rig.out.writes.is_empty());
}

#[test]
fn legacy_axis_holds_while_direction_channel_is_timed_out() {
    let config = SystemConfig {
        camera_control: CameraControl::LegacyStepping,
        ..SystemConfig::default()
    };
    let mut rig = Rig::ready_with(config);
    rig.stream(CAMERA_RIGHT_PATH).push_value(1);
    rig.tick();
    assert_eq!(rig.svc.position(OutputId::CameraX), Some(95));
    rig.out.clear();

    rig.stream(CAMERA_RIGHT_PATH).push_timeout();
    rig.stream(CAMERA_RIGHT_PATH).begin_fails = true;
    for _ in 0..5 {
        let report = rig.tick();
        assert_eq!(report.applied, 0);
    }
    assert!(rig.out.writes.is_empty(), "camera_x moved during outage: {:?}", rig.out.writes);
    assert_eq!(rig.svc.position(OutputId::CameraX), Some(95));

    // Back online: the flag must be heard again before stepping resumes.
    rig.stream(CAMERA_RIGHT_PATH).begin_fails = false;
    rig.tick();
    assert!(rig.out.writes.is_empty());
    rig.stream(CAMERA_RIGHT_PATH).push_value(1);
    rig.tick();
    assert_eq!(rig.out.writes, vec![Write::Angle(OutputId::CameraX, 100)]);
}

#[test]
fn legacy_axis_holds_after_direction_channel_error() {
    let config = SystemConfig {
        camera_control: CameraControl::LegacyStepping,
        ..SystemConfig::default()
    };
    let mut rig = Rig::ready_with(config);
    rig.stream(CAMERA_LEFT_PATH).push_value(1);
    rig.tick();
    rig.stream(CAMERA_LEFT_PATH).push_error("connection reset");
    rig.tick();
    rig.tick();

    assert_eq!(rig.out.writes, vec![Write::Angle(OutputId::CameraX, 85)]);
}

#[test]
fn failure_events_are_classified() {
    let mut rig = Rig::ready();
    rig.stream(CAMERA_Y_PATH).push_timeout();
    rig.tick();
    rig.net.up = false;
    rig.net.reconnect_succeeds = false;
    rig.tick();

    let classes: Vec<SyncError> = rig.sink.events.iter().filter_map(AppEvent::class).collect();
    assert_eq!(
        classes,
        vec![SyncError::ChannelTimeout, SyncError::NetworkDown, SyncError::NetworkDown]
    );
}
