//! Remote channel descriptors.
//!
//! A [`RemoteChannel`] binds one database path to one physical output and
//! carries the policy the engine applies to it.  Channels are plain data,
//! immutable after construction, and are always evaluated in the order of
//! the table they come from.

use crate::config::CameraControl;

// ───────────────────────────────────────────────────────────────
// Outputs
// ───────────────────────────────────────────────────────────────

/// Physical outputs driven by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OutputId {
    Heater = 0,
    SensorRelay = 1,
    CameraX = 2,
    CameraY = 3,
    LaserX = 4,
    LaserY = 5,
}

impl OutputId {
    /// Total number of outputs, used to size per-output arrays.
    pub const COUNT: usize = 6;

    pub const ALL: [OutputId; Self::COUNT] = [
        Self::Heater,
        Self::SensorRelay,
        Self::CameraX,
        Self::CameraY,
        Self::LaserX,
        Self::LaserY,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Heater => "heater",
            Self::SensorRelay => "sensor_relay",
            Self::CameraX => "camera_x",
            Self::CameraY => "camera_y",
            Self::LaserX => "laser_x",
            Self::LaserY => "laser_y",
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Channel kind and bounds
// ───────────────────────────────────────────────────────────────

/// Closed angular interval a continuous output is confined to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min: u8,
    pub max: u8,
}

impl Bounds {
    /// Full mechanical range of a hobby servo.
    pub const FULL: Bounds = Bounds { min: 0, max: 180 };
    /// Laser aim stays clear of the end-stops.
    pub const LASER: Bounds = Bounds { min: 10, max: 170 };

    pub const fn new(min: u8, max: u8) -> Self {
        Self { min, max }
    }

    /// Saturate `value` into `[min, max]`.
    pub fn clamp(self, value: i64) -> u8 {
        value.clamp(self.min as i64, self.max as i64) as u8
    }

    pub fn contains(self, value: u8) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Which way a legacy direction flag moves its axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDirection {
    Decrease,
    Increase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    /// Two-level output; `1` is on, anything else is off.
    Binary,
    /// Absolute angle, clamped into the bounds.
    Continuous(Bounds),
    /// Legacy "direction pressed" flag nudging a continuous output that
    /// stays within the bounds.
    Direction(StepDirection, Bounds),
}

impl ChannelKind {
    /// Bounds of the output this kind drives; binary outputs have none.
    pub fn bounds(self) -> Option<Bounds> {
        match self {
            Self::Binary => None,
            Self::Continuous(b) | Self::Direction(_, b) => Some(b),
        }
    }
}

/// Per-channel error policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelPolicy {
    /// Let the supervisor re-open the stream after its keep-alive lapses.
    pub resubscribe_on_timeout: bool,
    /// Surface transport errors to diagnostics.
    pub log_on_error: bool,
}

impl ChannelPolicy {
    /// Relay channels: recover and report.
    pub const BINARY: ChannelPolicy = ChannelPolicy {
        resubscribe_on_timeout: true,
        log_on_error: true,
    };
    /// Servo channels: recover quietly.
    pub const SERVO: ChannelPolicy = ChannelPolicy {
        resubscribe_on_timeout: true,
        log_on_error: false,
    };
}

// ───────────────────────────────────────────────────────────────
// RemoteChannel
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteChannel {
    /// Key into the remote store.
    pub path: &'static str,
    pub kind: ChannelKind,
    pub output: OutputId,
    pub policy: ChannelPolicy,
}

impl RemoteChannel {
    pub const fn binary(path: &'static str, output: OutputId) -> Self {
        Self {
            path,
            kind: ChannelKind::Binary,
            output,
            policy: ChannelPolicy::BINARY,
        }
    }

    pub const fn continuous(path: &'static str, output: OutputId, bounds: Bounds) -> Self {
        Self {
            path,
            kind: ChannelKind::Continuous(bounds),
            output,
            policy: ChannelPolicy::SERVO,
        }
    }

    pub const fn direction(
        path: &'static str,
        output: OutputId,
        dir: StepDirection,
        bounds: Bounds,
    ) -> Self {
        Self {
            path,
            kind: ChannelKind::Direction(dir, bounds),
            output,
            policy: ChannelPolicy::SERVO,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Channel tables
// ───────────────────────────────────────────────────────────────

pub const HEATING_PAD_PATH: &str = "/heating_pad/state";
pub const TEMPERATURE_SENSOR_PATH: &str = "/temperature_sensor/state";
pub const CAMERA_X_PATH: &str = "/camera_servo/x_angle";
pub const CAMERA_Y_PATH: &str = "/camera_servo/y_angle";
pub const LASER_X_PATH: &str = "/laser_servo/x_angle";
pub const LASER_Y_PATH: &str = "/laser_servo/y_angle";
pub const CAMERA_LEFT_PATH: &str = "/camera_servo/left";
pub const CAMERA_RIGHT_PATH: &str = "/camera_servo/right";

/// Absolute-angle table in evaluation order:
/// heater → sensor relay → camera axes → laser axes.
pub const CHANNELS: [RemoteChannel; 6] = [
    RemoteChannel::binary(HEATING_PAD_PATH, OutputId::Heater),
    RemoteChannel::binary(TEMPERATURE_SENSOR_PATH, OutputId::SensorRelay),
    RemoteChannel::continuous(CAMERA_X_PATH, OutputId::CameraX, Bounds::FULL),
    RemoteChannel::continuous(CAMERA_Y_PATH, OutputId::CameraY, Bounds::FULL),
    RemoteChannel::continuous(LASER_X_PATH, OutputId::LaserX, Bounds::LASER),
    RemoteChannel::continuous(LASER_Y_PATH, OutputId::LaserY, Bounds::LASER),
];

/// Legacy table: the camera x-axis is nudged by two direction flags
/// instead of following an absolute angle.
pub const LEGACY_CHANNELS: [RemoteChannel; 7] = [
    RemoteChannel::binary(HEATING_PAD_PATH, OutputId::Heater),
    RemoteChannel::binary(TEMPERATURE_SENSOR_PATH, OutputId::SensorRelay),
    RemoteChannel::direction(CAMERA_LEFT_PATH, OutputId::CameraX, StepDirection::Decrease, Bounds::FULL),
    RemoteChannel::direction(CAMERA_RIGHT_PATH, OutputId::CameraX, StepDirection::Increase, Bounds::FULL),
    RemoteChannel::continuous(CAMERA_Y_PATH, OutputId::CameraY, Bounds::FULL),
    RemoteChannel::continuous(LASER_X_PATH, OutputId::LaserX, Bounds::LASER),
    RemoteChannel::continuous(LASER_Y_PATH, OutputId::LaserY, Bounds::LASER),
];

/// Channel table for the configured camera control mode.
pub fn channel_table(mode: CameraControl) -> &'static [RemoteChannel] {
    match mode {
        CameraControl::AbsoluteAngle => &CHANNELS,
        CameraControl::LegacyStepping => &LEGACY_CHANNELS,
    }
}
