//! System configuration parameters
//!
//! All tunable parameters for the synchronisation engine.  Defaults are
//! compiled in; a JSON override can be embedded at build time through the
//! `CATHOME_CONFIG` environment variable.  Nothing is persisted on the
//! device.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Realtime database host the firmware talks to.
pub const DEFAULT_DATABASE_URL: &str = "cat-automated-smart-home-default-rtdb.firebaseio.com";

/// How the camera's horizontal axis is commanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CameraControl {
    /// One channel carries an absolute angle, clamped to the axis bounds.
    AbsoluteAngle,
    /// Two "direction pressed" flags nudge the axis each tick (older web app).
    LegacyStepping,
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Backend ---
    /// RTDB host, without scheme.
    pub database_url: String,

    // --- Network ---
    pub wifi_ssid: String,
    pub wifi_password: String,
    /// Poll interval while waiting for the initial association (milliseconds)
    pub association_poll_ms: u32,

    // --- Timing ---
    /// Scheduler tick period (milliseconds)
    pub tick_interval_ms: u32,
    /// Startup backend bootstrap attempts before the scheduler starts anyway
    pub backend_bootstrap_attempts: u8,
    /// Delay between bootstrap attempts (milliseconds)
    pub backend_bootstrap_delay_ms: u32,
    /// A stream that stays silent this long is considered lapsed (milliseconds)
    pub stream_keepalive_timeout_ms: u32,
    /// First delay after a failed reassociation/reconnect (milliseconds)
    pub reconnect_backoff_initial_ms: u32,
    /// Upper bound for the reconnection backoff (milliseconds)
    pub reconnect_backoff_max_ms: u32,

    // --- Actuators ---
    /// Angle written to every servo at bring-up (0-180)
    pub servo_initial_angle: u8,
    /// Skip the physical write when the command equals the current position
    pub suppress_redundant_writes: bool,
    pub camera_control: CameraControl,
    /// Angular units per tick in [`CameraControl::LegacyStepping`]
    pub legacy_step_units: u8,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.into(),

            wifi_ssid: option_env!("WIFI_SSID").unwrap_or_default().into(),
            wifi_password: option_env!("WIFI_PASSWORD").unwrap_or_default().into(),
            association_poll_ms: 250,

            tick_interval_ms: 20,          // 50 Hz
            backend_bootstrap_attempts: 10,
            backend_bootstrap_delay_ms: 500,
            stream_keepalive_timeout_ms: 45_000, // server sends keep-alive every 30 s
            reconnect_backoff_initial_ms: 500,
            reconnect_backoff_max_ms: 30_000,

            servo_initial_angle: 90,
            suppress_redundant_writes: true,
            camera_control: CameraControl::AbsoluteAngle,
            legacy_step_units: 5,
        }
    }
}

/// Errors from loading or validating a [`SystemConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The override document is not valid JSON for this struct.
    Parse,
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse => write!(f, "config override is not valid JSON"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl core::error::Error for ConfigError {}

impl SystemConfig {
    /// Defaults with every field present in `json` overridden.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|_| ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the build-time configuration: defaults plus the optional
    /// `CATHOME_CONFIG` JSON override.
    pub fn load() -> Result<Self, ConfigError> {
        match option_env!("CATHOME_CONFIG") {
            Some(json) => Self::from_json(json),
            None => {
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_url.is_empty() {
            return Err(ConfigError::ValidationFailed("database_url is empty"));
        }
        if self.database_url.contains("://") {
            return Err(ConfigError::ValidationFailed("database_url must not include a scheme"));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("tick_interval_ms must be > 0"));
        }
        if self.backend_bootstrap_attempts == 0 {
            return Err(ConfigError::ValidationFailed("backend_bootstrap_attempts must be > 0"));
        }
        if self.stream_keepalive_timeout_ms <= self.tick_interval_ms {
            return Err(ConfigError::ValidationFailed(
                "stream_keepalive_timeout_ms must exceed tick_interval_ms",
            ));
        }
        if self.reconnect_backoff_initial_ms > self.reconnect_backoff_max_ms {
            return Err(ConfigError::ValidationFailed(
                "reconnect_backoff_initial_ms exceeds reconnect_backoff_max_ms",
            ));
        }
        if self.servo_initial_angle > 180 {
            return Err(ConfigError::ValidationFailed("servo_initial_angle must be 0-180"));
        }
        if self.legacy_step_units == 0 || self.legacy_step_units > 180 {
            return Err(ConfigError::ValidationFailed("legacy_step_units must be 1-180"));
        }
        Ok(())
    }
}
