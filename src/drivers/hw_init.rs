//! One-shot output bring-up.
//!
//! Claims the two relay GPIOs and four LEDC channels on a shared 50 Hz
//! timer, wraps them in [`Relay`]/[`Servo`] drivers and hands them to a
//! [`HardwareAdapter`].  Called once from `main()` before the tick loop.

use crate::adapters::hardware::HardwareAdapter;
use crate::drivers::relay::Relay;
use crate::drivers::servo::Servo;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    LedcTimerFailed(i32),
    LedcChannelFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "relay GPIO config failed (rc={})", rc),
            Self::LedcTimerFailed(rc) => write!(f, "servo LEDC timer config failed (rc={})", rc),
            Self::LedcChannelFailed(rc) => write!(f, "servo LEDC channel config failed (rc={})", rc),
        }
    }
}

impl std::error::Error for HwInitError {}

/// Build the adapter from already-configured pins.
pub fn assemble<P, S>(heater: P, sensor: P, servos: [S; 4]) -> HardwareAdapter<P, S>
where
    P: embedded_hal::digital::OutputPin,
    S: embedded_hal::pwm::SetDutyCycle,
{
    let [camera_x, camera_y, laser_x, laser_y] = servos;
    HardwareAdapter::new(
        Relay::new(heater, "heater"),
        Relay::new(sensor, "sensor_relay"),
        [
            Servo::new(camera_x, "camera_x"),
            Servo::new(camera_y, "camera_y"),
            Servo::new(laser_x, "laser_x"),
            Servo::new(laser_y, "laser_y"),
        ],
    )
}

// ── ESP-IDF ───────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub use esp::*;

#[cfg(target_os = "espidf")]
mod esp {
    use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};
    use esp_idf_hal::ledc::config::TimerConfig;
    use esp_idf_hal::ledc::{
        CHANNEL0, CHANNEL1, CHANNEL2, CHANNEL3, LedcDriver, LedcTimer, LedcTimerDriver, Resolution,
    };
    use esp_idf_hal::units::FromValueType;
    use log::info;

    use super::{HwInitError, assemble};
    use crate::adapters::hardware::HardwareAdapter;
    use crate::pins;

    pub type EspRelayPin<'d> = PinDriver<'d, AnyOutputPin, Output>;
    pub type EspHardware<'d> = HardwareAdapter<EspRelayPin<'d>, LedcDriver<'d>>;

    /// LEDC channels reserved for the four servos.
    pub struct ServoChannels {
        pub camera_x: CHANNEL0,
        pub camera_y: CHANNEL1,
        pub laser_x: CHANNEL2,
        pub laser_y: CHANNEL3,
    }

    const SERVO_RESOLUTION: Resolution = match pins::SERVO_PWM_RESOLUTION_BITS {
        10 => Resolution::Bits10,
        11 => Resolution::Bits11,
        12 => Resolution::Bits12,
        13 => Resolution::Bits13,
        14 => Resolution::Bits14,
        _ => panic!("unsupported servo timer resolution"),
    };

    /// Configure the shared servo timer (50 Hz, 14-bit).
    pub fn servo_timer<'d, T: LedcTimer + 'd>(timer: T) -> Result<LedcTimerDriver<'d, T>, HwInitError> {
        let config = TimerConfig::default()
            .frequency(pins::SERVO_PWM_FREQ_HZ.Hz().into())
            .resolution(SERVO_RESOLUTION);
        LedcTimerDriver::new(timer, &config).map_err(|e| HwInitError::LedcTimerFailed(e.code()))
    }

    pub fn init_outputs<'d, T: LedcTimer + 'd>(
        channels: ServoChannels,
        timer: &'d LedcTimerDriver<'d, T>,
    ) -> Result<EspHardware<'d>, HwInitError> {
        let relay = |gpio: i32| {
            // SAFETY: each GPIO number comes from `pins` and is claimed once,
            // here, before any other driver exists.
            let pin = unsafe { AnyOutputPin::new(gpio) };
            PinDriver::output(pin).map_err(|e| HwInitError::GpioConfigFailed(e.code()))
        };
        let heater = relay(pins::HEATING_PAD_GPIO)?;
        let sensor = relay(pins::TEMPERATURE_SENSOR_GPIO)?;

        let servo_err = |e: esp_idf_hal::sys::EspError| HwInitError::LedcChannelFailed(e.code());
        // SAFETY: as above, servo GPIOs are claimed exactly once.
        let (cx, cy, lx, ly) = unsafe {
            (
                AnyOutputPin::new(pins::CAMERA_X_SERVO_GPIO),
                AnyOutputPin::new(pins::CAMERA_Y_SERVO_GPIO),
                AnyOutputPin::new(pins::LASER_X_SERVO_GPIO),
                AnyOutputPin::new(pins::LASER_Y_SERVO_GPIO),
            )
        };
        let servos = [
            LedcDriver::new(channels.camera_x, timer, cx).map_err(servo_err)?,
            LedcDriver::new(channels.camera_y, timer, cy).map_err(servo_err)?,
            LedcDriver::new(channels.laser_x, timer, lx).map_err(servo_err)?,
            LedcDriver::new(channels.laser_y, timer, ly).map_err(servo_err)?,
        ];

        info!("hw_init: relays on GPIO {}/{}, servos on LEDC CH0-3", pins::HEATING_PAD_GPIO, pins::TEMPERATURE_SENSOR_GPIO);
        Ok(assemble(heater, sensor, servos))
    }
}
