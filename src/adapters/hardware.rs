//! Hardware adapter: bridges the output drivers to the [`OutputPort`].
//!
//! Owns both relays and all four servos.  This is the only module in the
//! system that turns an [`OutputId`] into a pin write.  Generic over the
//! embedded-hal pin and PWM types, so host tests run it over fakes.

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;
use log::{debug, warn};

use crate::app::channel::OutputId;
use crate::app::ports::OutputPort;
use crate::drivers::relay::Relay;
use crate::drivers::servo::Servo;

/// Servo slots in [`OutputId`] order, starting at `CameraX`.
const SERVO_BASE: usize = OutputId::CameraX.index();

pub struct HardwareAdapter<P, S> {
    heater: Relay<P>,
    sensor_relay: Relay<P>,
    servos: [Servo<S>; 4],
}

impl<P: OutputPin, S: SetDutyCycle> HardwareAdapter<P, S> {
    pub fn new(heater: Relay<P>, sensor_relay: Relay<P>, servos: [Servo<S>; 4]) -> Self {
        Self {
            heater,
            sensor_relay,
            servos,
        }
    }

    pub fn relay(&self, output: OutputId) -> Option<&Relay<P>> {
        match output {
            OutputId::Heater => Some(&self.heater),
            OutputId::SensorRelay => Some(&self.sensor_relay),
            _ => None,
        }
    }

    pub fn servo(&self, output: OutputId) -> Option<&Servo<S>> {
        output
            .index()
            .checked_sub(SERVO_BASE)
            .and_then(|i| self.servos.get(i))
    }
}

// ── OutputPort implementation ─────────────────────────────────

impl<P: OutputPin, S: SetDutyCycle> OutputPort for HardwareAdapter<P, S> {
    fn write_level(&mut self, output: OutputId, high: bool) {
        let relay = match output {
            OutputId::Heater => &mut self.heater,
            OutputId::SensorRelay => &mut self.sensor_relay,
            other => {
                warn!("{} is not a relay output", other.name());
                return;
            }
        };
        debug!("{} -> {}", relay.label(), if high { "HIGH" } else { "LOW" });
        relay.set(high);
    }

    fn write_angle(&mut self, output: OutputId, angle: u8) {
        let Some(servo) = output
            .index()
            .checked_sub(SERVO_BASE)
            .and_then(|i| self.servos.get_mut(i))
        else {
            warn!("{} is not a servo output", output.name());
            return;
        };
        debug!("{} -> {}°", servo.label(), angle);
        servo.write(angle);
    }
}
