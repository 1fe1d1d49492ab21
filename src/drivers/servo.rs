//! Hobby servo on a 50 Hz PWM channel.
//!
//! Angle 0-180° maps linearly onto a 500-2500 µs pulse inside the 20 ms
//! frame.  Generic over [`SetDutyCycle`], so the duty arithmetic is done
//! by the HAL against whatever resolution the timer was configured with.
//!
//! Bounds are enforced upstream by the actuator driver; this layer only
//! saturates at the mechanical 0-180° range.

use embedded_hal::pwm::SetDutyCycle;
use log::warn;

use crate::pins::SERVO_PWM_FREQ_HZ;

/// Pulse width at 0°.
pub const MIN_PULSE_US: u32 = 500;
/// Pulse width at 180°.
pub const MAX_PULSE_US: u32 = 2_500;
/// One PWM period.
pub const FRAME_US: u32 = 1_000_000 / SERVO_PWM_FREQ_HZ;

const MAX_ANGLE: u8 = 180;

/// Pulse width for `angle`, saturated at 180°.
pub fn pulse_us(angle: u8) -> u32 {
    let angle = angle.min(MAX_ANGLE) as u32;
    MIN_PULSE_US + (MAX_PULSE_US - MIN_PULSE_US) * angle / MAX_ANGLE as u32
}

pub struct Servo<P> {
    pwm: P,
    label: &'static str,
    angle: Option<u8>,
}

impl<P: SetDutyCycle> Servo<P> {
    /// The channel is not driven until the first [`write`](Self::write).
    pub fn new(pwm: P, label: &'static str) -> Self {
        Self {
            pwm,
            label,
            angle: None,
        }
    }

    pub fn write(&mut self, angle: u8) {
        let pulse = pulse_us(angle);
        match self.pwm.set_duty_cycle_fraction(pulse as u16, FRAME_US as u16) {
            Ok(()) => self.angle = Some(angle.min(MAX_ANGLE)),
            Err(e) => warn!("{}: duty update failed: {:?}", self.label, e),
        }
    }

    /// Last angle successfully written.
    pub fn angle(&self) -> Option<u8> {
        self.angle
    }

    pub fn label(&self) -> &'static str {
        self.label
    }
}
