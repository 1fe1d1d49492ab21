//! Two-level relay output (heating pad, sensor supply).
//!
//! Generic over [`OutputPin`] so the same driver runs on an ESP-IDF
//! `PinDriver` on target and on a recording mock on the host.  Active
//! HIGH: `true` energises the relay.

use embedded_hal::digital::OutputPin;
use log::warn;

pub struct Relay<P> {
    pin: P,
    label: &'static str,
    energised: bool,
}

impl<P: OutputPin> Relay<P> {
    pub fn new(pin: P, label: &'static str) -> Self {
        Self {
            pin,
            label,
            energised: false,
        }
    }

    /// Drive the pin.  A failed write is logged and the previous state kept.
    pub fn set(&mut self, on: bool) {
        let result = if on { self.pin.set_high() } else { self.pin.set_low() };
        match result {
            Ok(()) => self.energised = on,
            Err(e) => warn!("{}: pin write failed: {:?}", self.label, e),
        }
    }

    pub fn is_on(&self) -> bool {
        self.energised
    }

    pub fn label(&self) -> &'static str {
        self.label
    }
}
