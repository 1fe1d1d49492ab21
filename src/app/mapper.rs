//! Raw value → actuator command mapping.
//!
//! Pure functions, no state.  The channel kind selects the rule:
//!
//! | Kind         | Raw            | Command                        |
//! |--------------|----------------|--------------------------------|
//! | `Binary`     | `1`            | `Level(true)`                  |
//! | `Binary`     | anything else  | `Level(false)`                 |
//! | `Continuous` | `r`            | `Position(clamp(r, min, max))` |
//! | `Direction`  | `1` / other    | latch pressed / released       |
//!
//! Out-of-range raw values are never rejected, only saturated or treated
//! as "off".

use super::channel::{Bounds, ChannelKind, StepDirection};

/// A validated command for one output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorCommand {
    /// Two-level output: `true` drives HIGH.
    Level(bool),
    /// Angular position, already inside the output's bounds.
    Position(u8),
}

/// Result of mapping one raw sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mapped {
    /// Drive the bound output with this command.
    Command(ActuatorCommand),
    /// Update a legacy direction latch; the output moves on the step pass.
    Latch { dir: StepDirection, pressed: bool },
}

/// Map a raw integer from the store for a channel of `kind`.
pub fn map(kind: ChannelKind, raw: i64) -> Mapped {
    match kind {
        ChannelKind::Binary => Mapped::Command(map_binary(raw)),
        ChannelKind::Continuous(bounds) => Mapped::Command(map_continuous(raw, bounds)),
        ChannelKind::Direction(dir, _) => Mapped::Latch { dir, pressed: raw == 1 },
    }
}

/// `1` is on; every other value, including negatives and values above one,
/// is off.
pub fn map_binary(raw: i64) -> ActuatorCommand {
    ActuatorCommand::Level(raw == 1)
}

pub fn map_continuous(raw: i64, bounds: Bounds) -> ActuatorCommand {
    ActuatorCommand::Position(bounds.clamp(raw))
}

// ───────────────────────────────────────────────────────────────
// Legacy stepping
// ───────────────────────────────────────────────────────────────

/// Latched state of a left/right flag pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepLatch {
    pub decrease: bool,
    pub increase: bool,
}

impl StepLatch {
    pub fn set(&mut self, dir: StepDirection, pressed: bool) {
        match dir {
            StepDirection::Decrease => self.decrease = pressed,
            StepDirection::Increase => self.increase = pressed,
        }
    }

    /// Direction to move this tick; both or neither pressed means hold.
    pub fn active(self) -> Option<StepDirection> {
        match (self.decrease, self.increase) {
            (true, false) => Some(StepDirection::Decrease),
            (false, true) => Some(StepDirection::Increase),
            _ => None,
        }
    }
}

/// Next position for a latched pair, or `None` when the output should
/// not be written (no direction, or already at the bound).
pub fn step(current: u8, latch: StepLatch, units: u8, bounds: Bounds) -> Option<ActuatorCommand> {
    let delta = match latch.active()? {
        StepDirection::Decrease => -(units as i64),
        StepDirection::Increase => units as i64,
    };
    let next = bounds.clamp(current as i64 + delta);
    (next != current).then_some(ActuatorCommand::Position(next))
}
