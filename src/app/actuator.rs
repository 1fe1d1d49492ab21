//! Actuator driver: owns the last commanded position of one output.
//!
//! The driver is the only place an [`ActuatorCommand`] turns into a
//! physical write.  It keeps `current_position` inside the declared
//! bounds at all times: a position outside them is clamped, never
//! rejected.
//!
//! With `suppress_redundant_writes` the physical write is skipped when the
//! command equals the current position; the bring-up write always happens
//! so the tracked position matches the hardware.

use log::warn;

use super::channel::{Bounds, OutputId};
use super::mapper::ActuatorCommand;
use super::ports::OutputPort;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Binary,
    Continuous(Bounds),
}

/// Last commanded state of one physical output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorTarget {
    pub output: OutputId,
    pub kind: TargetKind,
    /// `0`/`1` for binary outputs, an angle within bounds otherwise.
    pub current_position: u8,
}

pub struct ActuatorDriver {
    target: ActuatorTarget,
    suppress_redundant_writes: bool,
    writes: u32,
}

impl ActuatorDriver {
    /// Two-level output, initially LOW.
    pub fn binary(output: OutputId, suppress_redundant_writes: bool) -> Self {
        Self {
            target: ActuatorTarget {
                output,
                kind: TargetKind::Binary,
                current_position: 0,
            },
            suppress_redundant_writes,
            writes: 0,
        }
    }

    /// Continuous output starting at `initial`, clamped into `bounds`.
    pub fn continuous(output: OutputId, bounds: Bounds, initial: u8, suppress_redundant_writes: bool) -> Self {
        Self {
            target: ActuatorTarget {
                output,
                kind: TargetKind::Continuous(bounds),
                current_position: bounds.clamp(initial as i64),
            },
            suppress_redundant_writes,
            writes: 0,
        }
    }

    pub fn target(&self) -> &ActuatorTarget {
        &self.target
    }

    pub fn position(&self) -> u8 {
        self.target.current_position
    }

    /// Number of physical writes issued so far.
    pub fn write_count(&self) -> u32 {
        self.writes
    }

    /// Write the tracked position unconditionally (hardware bring-up).
    pub fn bring_up(&mut self, out: &mut impl OutputPort) {
        self.write(out);
    }

    /// Apply a command.  Returns `true` if the physical output was written.
    pub fn apply(&mut self, command: ActuatorCommand, out: &mut impl OutputPort) -> bool {
        let next = match (self.target.kind, command) {
            (TargetKind::Binary, ActuatorCommand::Level(on)) => u8::from(on),
            (TargetKind::Continuous(bounds), ActuatorCommand::Position(angle)) => {
                bounds.clamp(angle as i64)
            }
            (kind, cmd) => {
                warn!(
                    "{}: command {:?} does not fit a {:?} output, ignored",
                    self.target.output.name(),
                    cmd,
                    kind
                );
                return false;
            }
        };

        if self.suppress_redundant_writes && next == self.target.current_position {
            return false;
        }
        self.target.current_position = next;
        self.write(out);
        true
    }

    fn write(&mut self, out: &mut impl OutputPort) {
        let output = self.target.output;
        match self.target.kind {
            TargetKind::Binary => out.write_level(output, self.target.current_position == 1),
            TargetKind::Continuous(_) => out.write_angle(output, self.target.current_position),
        }
        self.writes = self.writes.wrapping_add(1);
    }
}
