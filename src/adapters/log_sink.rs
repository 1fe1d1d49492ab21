//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).
//! Failures log at `warn`, tagged with their [`SyncError`] class.
//! Transitions log at `info` and actuator writes at `debug`, so a 50 Hz
//! loop does not flood the console.

use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::mapper::ActuatorCommand;
use crate::app::ports::EventSink;
use crate::error::SyncError;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink {
    emitted: u64,
    failures: u64,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events logged since boot.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Events that carried a failure class.
    pub fn failures(&self) -> u64 {
        self.failures
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        self.emitted += 1;
        if let Some(class) = event.class() {
            self.failures += 1;
            log_failure(class, event);
            return;
        }
        match event {
            AppEvent::Started { channels } => {
                info!("START | {} channel(s)", channels);
            }
            AppEvent::NetworkRestored => info!("NET   | link restored"),
            AppEvent::BackendRestored => info!("RTDB  | backend ready"),
            AppEvent::Subscribed { path } => info!("SUB   | {} subscribed", path),
            AppEvent::ActuatorDriven { output, command } => match command {
                ActuatorCommand::Level(on) => {
                    debug!("OUT   | {} {}", output.name(), if *on { "ON" } else { "OFF" });
                }
                ActuatorCommand::Position(angle) => {
                    debug!("OUT   | {} {}°", output.name(), angle);
                }
            },
            _ => {}
        }
    }
}

fn log_failure(class: SyncError, event: &AppEvent) {
    match event {
        AppEvent::NetworkLost => warn!("NET   | link lost [{}]", class),
        AppEvent::ReassociationFailed => warn!("NET   | reassociation failed [{}]", class),
        AppEvent::BackendLost => warn!("RTDB  | backend lost [{}]", class),
        AppEvent::BackendReconnectFailed(reason) => {
            warn!("RTDB  | reconnect failed: {} [{}]", reason, class);
        }
        AppEvent::SubscriptionFailed { path, reason } => {
            warn!("SUB   | {} failed: {} [{}]", path, reason, class);
        }
        AppEvent::ChannelTimedOut { path } => {
            warn!("SUB   | {} timed out, resubscribing [{}]", path, class);
        }
        AppEvent::TransportError { path, reason } => {
            warn!("SUB   | {} stream error: {} [{}]", path, reason, class);
        }
        other => warn!("{:?} [{}]", other, class),
    }
}
