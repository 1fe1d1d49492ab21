//! Outbound application events.
//!
//! The sync engine emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.

use crate::error::{Reason, SyncError};

use super::channel::OutputId;
use super::mapper::ActuatorCommand;

/// Structured events emitted by the sync engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The service finished bring-up; carries the number of channels.
    Started { channels: usize },

    // ── Connectivity ──────────────────────────────────────────
    /// The network link dropped.
    NetworkLost,
    /// A reassociation attempt failed.
    ReassociationFailed,
    /// The network link is back.
    NetworkRestored,
    /// The link is up but the backend is not ready.
    BackendLost,
    /// A backend reconnect attempt failed.
    BackendReconnectFailed(Reason),
    /// The backend is ready again.
    BackendRestored,

    // ── Channels ──────────────────────────────────────────────
    /// A stream was opened (at startup or on resubscribe).
    Subscribed { path: &'static str },
    /// Opening a stream failed; the channel stays unsubscribed.
    SubscriptionFailed { path: &'static str, reason: Reason },
    /// A stream's keep-alive lapsed; it will be resubscribed.
    ChannelTimedOut { path: &'static str },
    /// A stream reported a transport error (only for channels whose
    /// policy asks for it).
    TransportError { path: &'static str, reason: Reason },

    // ── Actuators ─────────────────────────────────────────────
    /// A command reached the physical output.
    ActuatorDriven { output: OutputId, command: ActuatorCommand },
}

impl AppEvent {
    /// Failure class of this event, `None` for non-failures.
    pub fn class(&self) -> Option<SyncError> {
        match self {
            Self::NetworkLost | Self::ReassociationFailed => Some(SyncError::NetworkDown),
            Self::BackendLost | Self::BackendReconnectFailed(_) => Some(SyncError::BackendNotReady),
            Self::ChannelTimedOut { .. } => Some(SyncError::ChannelTimeout),
            Self::TransportError { .. } => Some(SyncError::ChannelTransport),
            Self::SubscriptionFailed { .. } => Some(SyncError::SubscriptionFailure),
            Self::Started { .. }
            | Self::NetworkRestored
            | Self::BackendRestored
            | Self::Subscribed { .. }
            | Self::ActuatorDriven { .. } => None,
        }
    }
}
