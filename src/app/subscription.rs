//! Per-channel streaming subscription.
//!
//! [`ChannelSubscription`] owns one [`RemoteChannel`], the
//! [`StreamSource`] feeding it, and the channel's runtime state.  Nothing
//! else mutates that state: the scheduler polls, the supervisor
//! resubscribes.
//!
//! ```text
//!                 begin ok                 read → value / nothing
//!  Unsubscribed ───────────▶ Subscribed ◀──────────────────────┐
//!       ▲                        │  │                           │
//!       │ begin failed           │  └───────────────────────────┘
//!       │                        │ keep-alive lapsed
//!       │                        ▼
//!       └──────────────────── TimedOut ──── resubscribe ok ──▶ Subscribed
//! ```

use crate::error::{Reason, StreamError};

use super::channel::RemoteChannel;
use super::events::AppEvent;
use super::ports::{EventSink, StreamSource};

/// Result of one [`ChannelSubscription::poll`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    NoData,
    NewValue(i64),
    TimedOut,
    Errored(Reason),
}

/// Mutable state owned by exactly one subscription.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelRuntimeState {
    /// Last sample received, if any.
    pub last_raw_value: Option<i64>,
    /// The stream's keep-alive lapsed and it has not been re-opened since.
    pub timed_out: bool,
    /// The stream is believed to be open.
    pub subscribed: bool,
}

/// Logical channel phase, derived from [`ChannelRuntimeState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelPhase {
    Unsubscribed,
    Subscribed,
    TimedOut,
}

impl ChannelRuntimeState {
    pub fn phase(&self) -> ChannelPhase {
        if self.timed_out {
            ChannelPhase::TimedOut
        } else if self.subscribed {
            ChannelPhase::Subscribed
        } else {
            ChannelPhase::Unsubscribed
        }
    }
}

pub struct ChannelSubscription<S> {
    channel: RemoteChannel,
    source: S,
    state: ChannelRuntimeState,
}

impl<S: StreamSource> ChannelSubscription<S> {
    /// Bind `source` to `channel`.  The stream is not opened yet.
    pub fn new(channel: RemoteChannel, source: S) -> Self {
        Self {
            channel,
            source,
            state: ChannelRuntimeState::default(),
        }
    }

    pub fn channel(&self) -> &RemoteChannel {
        &self.channel
    }

    pub fn state(&self) -> &ChannelRuntimeState {
        &self.state
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Whether the supervisor should try to re-open this stream.
    pub fn needs_resubscribe(&self) -> bool {
        self.state.timed_out && self.channel.policy.resubscribe_on_timeout
    }

    /// Open (or re-open) the stream.
    ///
    /// Success clears `timed_out`.  Failure leaves the channel unsubscribed
    /// and keeps `timed_out` as it was, so a lapsed channel is retried on
    /// the next ready tick.
    pub fn subscribe(&mut self, now_ms: u64, sink: &mut impl EventSink) -> Result<(), StreamError> {
        let path = self.channel.path;
        match self.source.begin(path, now_ms) {
            Ok(()) => {
                self.state.subscribed = true;
                self.state.timed_out = false;
                sink.emit(&AppEvent::Subscribed { path });
                Ok(())
            }
            Err(e) => {
                self.state.subscribed = false;
                sink.emit(&AppEvent::SubscriptionFailed {
                    path,
                    reason: e.reason.clone(),
                });
                Err(e)
            }
        }
    }

    /// Read the stream once.
    ///
    /// A timed-out channel keeps answering [`PollOutcome::TimedOut`] without
    /// touching the stream until it is resubscribed.
    pub fn poll(&mut self, now_ms: u64, sink: &mut impl EventSink) -> PollOutcome {
        if self.state.timed_out {
            return PollOutcome::TimedOut;
        }

        match self.source.read(now_ms) {
            Ok(Some(raw)) => {
                self.state.last_raw_value = Some(raw);
                PollOutcome::NewValue(raw)
            }
            Ok(None) => PollOutcome::NoData,
            Err(e) if e.is_timeout() => {
                self.state.timed_out = true;
                self.state.subscribed = false;
                sink.emit(&AppEvent::ChannelTimedOut { path: self.channel.path });
                PollOutcome::TimedOut
            }
            Err(e) => {
                if self.channel.policy.log_on_error {
                    sink.emit(&AppEvent::TransportError {
                        path: self.channel.path,
                        reason: e.reason.clone(),
                    });
                }
                PollOutcome::Errored(e.reason)
            }
        }
    }
}
