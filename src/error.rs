//! Unified error types for the synchronisation engine.
//!
//! [`SyncError`] is the taxonomy every failure in the per-tick path is
//! classified into.  None of them is fatal: the supervisor and the channel
//! subscriptions recover locally, and the top-level loop never sees an
//! `Err`.  Failure events are classified with
//! [`AppEvent::class`](crate::app::events::AppEvent::class).  Lower-level
//! errors ([`StreamError`], [`BackendError`]) carry a bounded reason string
//! for diagnostics.

use core::fmt;

/// Maximum length of a diagnostic reason string.
pub const REASON_LEN: usize = 64;

/// Bounded, heap-free diagnostic text.
pub type Reason = heapless::String<REASON_LEN>;

/// Build a [`Reason`] from arbitrary text, truncating on a char boundary.
pub fn reason(text: &str) -> Reason {
    let mut end = text.len().min(REASON_LEN);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let mut r = Reason::new();
    // Cannot fail: `end` is within capacity.
    let _ = r.push_str(&text[..end]);
    r
}

// ---------------------------------------------------------------------------
// Top-level taxonomy
// ---------------------------------------------------------------------------

/// Every failure the engine can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncError {
    /// The network link is down; the whole tick is skipped.
    NetworkDown,
    /// The link is up but the backend is not reachable/ready.
    BackendNotReady,
    /// A stream's keep-alive lapsed.
    ChannelTimeout,
    /// Any other stream transport failure.
    ChannelTransport,
    /// Opening (or re-opening) a stream failed.
    SubscriptionFailure,
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NetworkDown => write!(f, "network down"),
            Self::BackendNotReady => write!(f, "backend not ready"),
            Self::ChannelTimeout => write!(f, "channel keep-alive timeout"),
            Self::ChannelTransport => write!(f, "channel transport error"),
            Self::SubscriptionFailure => write!(f, "subscription failure"),
        }
    }
}

impl core::error::Error for SyncError {}

// ---------------------------------------------------------------------------
// Stream errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamErrorKind {
    /// Nothing (not even a keep-alive) arrived within the keep-alive window.
    Timeout,
    /// Connection reset, malformed event, server cancel, bad payload...
    Transport,
    /// The subscription request itself was refused or could not be sent.
    Subscribe,
}

/// Error reported by a [`StreamSource`](crate::app::ports::StreamSource).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamError {
    pub kind: StreamErrorKind,
    pub reason: Reason,
}

impl StreamError {
    pub fn timeout() -> Self {
        Self {
            kind: StreamErrorKind::Timeout,
            reason: reason("stream keep-alive lapsed"),
        }
    }

    pub fn transport(text: &str) -> Self {
        Self {
            kind: StreamErrorKind::Transport,
            reason: reason(text),
        }
    }

    pub fn subscribe(text: &str) -> Self {
        Self {
            kind: StreamErrorKind::Subscribe,
            reason: reason(text),
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == StreamErrorKind::Timeout
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            StreamErrorKind::Timeout => "timeout",
            StreamErrorKind::Transport => "transport",
            StreamErrorKind::Subscribe => "subscribe",
        };
        write!(f, "{kind}: {}", self.reason)
    }
}

impl core::error::Error for StreamError {}

// ---------------------------------------------------------------------------
// Backend errors
// ---------------------------------------------------------------------------

/// Errors from [`BackendPort`](crate::app::ports::BackendPort) operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The probe request could not be sent or no response came back.
    Unreachable(Reason),
    /// The backend answered with a non-success HTTP status.
    Status(u16),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreachable(why) => write!(f, "backend unreachable: {why}"),
            Self::Status(code) => write!(f, "backend answered HTTP {code}"),
        }
    }
}

impl core::error::Error for BackendError {}

// ---------------------------------------------------------------------------
// Network link errors
// ---------------------------------------------------------------------------

/// Errors from [`NetworkPort`](crate::app::ports::NetworkPort) operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
    AlreadyConnected,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => {
                write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)")
            }
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
            Self::AlreadyConnected => write!(f, "already connected to AP"),
        }
    }
}

impl core::error::Error for ConnectivityError {}
