//! Boot-time connectivity handshake.
//!
//! Runs once, before the tick loop:
//!
//! 1. [`associate_network`] retries association until the station is linked.
//! 2. [`bootstrap_backend`] makes a bounded number of readiness attempts.
//!
//! Neither step is fatal.  A backend that is still not ready after the
//! bootstrap is picked up by the supervisor on a later tick.

use log::{info, warn};

use crate::app::ports::{BackendPort, Clock, NetworkPort};

/// Block until the link is up.
///
/// Each round makes one association attempt and, if the link is still
/// down, sleeps `poll_ms`.  The driver does not retry a failed attempt on
/// its own, so attempts continue until one succeeds.
///
/// Returns the number of polls spent waiting.
pub fn associate_network(net: &mut impl NetworkPort, clock: &mut impl Clock, poll_ms: u32) -> u32 {
    let mut polls = 0u32;
    while !net.is_connected() {
        if polls == 0 {
            info!("Associating with access point...");
        }
        if let Err(e) = net.reconnect() {
            warn!("Association attempt {} failed: {}", polls + 1, e);
        }
        if net.is_connected() {
            break;
        }
        clock.sleep_ms(poll_ms);
        polls = polls.saturating_add(1);
    }
    info!("Network linked after {} poll(s)", polls);
    polls
}

/// Try up to `attempts` times to make the backend ready, `delay_ms` apart.
pub fn bootstrap_backend(
    backend: &mut impl BackendPort,
    clock: &mut impl Clock,
    attempts: u8,
    delay_ms: u32,
) -> bool {
    for attempt in 1..=attempts {
        if backend.is_ready() {
            break;
        }
        match backend.reconnect() {
            Ok(()) => {
                info!("Backend ready (attempt {}/{})", attempt, attempts);
                return true;
            }
            Err(e) => {
                warn!("Backend attempt {}/{} failed: {}", attempt, attempts, e);
                if attempt < attempts {
                    clock.sleep_ms(delay_ms);
                }
            }
        }
    }

    let ready = backend.is_ready();
    if !ready {
        warn!("Backend not ready after {} attempt(s); continuing", attempts);
    }
    ready
}
