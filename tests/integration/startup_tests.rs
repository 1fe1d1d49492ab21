//! Boot-time handshake: network association and backend bootstrap.

use std::cell::Cell;

use crate::mock_hw::{ManualClock, MockBackend, MockNetwork};

use cathome::adapters::wifi::{WifiAdapter, WifiState};
use cathome::app::ports::NetworkPort;
use cathome::error::ConnectivityError;
use cathome::startup::{associate_network, bootstrap_backend};

/// Link that comes up on the `up_at`-th status check.
struct LateLink {
    checks: Cell<u32>,
    up_at: u32,
    attempts: u32,
}

impl NetworkPort for LateLink {
    fn is_connected(&self) -> bool {
        self.checks.set(self.checks.get() + 1);
        self.checks.get() >= self.up_at
    }

    fn reconnect(&mut self) -> Result<(), ConnectivityError> {
        self.attempts += 1;
        Err(ConnectivityError::ConnectionFailed)
    }
}

#[test]
fn linked_network_needs_no_polls() {
    let mut net = MockNetwork::up();
    let mut clock = ManualClock::default();

    assert_eq!(associate_network(&mut net, &mut clock, 250), 0);
    assert_eq!(net.reconnect_calls, 0);
    assert!(clock.sleeps.is_empty());
}

#[test]
fn association_attempt_is_made_when_down() {
    let mut net = MockNetwork::down();
    net.reconnect_succeeds = true;
    let mut clock = ManualClock::default();

    assert_eq!(associate_network(&mut net, &mut clock, 250), 0);
    assert_eq!(net.reconnect_calls, 1);
}

#[test]
fn association_polls_until_linked() {
    let mut net = LateLink {
        checks: Cell::new(0),
        up_at: 6,
        attempts: 0,
    };
    let mut clock = ManualClock::default();

    assert_eq!(associate_network(&mut net, &mut clock, 250), 2);
    assert_eq!(clock.sleeps, vec![250, 250]);
    assert_eq!(net.attempts, 3, "one association attempt per round");
}

#[test]
fn failed_first_association_is_retried() {
    let mut wifi = WifiAdapter::new();
    assert!(wifi.set_credentials("CatHome", "whiskers1").is_ok());
    wifi.sim_fail_next(1);
    let mut clock = ManualClock::default();

    assert_eq!(associate_network(&mut wifi, &mut clock, 250), 1);
    assert!(wifi.is_connected());
    assert_eq!(wifi.state(), WifiState::Connected);
}

#[test]
fn association_keeps_trying_through_repeated_failures() {
    let mut wifi = WifiAdapter::new();
    assert!(wifi.set_credentials("CatHome", "whiskers1").is_ok());
    wifi.sim_fail_next(5);
    let mut clock = ManualClock::default();

    assert_eq!(associate_network(&mut wifi, &mut clock, 100), 5);
    assert_eq!(clock.sleeps, vec![100; 5]);
    assert!(wifi.is_connected());
}

#[test]
fn ready_backend_is_not_reprobed() {
    let mut backend = MockBackend::ready();
    let mut clock = ManualClock::default();

    assert!(bootstrap_backend(&mut backend, &mut clock, 10, 500));
    assert_eq!(backend.reconnect_calls, 0);
}

#[test]
fn bootstrap_stops_at_first_success() {
    let mut backend = MockBackend::unreachable();
    backend.reconnect_succeeds = true;
    let mut clock = ManualClock::default();

    assert!(bootstrap_backend(&mut backend, &mut clock, 10, 500));
    assert_eq!(backend.reconnect_calls, 1);
    assert!(clock.sleeps.is_empty());
}

#[test]
fn bootstrap_gives_up_after_bounded_attempts() {
    let mut backend = MockBackend::unreachable();
    let mut clock = ManualClock::default();

    assert!(!bootstrap_backend(&mut backend, &mut clock, 3, 500));
    assert_eq!(backend.reconnect_calls, 3);
    assert_eq!(clock.sleeps, vec![500, 500]);
}
