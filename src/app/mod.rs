//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the rules for keeping the enclosure's outputs in
//! step with the realtime database: channel descriptors, value mapping,
//! per-channel subscriptions, connection supervision and actuator state.
//! All interaction with the radio, the backend and the pins happens
//! through **port traits** defined in [`ports`], keeping this layer fully
//! testable without real peripherals.

pub mod actuator;
pub mod channel;
pub mod events;
pub mod mapper;
pub mod ports;
pub mod service;
pub mod subscription;
pub mod supervisor;
