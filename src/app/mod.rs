//! Application core — pure domain logic, zero platform I/O.
//!
//! This module contains the business rules for the shake alarm:
//! session lifecycle, detection, and siren control.  All interaction
//! with the device happens through **port traits** defined in [`ports`],
//! keeping this layer fully testable without real sensors or speakers.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
