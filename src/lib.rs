//! Shake detection and alarm core.
//!
//! Watches the device accelerometer while the user has armed monitoring,
//! converts raw readings into a motion magnitude, compares it against a
//! user-chosen sensitivity and sounds a swept siren when exceeded.  All
//! platform access (motion events, permission prompts, audio output)
//! goes through the port traits in [`app::ports`].

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod fsm;
pub mod runtime;

pub mod adapters;
pub mod drivers;
pub mod sensors;
