//! Unified error types for the shake-alarm core.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! controller's error handling uniform.  All variants are `Copy` so they
//! can be passed through the siren and state machine without allocation.
//!
//! None of these are fatal: the controller degrades to "no detection
//! capability" and keeps the host UI alive.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible platform interaction funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The motion sensor could not be used.
    Sensor(SensorError),
    /// The audio output failed.
    Audio(AudioError),
    /// The permission request could not be resolved.
    Permission(PermissionError),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Audio(e) => write!(f, "audio: {e}"),
            Self::Permission(e) => write!(f, "permission: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The device has no motion sensor.
    Unavailable,
    /// The platform refused the subscription.
    SubscribeFailed,
    /// The platform no longer knows the handle being released.
    UnknownHandle,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => write!(f, "motion sensor unavailable"),
            Self::SubscribeFailed => write!(f, "subscription refused"),
            Self::UnknownHandle => write!(f, "unknown subscription handle"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Audio errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioError {
    /// No audio context could be created on this device.
    ContextUnavailable,
    /// A graph node could not be allocated.
    NodeCreationFailed,
    /// Connecting or disconnecting graph nodes failed.
    ConnectFailed,
    /// A parameter automation event was rejected.
    ScheduleFailed,
    /// The node was already stopped or released by the device.
    AlreadyReleased,
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContextUnavailable => write!(f, "audio context unavailable"),
            Self::NodeCreationFailed => write!(f, "node creation failed"),
            Self::ConnectFailed => write!(f, "graph connect failed"),
            Self::ScheduleFailed => write!(f, "automation schedule failed"),
            Self::AlreadyReleased => write!(f, "node already released"),
        }
    }
}

impl From<AudioError> for Error {
    fn from(e: AudioError) -> Self {
        Self::Audio(e)
    }
}

// ---------------------------------------------------------------------------
// Permission errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionError {
    /// The platform request API raised an error.
    PlatformError,
}

impl fmt::Display for PermissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlatformError => write!(f, "platform request failed"),
        }
    }
}

impl From<PermissionError> for Error {
    fn from(e: PermissionError) -> Self {
        Self::Permission(e)
    }
}

impl From<crate::config::ConfigError> for Error {
    fn from(e: crate::config::ConfigError) -> Self {
        match e {
            crate::config::ConfigError::ValidationFailed(msg) => Self::Config(msg),
        }
    }
}
