//! Outbound application events.
//!
//! The [`SessionController`](super::service::SessionController) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on the
//! other side decide what to do with them: the log sink prints them, the
//! test sink records them.

use crate::config::Sensitivity;
use crate::error::AudioError;
use crate::fsm::AlarmState;
use crate::sensors::permission::PermissionState;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AlarmEvent {
    /// Periodic display snapshot.
    Telemetry(MotionTelemetry),

    /// The state machine moved between states.
    StateChanged { from: AlarmState, to: AlarmState },

    /// A sample crossed the threshold while Armed.
    Triggered { motion: f32, sensitivity: Sensitivity },

    /// The permission request resolved to anything but Granted.
    PermissionDenied,

    /// No motion sensor, or the platform refused the subscription.
    SensorUnavailable,

    /// A start was resolved after the session was stopped or closed.
    StartDiscarded,

    /// Threshold updated while Idle.
    SensitivityChanged(Sensitivity),

    /// Threshold update refused (not Idle, or invalid value).
    SensitivityRejected { requested: f32, state: AlarmState },

    /// The siren could not be built or torn down cleanly.
    SirenFault(AudioError),
}

/// A point-in-time snapshot suitable for the overlay or a log line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionTelemetry {
    pub state: AlarmState,
    /// Smoothed display magnitude.
    pub current_motion: f32,
    /// Instantaneous motion of the latest sample.
    pub last_motion: f32,
    pub sensitivity: Sensitivity,
    pub permission: PermissionState,
    pub samples_processed: u64,
    pub trigger_count: u32,
    pub dropped_samples: u32,
    pub siren_sounding: bool,
}
