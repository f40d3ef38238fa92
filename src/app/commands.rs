//! Inbound commands to the session controller.
//!
//! These represent actions requested by the host UI (overlay buttons,
//! slider, dismissal) that the [`runtime`](crate::runtime) loop or the
//! [`SessionController`](super::service::SessionController) acts upon.

/// Commands the host UI can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionCommand {
    /// Arm monitoring (no-op unless Idle).
    Start,

    /// Disarm monitoring and silence the siren.
    Stop,

    /// Idle → Start, otherwise → Stop.
    ToggleActive,

    /// Silence a triggered alarm but keep monitoring.
    StopAlarm,

    /// Change the trigger threshold (honoured only while Idle).
    SetSensitivity(f32),

    /// The overlay was dismissed: tear everything down.
    Close,
}
