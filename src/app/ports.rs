//! Port traits — the hexagonal boundary between domain logic and the platform.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ SessionController (domain)
//! ```
//!
//! Driven adapters (motion sensor, permission prompt, audio output, event
//! sinks) implement these traits.  The
//! [`SessionController`](super::service::SessionController) consumes them
//! via generics, so the domain core never touches platform APIs directly.
//!
//! ## Failure contract
//!
//! - Every port error is typed and non-fatal.  The controller turns sensor
//!   and permission failures into "stay Idle", audio failures into a
//!   logged [`AlarmEvent::SirenFault`](super::events::AlarmEvent::SirenFault).
//! - Adapters must never panic on a repeated release (stop/unsubscribe of
//!   something already gone); they return an error instead.

use crate::config::Waveform;
use crate::error::{AudioError, PermissionError, SensorError};
use crate::sensors::permission::PermissionState;
use crate::sensors::sampler::SampleSender;

// ───────────────────────────────────────────────────────────────
// Motion sensor port (driven adapter: platform → domain)
// ───────────────────────────────────────────────────────────────

/// Opaque token identifying one live platform subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(pub u32);

/// Push-based motion-with-gravity stream.
///
/// The adapter keeps the [`SampleSender`] it was given and calls
/// [`SampleSender::deliver`] from the platform callback, in the
/// platform's temporal order.
pub trait MotionSensorPort {
    /// Whether the device has a motion sensor at all.
    fn is_available(&self) -> bool;

    /// Start delivering samples into `sender`.
    fn subscribe(&mut self, sender: SampleSender) -> Result<SubscriptionHandle, SensorError>;

    /// Stop delivering samples for `handle`.
    fn unsubscribe(&mut self, handle: SubscriptionHandle) -> Result<(), SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Permission port (driven adapter: platform ↔ domain)
// ───────────────────────────────────────────────────────────────

/// Platform capability check for motion-sensor access.
///
/// Two flavours exist: platforms without gating answer `Granted`
/// immediately, gated platforms suspend until the user answers a prompt.
/// Both are wrapped by [`PermissionGate`](crate::sensors::permission::PermissionGate),
/// which caches and coalesces requests.
#[allow(async_fn_in_trait)]
pub trait PermissionPort {
    /// `false` when the platform has no request API (implicitly granted).
    fn requires_request(&self) -> bool;

    /// Ask the platform.  Any answer other than `Granted` counts as denial.
    async fn request_permission(&self) -> Result<PermissionState, PermissionError>;
}

// ───────────────────────────────────────────────────────────────
// Audio port (driven adapter: domain → speaker)
// ───────────────────────────────────────────────────────────────

/// Opaque audio graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

/// Where a node's output is routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioTarget {
    Node(NodeId),
    Destination,
}

/// Minimal tone-synthesis graph: context, oscillators, gain nodes and
/// parameter automation on the audio clock.
pub trait AudioPort {
    /// Create the audio context.  Called at most once per subsystem lifetime.
    fn create_context(&mut self) -> Result<(), AudioError>;

    /// Whether the platform suspended the context (autoplay policies).
    fn is_suspended(&self) -> bool;

    /// Resume a suspended context.
    fn resume(&mut self) -> Result<(), AudioError>;

    /// Release the context and everything attached to it.
    fn close_context(&mut self) -> Result<(), AudioError>;

    /// Audio clock in seconds.
    fn current_time(&self) -> f64;

    fn create_oscillator(&mut self, waveform: Waveform, frequency_hz: f32) -> Result<NodeId, AudioError>;

    fn create_gain(&mut self, gain: f32) -> Result<NodeId, AudioError>;

    /// Jump the oscillator frequency to `hz` at clock time `at`.
    fn set_frequency_at(&mut self, oscillator: NodeId, hz: f32, at: f64) -> Result<(), AudioError>;

    /// Linearly ramp from the previous automation point to `hz`, arriving at `at`.
    fn ramp_frequency_to(&mut self, oscillator: NodeId, hz: f32, at: f64) -> Result<(), AudioError>;

    fn connect(&mut self, node: NodeId, target: AudioTarget) -> Result<(), AudioError>;

    fn disconnect(&mut self, node: NodeId) -> Result<(), AudioError>;

    fn start(&mut self, oscillator: NodeId) -> Result<(), AudioError>;

    fn stop(&mut self, oscillator: NodeId) -> Result<(), AudioError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / UI)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AlarmEvent`](super::events::AlarmEvent)s
/// through this port.  Adapters decide where they go (log, UI binding,
/// test recorder).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AlarmEvent);
}
