//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct that state handlers read from and
//! write to.  It contains the latest processed motion reading, the active
//! threshold, sample counters and the subsystem commands the controller
//! applies after each transition.  Think of it as the "blackboard" in a
//! blackboard architecture.

use crate::config::Sensitivity;
use crate::sensors::processor::MotionReading;

// ---------------------------------------------------------------------------
// Subsystem commands (written by state handlers; applied by the controller)
// ---------------------------------------------------------------------------

/// What the state handlers want the outside world to be doing.
///
/// The controller reconciles the sampler subscription and the siren with
/// these flags after every tick or forced transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubsystemCommands {
    /// Motion subscription should be live.
    pub sampling: bool,
    /// Siren should be sounding.
    pub siren: bool,
}

impl SubsystemCommands {
    /// Nothing running.
    pub fn all_off() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
#[derive(Debug, Clone)]
pub struct FsmContext {
    // -- Timing --
    /// Samples processed since the current state was entered.
    pub samples_in_state: u64,
    /// Samples processed since construction.
    pub total_samples: u64,

    // -- Motion --
    /// Latest processed reading.  Updated before each FSM tick.
    pub reading: MotionReading,
    /// Trigger threshold.  Only changes while Idle.
    pub sensitivity: Sensitivity,
    /// Motion of the sample that last latched the alarm.
    pub trigger_motion: Option<f32>,

    // -- Outputs --
    pub commands: SubsystemCommands,
}

impl FsmContext {
    pub fn new(sensitivity: Sensitivity) -> Self {
        Self {
            samples_in_state: 0,
            total_samples: 0,
            reading: MotionReading::default(),
            sensitivity,
            trigger_motion: None,
            commands: SubsystemCommands::all_off(),
        }
    }
}

impl Default for FsmContext {
    fn default() -> Self {
        Self::new(Sensitivity::default())
    }
}
