//! Threshold detector.
//!
//! Stateless comparison of the instantaneous motion against the current
//! sensitivity.  The comparison is strict: motion exactly equal to the
//! threshold does not trigger.  Latching lives in the state machine, not
//! here.

use crate::config::Sensitivity;

/// `true` when `motion` strictly exceeds the threshold.
pub fn detect(motion: f32, sensitivity: Sensitivity) -> bool {
    motion > sensitivity.value()
}
