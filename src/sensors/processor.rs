//! Signal processing: per-axis delta and smoothed display magnitude.
//!
//! Invoked once per incoming sample, O(1), no history beyond the single
//! previous sample:
//!
//! ```text
//! delta_axis = |sample.axis − previous.axis|     axis ∈ {x, y, z}
//! motion     = max(delta_x, delta_y, delta_z)
//! smoothed   = smoothed·(1−α) + motion·α         α = 0.1
//! previous   = sample
//! ```
//!
//! Using the change between consecutive readings makes the detector
//! independent of device orientation: gravity contributes a constant
//! offset that cancels out.  The very first sample is diffed against an
//! all-zero reading, so its motion equals its largest raw axis.

use super::sampler::MotionSample;
use crate::config::SMOOTHING_ALPHA;

/// Output of one processing step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionReading {
    /// Instantaneous motion (drives detection).
    pub motion: f32,
    /// Exponential moving average of `motion` (display only).
    pub smoothed: f32,
}

/// Owns the `MotionState`: the previous sample and the smoothed magnitude.
#[derive(Debug, Clone)]
pub struct SignalProcessor {
    previous: Option<MotionSample>,
    smoothed: f32,
    alpha: f32,
}

impl SignalProcessor {
    pub fn new(alpha: f32) -> Self {
        Self {
            previous: None,
            smoothed: 0.0,
            alpha,
        }
    }

    /// Fold one sample into the state.
    pub fn process(&mut self, sample: &MotionSample) -> MotionReading {
        let prev = self.previous.unwrap_or_default();
        let motion = instantaneous_motion(&prev, sample);
        self.smoothed = self.smoothed * (1.0 - self.alpha) + motion * self.alpha;
        self.previous = Some(*sample);
        MotionReading {
            motion,
            smoothed: self.smoothed,
        }
    }

    /// Forget the previous sample and the average (new arm cycle).
    pub fn reset(&mut self) {
        self.previous = None;
        self.smoothed = 0.0;
    }

    pub fn smoothed(&self) -> f32 {
        self.smoothed
    }

    pub fn previous(&self) -> Option<&MotionSample> {
        self.previous.as_ref()
    }
}

impl Default for SignalProcessor {
    fn default() -> Self {
        Self::new(SMOOTHING_ALPHA)
    }
}

/// Largest absolute per-axis change between two samples.
pub fn instantaneous_motion(prev: &MotionSample, sample: &MotionSample) -> f32 {
    let dx = (sample.x - prev.x).abs();
    let dy = (sample.y - prev.y).abs();
    let dz = (sample.z - prev.z).abs();
    dx.max(dy).max(dz)
}
