//! Detector configuration parameters.
//!
//! All tunable parameters for the shake-alarm subsystem.  Values can be
//! overridden by the host app (JSON settings blob) but are validated
//! before use: out-of-range values are rejected, never clamped.

use anyhow::Context;
use core::fmt;
use serde::{Deserialize, Serialize};

// --- Sensitivity slider bounds (exposed for the host UI) ---

/// Most sensitive setting (smallest motion that can trigger).
pub const SENSITIVITY_MIN: f32 = 0.5;
/// Least sensitive setting.
pub const SENSITIVITY_MAX: f32 = 10.0;
/// Slider granularity.
pub const SENSITIVITY_STEP: f32 = 0.5;
/// Factory default threshold (m/s² of per-axis change).
pub const SENSITIVITY_DEFAULT: f32 = 2.0;

/// Exponential moving average weight for the display magnitude.
pub const SMOOTHING_ALPHA: f32 = 0.1;

/// Depth of the sensor → controller sample queue.
pub const SAMPLE_QUEUE_DEPTH: usize = 16;

// ---------------------------------------------------------------------------
// Sensitivity
// ---------------------------------------------------------------------------

/// Motion threshold the instantaneous per-axis change must exceed.
///
/// Always inside `[SENSITIVITY_MIN, SENSITIVITY_MAX]` and on a
/// `SENSITIVITY_STEP` boundary; construction is the only validation point.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f32", into = "f32")]
pub struct Sensitivity(f32);

impl Sensitivity {
    pub fn new(value: f32) -> Result<Self, ConfigError> {
        if !(SENSITIVITY_MIN..=SENSITIVITY_MAX).contains(&value) {
            return Err(ConfigError::ValidationFailed(
                "sensitivity must be 0.5–10.0",
            ));
        }
        let steps = value / SENSITIVITY_STEP;
        if (steps - steps.round()).abs() > 1e-4 {
            return Err(ConfigError::ValidationFailed(
                "sensitivity must be a multiple of 0.5",
            ));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f32 {
        self.0
    }
}

impl Default for Sensitivity {
    fn default() -> Self {
        Self(SENSITIVITY_DEFAULT)
    }
}

impl TryFrom<f32> for Sensitivity {
    type Error = ConfigError;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Sensitivity> for f32 {
    fn from(s: Sensitivity) -> Self {
        s.0
    }
}

impl fmt::Display for Sensitivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Siren
// ---------------------------------------------------------------------------

/// Oscillator waveform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// Constant siren synthesis parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SirenConfig {
    pub waveform: Waveform,
    /// Start and hold frequency (Hz).
    pub base_frequency_hz: f32,
    /// Top of the sweep (Hz).
    pub peak_frequency_hz: f32,
    /// Duration of each half of the sweep (seconds).
    pub ramp_duration_secs: f32,
    /// Output gain (0.0–1.0).
    pub gain: f32,
}

impl Default for SirenConfig {
    fn default() -> Self {
        Self {
            waveform: Waveform::Sawtooth,
            base_frequency_hz: 440.0,
            peak_frequency_hz: 880.0,
            ramp_duration_secs: 0.5,
            gain: 1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// DetectorConfig
// ---------------------------------------------------------------------------

/// Core subsystem configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    // --- Detection ---
    /// Initial trigger threshold.
    pub sensitivity: Sensitivity,
    /// EMA weight of the display magnitude.
    pub smoothing_alpha: f32,

    // --- Alarm ---
    pub siren: SirenConfig,

    // --- Telemetry ---
    /// Emit a telemetry event every N processed samples (0 = never).
    pub telemetry_every_samples: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            sensitivity: Sensitivity::default(),
            smoothing_alpha: SMOOTHING_ALPHA,
            siren: SirenConfig::default(),
            telemetry_every_samples: 50, // ~1 s at typical 50 Hz delivery
        }
    }
}

impl DetectorConfig {
    /// Parse a host settings blob and validate it.
    ///
    /// Missing fields fall back to defaults.
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let cfg: Self =
            serde_json::from_str(json).context("parsing detector config JSON")?;
        validate_config(&cfg).context("validating detector config")?;
        Ok(cfg)
    }
}

/// Range-check every field.  Rejects instead of clamping so a bad
/// settings blob cannot silently disable the alarm.
pub fn validate_config(cfg: &DetectorConfig) -> Result<(), ConfigError> {
    Sensitivity::new(cfg.sensitivity.value())?;
    if !(cfg.smoothing_alpha > 0.0 && cfg.smoothing_alpha <= 1.0) {
        return Err(ConfigError::ValidationFailed(
            "smoothing_alpha must be in (0.0, 1.0]",
        ));
    }
    let siren = &cfg.siren;
    if !(20.0..=20_000.0).contains(&siren.base_frequency_hz) {
        return Err(ConfigError::ValidationFailed(
            "siren.base_frequency_hz must be 20–20000",
        ));
    }
    if !(20.0..=20_000.0).contains(&siren.peak_frequency_hz) {
        return Err(ConfigError::ValidationFailed(
            "siren.peak_frequency_hz must be 20–20000",
        ));
    }
    if !(siren.ramp_duration_secs > 0.0 && siren.ramp_duration_secs <= 10.0) {
        return Err(ConfigError::ValidationFailed(
            "siren.ramp_duration_secs must be in (0.0, 10.0]",
        ));
    }
    if !(0.0..=1.0).contains(&siren.gain) {
        return Err(ConfigError::ValidationFailed("siren.gain must be 0.0–1.0"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Configuration rejected by validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
