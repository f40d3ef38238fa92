//! Alarm siren: a swept sawtooth tone on the platform audio graph.
//!
//! ```text
//! oscillator (sawtooth, 440 Hz) ──▶ gain ──▶ destination
//!
//!   t0        t0+0.5      t0+1.0
//!   440 ──ramp──▶ 880 ──ramp──▶ 440   (then holds 440 until stopped)
//! ```
//!
//! ## Context lifetime
//!
//! The audio context is created lazily, once, on the first call to
//! [`AlarmSiren::prepare`] (made at arm time, i.e. inside the user gesture,
//! so autoplay policies allow it) or [`AlarmSiren::start`].  A suspended
//! context is resumed before use.  [`AlarmSiren::shutdown`] releases it for
//! good.
//!
//! ## Idempotence
//!
//! `start` while sounding and `stop` while silent are no-ops.  Teardown
//! errors are logged and counted, never propagated: the siren is
//! considered silent once `stop` returns.

use log::{debug, info, warn};

use crate::app::ports::{AudioPort, AudioTarget, NodeId};
use crate::config::SirenConfig;
use crate::error::AudioError;

/// Number of automation points in one sweep.
pub const SWEEP_STEPS: usize = 3;

/// One frequency automation point on the audio clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrequencyStep {
    /// Jump to `hz` at `at`.
    SetAt { hz: f32, at: f64 },
    /// Linear ramp arriving at `hz` at `at`.
    RampTo { hz: f32, at: f64 },
}

/// The up-and-down sweep starting at clock time `now`.
pub fn sweep_plan(cfg: &SirenConfig, now: f64) -> heapless::Vec<FrequencyStep, SWEEP_STEPS> {
    let ramp = cfg.ramp_duration_secs as f64;
    let mut plan = heapless::Vec::new();
    let _ = plan.push(FrequencyStep::SetAt {
        hz: cfg.base_frequency_hz,
        at: now,
    });
    let _ = plan.push(FrequencyStep::RampTo {
        hz: cfg.peak_frequency_hz,
        at: now + ramp,
    });
    let _ = plan.push(FrequencyStep::RampTo {
        hz: cfg.base_frequency_hz,
        at: now + 2.0 * ramp,
    });
    plan
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SirenState {
    Silent,
    Sounding { started_at: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContextState {
    Uncreated,
    Ready,
    Closed,
}

#[derive(Debug, Clone, Copy)]
struct SirenGraph {
    oscillator: NodeId,
    gain: NodeId,
    started_at: f64,
}

pub struct AlarmSiren<A> {
    audio: A,
    config: SirenConfig,
    context: ContextState,
    graph: Option<SirenGraph>,
}

impl<A: AudioPort> AlarmSiren<A> {
    pub fn new(audio: A, config: SirenConfig) -> Self {
        Self {
            audio,
            config,
            context: ContextState::Uncreated,
            graph: None,
        }
    }

    /// Make sure a running audio context exists.
    pub fn prepare(&mut self) -> Result<(), AudioError> {
        match self.context {
            ContextState::Closed => return Err(AudioError::AlreadyReleased),
            ContextState::Uncreated => {
                self.audio.create_context()?;
                self.context = ContextState::Ready;
                info!("Siren: audio context created");
            }
            ContextState::Ready => {}
        }
        if self.audio.is_suspended() {
            info!("Siren: resuming suspended audio context");
            self.audio.resume()?;
        }
        Ok(())
    }

    /// Begin sounding.  No-op if already sounding.
    ///
    /// On failure every partially built node is released and the siren
    /// stays silent.
    pub fn start(&mut self) -> Result<(), AudioError> {
        if self.graph.is_some() {
            debug!("Siren: already sounding");
            return Ok(());
        }
        self.prepare()?;

        let now = self.audio.current_time();
        let oscillator = self
            .audio
            .create_oscillator(self.config.waveform, self.config.base_frequency_hz)?;
        let gain = match self.audio.create_gain(self.config.gain) {
            Ok(gain) => gain,
            Err(e) => {
                warn!("Siren: gain creation failed: {}", e);
                if let Err(release) = self.audio.disconnect(oscillator) {
                    warn!("Siren: disconnect of {:?} failed: {}", oscillator, release);
                }
                return Err(e);
            }
        };
        let graph = SirenGraph {
            oscillator,
            gain,
            started_at: now,
        };

        if let Err(e) = self.wire(&graph) {
            warn!("Siren: start failed: {}", e);
            self.teardown(&graph, false);
            return Err(e);
        }

        info!(
            "Siren: sounding ({:?} {}→{} Hz)",
            self.config.waveform, self.config.base_frequency_hz, self.config.peak_frequency_hz
        );
        self.graph = Some(graph);
        Ok(())
    }

    /// Silence the siren.  Returns the number of teardown steps that failed.
    pub fn stop(&mut self) -> u32 {
        let Some(graph) = self.graph.take() else {
            return 0;
        };
        let faults = self.teardown(&graph, true);
        if faults == 0 {
            info!("Siren: stopped");
        } else {
            warn!("Siren: stopped with {} teardown fault(s)", faults);
        }
        faults
    }

    /// Stop and release the audio context.  Terminal.
    pub fn shutdown(&mut self) {
        self.stop();
        if self.context == ContextState::Ready {
            match self.audio.close_context() {
                Ok(()) => info!("Siren: audio context closed"),
                Err(e) => warn!("Siren: closing audio context failed: {}", e),
            }
        }
        self.context = ContextState::Closed;
    }

    pub fn is_sounding(&self) -> bool {
        self.graph.is_some()
    }

    pub fn state(&self) -> SirenState {
        match self.graph {
            Some(g) => SirenState::Sounding {
                started_at: g.started_at,
            },
            None => SirenState::Silent,
        }
    }

    pub fn has_context(&self) -> bool {
        self.context == ContextState::Ready
    }

    pub fn config(&self) -> &SirenConfig {
        &self.config
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn wire(&mut self, graph: &SirenGraph) -> Result<(), AudioError> {
        for step in sweep_plan(&self.config, graph.started_at) {
            match step {
                FrequencyStep::SetAt { hz, at } => {
                    self.audio.set_frequency_at(graph.oscillator, hz, at)?
                }
                FrequencyStep::RampTo { hz, at } => {
                    self.audio.ramp_frequency_to(graph.oscillator, hz, at)?
                }
            }
        }
        self.audio
            .connect(graph.oscillator, AudioTarget::Node(graph.gain))?;
        self.audio.connect(graph.gain, AudioTarget::Destination)?;
        self.audio.start(graph.oscillator)
    }

    fn teardown(&mut self, graph: &SirenGraph, started: bool) -> u32 {
        let mut faults = 0;
        if started {
            if let Err(e) = self.audio.stop(graph.oscillator) {
                warn!("Siren: oscillator stop failed: {}", e);
                faults += 1;
            }
        }
        for node in [graph.oscillator, graph.gain] {
            if let Err(e) = self.audio.disconnect(node) {
                warn!("Siren: disconnect of {:?} failed: {}", node, e);
                faults += 1;
            }
        }
        faults
    }
}
