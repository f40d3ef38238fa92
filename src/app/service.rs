//! Session controller — the hexagonal core.
//!
//! [`SessionController`] owns the FSM, the sampler, the signal processor
//! and the siren.  It exposes a platform-agnostic API; sensor and audio
//! I/O flow through the ports it was built with, events flow out through
//! the [`EventSink`] passed at each call.
//!
//! ```text
//!  MotionSensorPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                       │      SessionController        │
//!  PermissionGate ────▶ │  FSM · processor · detector   │
//!                       └──────────────────────────────┘
//!                                      │
//!                                      ▼
//!                              AlarmSiren ──▶ AudioPort
//! ```
//!
//! ## Starting is two-phase
//!
//! Arming needs a permission answer, which may take arbitrarily long.
//! [`begin_start`](SessionController::begin_start) hands out a
//! [`StartTicket`] stamped with the current session epoch;
//! [`complete_start`](SessionController::complete_start) arms only if the
//! epoch is unchanged.  Every stop or close bumps the epoch, so a
//! permission answer that arrives after the user gave up is discarded
//! instead of re-arming a dismissed session.

use std::sync::Arc;

use log::{debug, error, info, warn};

use crate::config::{DetectorConfig, Sensitivity, validate_config};
use crate::drivers::siren::AlarmSiren;
use crate::error::Error;
use crate::fsm::context::FsmContext;
use crate::fsm::states::build_state_table;
use crate::fsm::{AlarmState, Fsm};
use crate::sensors::permission::{PermissionGate, PermissionState};
use crate::sensors::processor::SignalProcessor;
use crate::sensors::sampler::{MotionSample, MotionSampler, SampleQueue};

use super::commands::SessionCommand;
use super::events::{AlarmEvent, MotionTelemetry};
use super::ports::{AudioPort, EventSink, MotionSensorPort, PermissionPort};

/// Proof that a start was requested in a given session epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct StartTicket {
    epoch: u64,
}

// ───────────────────────────────────────────────────────────────
// SessionController
// ───────────────────────────────────────────────────────────────

pub struct SessionController<S, A> {
    fsm: Fsm,
    ctx: FsmContext,
    sampler: MotionSampler<S>,
    processor: SignalProcessor,
    siren: AlarmSiren<A>,
    config: DetectorConfig,
    permission: PermissionState,
    /// Bumped on every stop/close; invalidates outstanding tickets.
    epoch: u64,
    closed: bool,
    trigger_count: u32,
    samples_since_telemetry: u32,
}

impl<S: MotionSensorPort, A: AudioPort> SessionController<S, A> {
    /// Build an Idle controller.  Rejects an invalid configuration.
    pub fn new(sensor: S, audio: A, config: DetectorConfig) -> Result<Self, Error> {
        validate_config(&config)?;
        let mut ctx = FsmContext::new(config.sensitivity);
        let mut fsm = Fsm::new(build_state_table(), AlarmState::Idle);
        fsm.start(&mut ctx);

        Ok(Self {
            fsm,
            ctx,
            sampler: MotionSampler::new(sensor),
            processor: SignalProcessor::new(config.smoothing_alpha),
            siren: AlarmSiren::new(audio, config.siren),
            config,
            permission: PermissionState::Unknown,
            epoch: 0,
            closed: false,
            trigger_count: 0,
            samples_since_telemetry: 0,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// First half of a start.  Returns `None` when there is nothing to
    /// do: already active, closed, or no motion sensor on this device.
    pub fn begin_start(&mut self, sink: &mut impl EventSink) -> Option<StartTicket> {
        if self.closed {
            warn!("Start ignored: session closed");
            return None;
        }
        if self.fsm.current_state().is_active() {
            debug!("Start ignored: already {:?}", self.fsm.current_state());
            return None;
        }
        if !self.sampler.is_available() {
            warn!("Start refused: no motion sensor");
            sink.emit(&AlarmEvent::SensorUnavailable);
            return None;
        }
        Some(StartTicket { epoch: self.epoch })
    }

    /// Second half of a start, once the permission is known.
    /// Returns `true` if the session is now Armed.
    pub fn complete_start(
        &mut self,
        ticket: StartTicket,
        permission: PermissionState,
        sink: &mut impl EventSink,
    ) -> bool {
        if self.closed || ticket.epoch != self.epoch {
            info!(
                "Discarding start from epoch {} (now {})",
                ticket.epoch, self.epoch
            );
            sink.emit(&AlarmEvent::StartDiscarded);
            return false;
        }
        if self.fsm.current_state().is_active() {
            return false;
        }

        self.permission = permission;
        if permission != PermissionState::Granted {
            warn!("Start refused: permission {:?}", permission);
            sink.emit(&AlarmEvent::PermissionDenied);
            return false;
        }

        if self.sampler.subscribe().is_err() {
            sink.emit(&AlarmEvent::SensorUnavailable);
            return false;
        }

        self.processor.reset();
        self.samples_since_telemetry = 0;
        // Inside the user gesture: the platform allows audio now.
        if let Err(e) = self.siren.prepare() {
            warn!("Audio not ready at arm time: {}", e);
            sink.emit(&AlarmEvent::SirenFault(e));
        }

        self.transition(AlarmState::Armed, sink);
        true
    }

    /// Request permission through `gate` and arm.
    pub async fn start<P: PermissionPort>(
        &mut self,
        gate: &PermissionGate<P>,
        sink: &mut impl EventSink,
    ) -> bool {
        let Some(ticket) = self.begin_start(sink) else {
            return false;
        };
        let permission = gate.request().await;
        self.complete_start(ticket, permission, sink)
    }

    /// Idle → start, otherwise stop.  Returns the resulting state.
    pub async fn toggle_active<P: PermissionPort>(
        &mut self,
        gate: &PermissionGate<P>,
        sink: &mut impl EventSink,
    ) -> AlarmState {
        if self.fsm.current_state() == AlarmState::Idle {
            self.start(gate, sink).await;
        } else {
            self.stop(sink);
        }
        self.fsm.current_state()
    }

    /// Disarm: unsubscribe, silence, back to Idle.  Idempotent.
    pub fn stop(&mut self, sink: &mut impl EventSink) {
        self.epoch = self.epoch.wrapping_add(1);
        self.transition(AlarmState::Idle, sink);
    }

    /// Silence a triggered alarm and keep monitoring.
    pub fn stop_alarm(&mut self, sink: &mut impl EventSink) {
        if self.fsm.current_state() != AlarmState::Triggered {
            debug!("StopAlarm ignored in {:?}", self.fsm.current_state());
            return;
        }
        self.transition(AlarmState::Armed, sink);
    }

    /// Tear everything down and release the audio context.  Terminal.
    pub fn close(&mut self, sink: &mut impl EventSink) {
        if self.closed {
            return;
        }
        self.stop(sink);
        self.siren.shutdown();
        self.closed = true;
        info!("Session closed");
    }

    /// Change the threshold.  Honoured only while Idle.
    pub fn set_sensitivity(&mut self, value: f32, sink: &mut impl EventSink) -> bool {
        let state = self.fsm.current_state();
        let accepted = match Sensitivity::new(value) {
            Ok(s) if state == AlarmState::Idle => s,
            Ok(_) => {
                debug!("Sensitivity change refused while {:?}", state);
                sink.emit(&AlarmEvent::SensitivityRejected {
                    requested: value,
                    state,
                });
                return false;
            }
            Err(e) => {
                warn!("Sensitivity {} rejected: {}", value, e);
                sink.emit(&AlarmEvent::SensitivityRejected {
                    requested: value,
                    state,
                });
                return false;
            }
        };
        self.ctx.sensitivity = accepted;
        self.config.sensitivity = accepted;
        info!("Sensitivity set to {}", accepted);
        sink.emit(&AlarmEvent::SensitivityChanged(accepted));
        true
    }

    /// Handle a command that needs no permission round-trip.
    ///
    /// A start (or a toggle from Idle) is only begun here; the returned
    /// ticket must be completed with
    /// [`complete_start`](Self::complete_start) once the permission
    /// resolves.
    pub fn handle_command(
        &mut self,
        cmd: SessionCommand,
        sink: &mut impl EventSink,
    ) -> Option<StartTicket> {
        match cmd {
            SessionCommand::Start => return self.begin_start(sink),
            SessionCommand::ToggleActive => {
                if self.fsm.current_state() == AlarmState::Idle {
                    return self.begin_start(sink);
                }
                self.stop(sink);
            }
            SessionCommand::Stop => self.stop(sink),
            SessionCommand::StopAlarm => self.stop_alarm(sink),
            SessionCommand::SetSensitivity(v) => {
                self.set_sensitivity(v, sink);
            }
            SessionCommand::Close => self.close(sink),
        }
        None
    }

    // ── Per-sample orchestration ──────────────────────────────

    /// Process one motion sample: delta + EMA → FSM tick → siren.
    pub fn on_sample(&mut self, sample: &MotionSample, sink: &mut impl EventSink) {
        let prev = self.fsm.current_state();
        if prev == AlarmState::Idle {
            debug!("Sample ignored while Idle");
            return;
        }

        self.ctx.reading = self.processor.process(sample);

        if let Some(next) = self.fsm.tick(&mut self.ctx) {
            self.apply_commands(sink);
            sink.emit(&AlarmEvent::StateChanged { from: prev, to: next });
            if next == AlarmState::Triggered {
                self.trigger_count = self.trigger_count.saturating_add(1);
                sink.emit(&AlarmEvent::Triggered {
                    motion: self.ctx.reading.motion,
                    sensitivity: self.ctx.sensitivity,
                });
            }
        }

        let every = self.config.telemetry_every_samples;
        if every > 0 {
            self.samples_since_telemetry += 1;
            if self.samples_since_telemetry >= every {
                self.samples_since_telemetry = 0;
                sink.emit(&AlarmEvent::Telemetry(self.build_telemetry()));
            }
        }
    }

    /// Drain every queued sample.  Returns how many were processed.
    pub fn pump_samples(&mut self, sink: &mut impl EventSink) -> usize {
        let mut n = 0;
        while let Some(sample) = self.sampler.try_next() {
            self.on_sample(&sample, sink);
            n += 1;
        }
        n
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn build_telemetry(&self) -> MotionTelemetry {
        MotionTelemetry {
            state: self.fsm.current_state(),
            current_motion: self.ctx.reading.smoothed,
            last_motion: self.ctx.reading.motion,
            sensitivity: self.ctx.sensitivity,
            permission: self.permission,
            samples_processed: self.ctx.total_samples,
            trigger_count: self.trigger_count,
            dropped_samples: self.sampler.queue().dropped(),
            siren_sounding: self.siren.is_sounding(),
        }
    }

    pub fn state(&self) -> AlarmState {
        self.fsm.current_state()
    }

    /// Smoothed display magnitude.
    pub fn current_motion(&self) -> f32 {
        self.ctx.reading.smoothed
    }

    /// Instantaneous motion of the latest sample.
    pub fn last_motion(&self) -> f32 {
        self.ctx.reading.motion
    }

    pub fn sensitivity(&self) -> Sensitivity {
        self.ctx.sensitivity
    }

    pub fn permission(&self) -> PermissionState {
        self.permission
    }

    pub fn is_sampling(&self) -> bool {
        self.sampler.is_subscribed()
    }

    pub fn is_siren_sounding(&self) -> bool {
        self.siren.is_sounding()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn trigger_count(&self) -> u32 {
        self.trigger_count
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Queue the platform feeds; await it to drive the controller.
    pub fn sample_queue(&self) -> Arc<SampleQueue> {
        self.sampler.queue()
    }

    pub fn sensor(&self) -> &S {
        self.sampler.port()
    }

    pub fn siren(&self) -> &AlarmSiren<A> {
        &self.siren
    }

    // ── Internal ──────────────────────────────────────────────

    fn transition(&mut self, next: AlarmState, sink: &mut impl EventSink) {
        let prev = self.fsm.current_state();
        let moved = self.fsm.force_transition(next, &mut self.ctx);
        self.apply_commands(sink);
        if moved {
            sink.emit(&AlarmEvent::StateChanged { from: prev, to: next });
        }
    }

    /// Reconcile the siren and the subscription with the FSM commands.
    fn apply_commands(&mut self, sink: &mut impl EventSink) {
        let cmds = self.ctx.commands;

        if cmds.siren {
            if let Err(e) = self.siren.start() {
                error!("Siren failed to start: {}", e);
                sink.emit(&AlarmEvent::SirenFault(e));
            }
        } else {
            self.siren.stop();
        }

        if !cmds.sampling {
            self.sampler.unsubscribe();
        }
    }
}
