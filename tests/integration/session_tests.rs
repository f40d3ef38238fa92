//! Integration tests for the SessionController → FSM → siren pipeline.

use futures_lite::future::block_on;

use crate::mock_platform::Rig;

use shakealarm::adapters::permission::{AlwaysGranted, PromptPermission};
use shakealarm::adapters::sim_audio::{FailPoint, SimAudio};
use shakealarm::adapters::sim_sensor::ScriptedMotionSensor;
use shakealarm::app::commands::SessionCommand;
use shakealarm::app::events::AlarmEvent;
use shakealarm::config::{DetectorConfig, Sensitivity};
use shakealarm::error::AudioError;
use shakealarm::fsm::AlarmState;
use shakealarm::sensors::permission::{PermissionGate, PermissionState};

// ── Detection scenarios ───────────────────────────────────────

#[test]
fn small_motion_keeps_armed() {
    let mut rig = Rig::new();
    rig.arm();

    rig.shake(0.5, 0.5, 0.5);

    assert_eq!(rig.controller.state(), AlarmState::Armed);
    assert!((rig.controller.last_motion() - 0.5).abs() < 1e-6);
    assert!(!rig.siren_sounding());
    assert_eq!(rig.sink.triggers(), 0);
}

#[test]
fn large_motion_triggers_siren() {
    let mut rig = Rig::new();
    rig.arm();

    rig.shake(3.0, 0.0, 0.0);

    assert_eq!(rig.controller.state(), AlarmState::Triggered);
    assert!(rig.siren_sounding());
    assert!(rig.controller.is_siren_sounding());
    assert!(rig.sink.contains(&AlarmEvent::Triggered {
        motion: 3.0,
        sensitivity: Sensitivity::new(2.0).unwrap(),
    }));
    assert_eq!(
        rig.sink.transitions().last(),
        Some(&(AlarmState::Armed, AlarmState::Triggered))
    );
}

#[test]
fn motion_equal_to_sensitivity_does_not_trigger() {
    let mut rig = Rig::new();
    rig.arm();
    rig.shake(0.0, 2.0, 0.0);
    assert_eq!(rig.controller.state(), AlarmState::Armed);
}

#[test]
fn triggered_is_latched_through_quiet_samples() {
    let mut rig = Rig::new();
    rig.trigger();

    // Same reading again: zero delta.
    rig.shake(3.0, 0.0, 0.0);
    rig.shake(3.0, 0.0, 0.0);

    assert_eq!(rig.controller.state(), AlarmState::Triggered);
    assert!(rig.siren_sounding());
    assert_eq!(rig.audio.sounding(), 1);
    assert_eq!(rig.sink.triggers(), 1);
}

#[test]
fn stop_alarm_rearms_with_subscription_kept() {
    let mut rig = Rig::new();
    rig.trigger();

    rig.controller.stop_alarm(&mut rig.sink);

    assert_eq!(rig.controller.state(), AlarmState::Armed);
    assert!(!rig.siren_sounding());
    assert!(rig.controller.is_sampling());
    assert!(rig.feed.is_subscribed());
    assert_eq!(rig.feed.unsubscribe_count(), 0);
}

#[test]
fn stop_alarm_is_idempotent() {
    let mut rig = Rig::new();
    rig.trigger();

    rig.controller.stop_alarm(&mut rig.sink);
    let events = rig.sink.events.len();
    rig.controller.stop_alarm(&mut rig.sink);

    assert_eq!(rig.controller.state(), AlarmState::Armed);
    assert_eq!(rig.sink.events.len(), events);
}

#[test]
fn no_debounce_after_stop_alarm() {
    let mut rig = Rig::new();
    rig.trigger();
    rig.controller.stop_alarm(&mut rig.sink);

    // Still shaking: the very next sample re-triggers.
    rig.shake(0.0, 0.0, 0.0);

    assert_eq!(rig.controller.state(), AlarmState::Triggered);
    assert_eq!(rig.sink.triggers(), 2);
    assert_eq!(rig.controller.trigger_count(), 2);
}

#[test]
fn first_sample_is_diffed_against_zero() {
    let mut rig = Rig::new();
    let ticket = rig.controller.begin_start(&mut rig.sink).unwrap();
    rig.controller
        .complete_start(ticket, PermissionState::Granted, &mut rig.sink);

    // Resting device: gravity alone on the first sample exceeds 2.0.
    rig.shake(0.0, 0.0, 9.81);

    assert_eq!(rig.controller.state(), AlarmState::Triggered);
}

// ── Stop / close ──────────────────────────────────────────────

#[test]
fn stop_from_armed_unsubscribes() {
    let mut rig = Rig::new();
    rig.arm();

    rig.controller.stop(&mut rig.sink);

    assert_eq!(rig.controller.state(), AlarmState::Idle);
    assert!(!rig.feed.is_subscribed());
    assert!(!rig.siren_sounding());
    assert_eq!(rig.feed.unsubscribe_count(), 1);
}

#[test]
fn stop_is_idempotent() {
    let mut rig = Rig::new();
    rig.arm();
    rig.controller.stop(&mut rig.sink);
    rig.controller.stop(&mut rig.sink);
    assert_eq!(rig.controller.state(), AlarmState::Idle);
    assert_eq!(rig.feed.unsubscribe_count(), 1);
}

#[test]
fn toggle_from_triggered_silences_and_disarms() {
    let mut rig = Rig::new();
    rig.trigger();
    let gate = PermissionGate::new(AlwaysGranted);

    let state = block_on(rig.controller.toggle_active(&gate, &mut rig.sink));

    assert_eq!(state, AlarmState::Idle);
    assert!(!rig.siren_sounding());
    assert!(!rig.feed.is_subscribed());
}

#[test]
fn close_from_triggered_releases_everything() {
    let mut rig = Rig::new();
    rig.trigger();

    rig.controller.close(&mut rig.sink);

    assert_eq!(rig.controller.state(), AlarmState::Idle);
    assert!(rig.controller.is_closed());
    assert!(!rig.feed.is_subscribed());
    assert_eq!(rig.audio.sounding(), 0);
    assert!(!rig.audio.context_open());
}

#[test]
fn closed_session_cannot_restart() {
    let mut rig = Rig::new();
    rig.controller.close(&mut rig.sink);
    assert!(rig.controller.begin_start(&mut rig.sink).is_none());
}

#[test]
fn samples_after_stop_are_ignored() {
    let mut rig = Rig::new();
    rig.arm();
    rig.controller.stop(&mut rig.sink);

    // The platform may still fire a queued callback after removal.
    assert!(!rig.shake(9.0, 9.0, 9.0));
    assert_eq!(rig.controller.state(), AlarmState::Idle);
}

// ── Permission ────────────────────────────────────────────────

#[test]
fn denied_permission_stays_idle() {
    let mut rig = Rig::new();
    let (port, resolver) = PromptPermission::new();
    let gate = PermissionGate::new(port);
    resolver.deny();

    let armed = block_on(rig.controller.start(&gate, &mut rig.sink));

    assert!(!armed);
    assert_eq!(rig.controller.state(), AlarmState::Idle);
    assert_eq!(rig.controller.permission(), PermissionState::Denied);
    assert_eq!(rig.feed.subscribe_count(), 0);
    assert!(rig.sink.contains(&AlarmEvent::PermissionDenied));
}

#[test]
fn permission_error_is_denial_not_failure() {
    let mut rig = Rig::new();
    let (port, resolver) = PromptPermission::new();
    let gate = PermissionGate::new(port);
    resolver.fail();

    assert!(!block_on(rig.controller.start(&gate, &mut rig.sink)));
    assert_eq!(rig.controller.state(), AlarmState::Idle);
}

#[test]
fn granted_permission_is_not_asked_twice() {
    let mut rig = Rig::new();
    let (port, resolver) = PromptPermission::new();
    let gate = PermissionGate::new(port);
    resolver.grant();

    assert!(block_on(rig.controller.start(&gate, &mut rig.sink)));
    rig.controller.stop(&mut rig.sink);
    assert!(block_on(rig.controller.start(&gate, &mut rig.sink)));

    assert_eq!(resolver.prompts(), 1);
    assert_eq!(rig.feed.subscribe_count(), 2);
}

#[test]
fn denial_is_asked_again_on_next_start() {
    let mut rig = Rig::new();
    let (port, resolver) = PromptPermission::new();
    let gate = PermissionGate::new(port);

    resolver.deny();
    assert!(!block_on(rig.controller.start(&gate, &mut rig.sink)));
    resolver.grant();
    assert!(block_on(rig.controller.start(&gate, &mut rig.sink)));
    assert_eq!(resolver.prompts(), 2);
}

#[test]
fn permission_resolved_after_close_is_discarded() {
    let mut rig = Rig::new();
    let ticket = rig.controller.begin_start(&mut rig.sink).unwrap();
    rig.controller.close(&mut rig.sink);

    assert!(
        !rig.controller
            .complete_start(ticket, PermissionState::Granted, &mut rig.sink)
    );
    assert_eq!(rig.feed.subscribe_count(), 0);
    assert_eq!(rig.audio.contexts_created(), 0);
    assert!(rig.sink.contains(&AlarmEvent::StartDiscarded));
}

// ── Sensor capability ─────────────────────────────────────────

#[test]
fn missing_sensor_is_inert() {
    let mut rig = Rig::build(
        ScriptedMotionSensor::unavailable(),
        SimAudio::new(),
        DetectorConfig::default(),
    );
    let gate = PermissionGate::new(AlwaysGranted);

    assert!(!block_on(rig.controller.start(&gate, &mut rig.sink)));
    assert_eq!(rig.controller.state(), AlarmState::Idle);
    assert!(rig.sink.contains(&AlarmEvent::SensorUnavailable));
}

#[test]
fn refused_subscription_stays_idle() {
    let mut rig = Rig::new();
    rig.feed.refuse_subscribe(true);
    let gate = PermissionGate::new(AlwaysGranted);

    assert!(!block_on(rig.controller.start(&gate, &mut rig.sink)));
    assert_eq!(rig.controller.state(), AlarmState::Idle);
    assert!(!rig.controller.is_sampling());
    assert!(rig.sink.contains(&AlarmEvent::SensorUnavailable));
}

#[test]
fn sensor_lost_between_sessions_blocks_restart() {
    let mut rig = Rig::new();
    rig.arm();
    rig.controller.stop(&mut rig.sink);
    rig.feed.set_available(false);
    rig.sink.clear();

    let gate = PermissionGate::new(AlwaysGranted);
    assert!(!block_on(rig.controller.start(&gate, &mut rig.sink)));
    assert_eq!(rig.controller.state(), AlarmState::Idle);
    assert_eq!(rig.feed.subscribe_count(), 1);
    assert!(rig.sink.contains(&AlarmEvent::SensorUnavailable));
}

#[test]
fn missing_axes_are_zero_filled() {
    use shakealarm::sensors::sampler::{AxisReading, RawMotionReading};

    let mut rig = Rig::new();
    rig.arm();
    let accepted = rig.feed.emit(&RawMotionReading {
        including_gravity: Some(AxisReading {
            x: Some(1.0),
            y: None,
            z: None,
        }),
        linear: None,
        timestamp_us: 1,
    });
    rig.controller.pump_samples(&mut rig.sink);

    assert!(accepted);
    assert!((rig.controller.last_motion() - 1.0).abs() < 1e-6);
}

// ── Sensitivity ───────────────────────────────────────────────

#[test]
fn sensitivity_changes_only_while_idle() {
    let mut rig = Rig::new();

    assert!(rig.controller.set_sensitivity(4.0, &mut rig.sink));
    rig.arm();
    assert!(!rig.controller.set_sensitivity(1.0, &mut rig.sink));

    assert_eq!(rig.controller.sensitivity().value(), 4.0);
    assert!(rig.sink.contains(&AlarmEvent::SensitivityRejected {
        requested: 1.0,
        state: AlarmState::Armed,
    }));

    // Delta 3.0 no longer crosses a 4.0 threshold.
    rig.shake(3.0, 0.0, 0.0);
    assert_eq!(rig.controller.state(), AlarmState::Armed);
}

#[test]
fn off_step_sensitivity_is_rejected() {
    let mut rig = Rig::new();
    assert!(!rig.controller.set_sensitivity(2.3, &mut rig.sink));
    assert!(!rig.controller.set_sensitivity(11.0, &mut rig.sink));
    assert_eq!(rig.controller.sensitivity().value(), 2.0);
}

// ── Siren / audio ─────────────────────────────────────────────

#[test]
fn audio_context_created_once_across_cycles() {
    let mut rig = Rig::new();
    rig.trigger();
    rig.controller.stop_alarm(&mut rig.sink);
    rig.controller.stop(&mut rig.sink);
    rig.arm();
    rig.shake(5.0, 0.0, 0.0);

    assert_eq!(rig.controller.state(), AlarmState::Triggered);
    assert_eq!(rig.audio.contexts_created(), 1);
    assert_eq!(rig.audio.sounding(), 1);
}

#[test]
fn suspended_audio_is_resumed_at_arm_time() {
    let mut rig = Rig::build(
        ScriptedMotionSensor::new(),
        SimAudio::suspended(),
        DetectorConfig::default(),
    );
    rig.arm();
    assert!(rig.audio.context_open());
    assert!(!rig.audio.is_suspended());
}

#[test]
fn siren_failure_still_latches_and_reports() {
    let mut rig = Rig::new();
    rig.arm();
    rig.audio.fail_at(Some(FailPoint::CreateOscillator));

    rig.shake(3.0, 0.0, 0.0);

    assert_eq!(rig.controller.state(), AlarmState::Triggered);
    assert!(!rig.siren_sounding());
    assert!(rig.sink.contains(&AlarmEvent::SirenFault(AudioError::NodeCreationFailed)));
}

#[test]
fn siren_teardown_failure_never_leaks_sound() {
    let mut rig = Rig::new();
    rig.trigger();
    rig.audio.fail_at(Some(FailPoint::Stop));

    rig.controller.stop_alarm(&mut rig.sink);

    assert_eq!(rig.controller.state(), AlarmState::Armed);
    assert!(!rig.controller.is_siren_sounding());
    assert_eq!(rig.audio.sounding(), 0);
}

// ── Command dispatch ──────────────────────────────────────────

#[test]
fn commands_map_onto_lifecycle() {
    let mut rig = Rig::new();
    let ticket = rig
        .controller
        .handle_command(SessionCommand::ToggleActive, &mut rig.sink)
        .unwrap();
    rig.controller
        .complete_start(ticket, PermissionState::Granted, &mut rig.sink);
    assert_eq!(rig.controller.state(), AlarmState::Armed);

    rig.shake(0.0, 0.0, 0.0);
    rig.shake(4.0, 0.0, 0.0);
    assert!(
        rig.controller
            .handle_command(SessionCommand::StopAlarm, &mut rig.sink)
            .is_none()
    );
    assert_eq!(rig.controller.state(), AlarmState::Armed);

    rig.controller
        .handle_command(SessionCommand::ToggleActive, &mut rig.sink);
    assert_eq!(rig.controller.state(), AlarmState::Idle);

    rig.controller
        .handle_command(SessionCommand::SetSensitivity(6.5), &mut rig.sink);
    assert_eq!(rig.controller.sensitivity().value(), 6.5);

    rig.controller
        .handle_command(SessionCommand::Close, &mut rig.sink);
    assert!(rig.controller.is_closed());
}

#[test]
fn telemetry_reports_display_magnitude() {
    let config = DetectorConfig {
        telemetry_every_samples: 1,
        ..DetectorConfig::default()
    };
    let mut rig = Rig::with_config(config);
    rig.arm();
    rig.sink.clear();

    rig.shake(1.0, 0.0, 0.0);

    let Some(AlarmEvent::Telemetry(t)) = rig.sink.events.last() else {
        panic!("expected telemetry, got {:?}", rig.sink.events);
    };
    assert_eq!(t.state, AlarmState::Armed);
    assert!((t.last_motion - 1.0).abs() < 1e-6);
    assert!((t.current_motion - 0.1).abs() < 1e-6);
    assert_eq!(t.permission, PermissionState::Granted);
    assert_eq!(t.samples_processed, 2);
}
