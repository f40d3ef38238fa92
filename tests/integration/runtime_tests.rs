//! Integration tests for the async session loop.
//!
//! Each test spawns a scripted "platform" task next to the session on a
//! local executor; the task plays the user and the sensor callback.

use std::time::Duration;

use futures_lite::future::yield_now;

use crate::mock_platform::Rig;

use shakealarm::adapters::permission::{AlwaysGranted, PromptPermission};
use shakealarm::app::commands::SessionCommand;
use shakealarm::app::events::AlarmEvent;
use shakealarm::fsm::AlarmState;
use shakealarm::runtime::{CommandQueue, run_local};
use shakealarm::sensors::permission::{PermissionGate, PermissionState};

async fn until(mut cond: impl FnMut() -> bool) {
    while !cond() {
        yield_now().await;
    }
}

async fn settle() {
    for _ in 0..16 {
        yield_now().await;
    }
}

#[test]
fn arm_trigger_silence_close() {
    let mut rig = Rig::new();
    let gate = PermissionGate::new(AlwaysGranted);
    let commands = CommandQueue::new();
    let feed = rig.feed.clone();
    let audio = rig.audio.clone();

    let platform = async {
        commands.send(SessionCommand::Start).await;
        until(|| feed.is_subscribed()).await;
        feed.emit_xyz(0.0, 0.0, 0.0);
        feed.emit_xyz(3.0, 0.0, 0.0);
        until(|| audio.sounding() == 1).await;
        commands.send(SessionCommand::StopAlarm).await;
        until(|| audio.sounding() == 0).await;
        commands.send(SessionCommand::Close).await;
    };
    run_local(&mut rig.controller, &gate, &commands, &mut rig.sink, platform);

    assert_eq!(rig.controller.state(), AlarmState::Idle);
    assert!(rig.controller.is_closed());
    assert_eq!(
        rig.sink.transitions(),
        vec![
            (AlarmState::Idle, AlarmState::Armed),
            (AlarmState::Armed, AlarmState::Triggered),
            (AlarmState::Triggered, AlarmState::Armed),
            (AlarmState::Armed, AlarmState::Idle),
        ]
    );
    assert_eq!(rig.sink.triggers(), 1);
    assert!(!rig.feed.is_subscribed());
    assert!(!rig.audio.context_open());
}

#[test]
fn stop_while_prompting_abandons_the_start() {
    let mut rig = Rig::new();
    let (port, resolver) = PromptPermission::new();
    let gate = PermissionGate::new(port);
    let commands = CommandQueue::new();

    let platform = async {
        commands.send(SessionCommand::Start).await;
        until(|| resolver.prompts() == 1).await;
        commands.send(SessionCommand::Stop).await;
        settle().await;
        // The user answers the prompt after giving up on it.
        resolver.grant();
        settle().await;
        commands.send(SessionCommand::Close).await;
    };
    run_local(&mut rig.controller, &gate, &commands, &mut rig.sink, platform);

    assert_eq!(rig.controller.state(), AlarmState::Idle);
    assert_eq!(rig.feed.subscribe_count(), 0);
    assert!(rig.sink.transitions().is_empty());
    assert!(!gate.is_pending());
    assert_eq!(gate.state(), PermissionState::Unknown);
}

#[test]
fn close_while_prompting_ends_the_session() {
    let mut rig = Rig::new();
    let (port, resolver) = PromptPermission::new();
    let gate = PermissionGate::new(port);
    let commands = CommandQueue::new();

    let platform = async {
        commands.send(SessionCommand::Start).await;
        until(|| resolver.prompts() == 1).await;
        commands.send(SessionCommand::Close).await;
    };
    run_local(&mut rig.controller, &gate, &commands, &mut rig.sink, platform);
    resolver.grant();

    assert!(rig.controller.is_closed());
    assert_eq!(rig.controller.state(), AlarmState::Idle);
    assert_eq!(rig.feed.subscribe_count(), 0);
}

#[test]
fn sensitivity_can_change_while_prompt_is_open() {
    let mut rig = Rig::new();
    let (port, resolver) = PromptPermission::new();
    let gate = PermissionGate::new(port);
    let commands = CommandQueue::new();
    let feed = rig.feed.clone();

    let platform = async {
        commands.send(SessionCommand::Start).await;
        until(|| resolver.prompts() == 1).await;
        commands.send(SessionCommand::SetSensitivity(5.0)).await;
        settle().await;
        resolver.grant();
        until(|| feed.is_subscribed()).await;
        commands.send(SessionCommand::Close).await;
    };
    run_local(&mut rig.controller, &gate, &commands, &mut rig.sink, platform);

    assert_eq!(rig.controller.sensitivity().value(), 5.0);
    assert_eq!(rig.feed.subscribe_count(), 1);
}

#[test]
fn paced_replay_is_processed_in_order() {
    let mut rig = Rig::new();
    let gate = PermissionGate::new(AlwaysGranted);
    let commands = CommandQueue::new();
    let feed = rig.feed.clone();

    let platform = async {
        commands.send(SessionCommand::Start).await;
        until(|| feed.is_subscribed()).await;
        let accepted = feed
            .replay(
                &[(0.0, 0.0, 0.0), (0.5, 0.5, 0.5), (0.0, 0.0, 0.0)],
                Duration::from_millis(1),
            )
            .await;
        assert_eq!(accepted, 3);
        settle().await;
        commands.send(SessionCommand::Close).await;
    };
    run_local(&mut rig.controller, &gate, &commands, &mut rig.sink, platform);

    let t = rig.controller.build_telemetry();
    assert_eq!(t.samples_processed, 3);
    assert_eq!(t.trigger_count, 0);
    assert!((t.last_motion - 0.5).abs() < 1e-6);
}

#[test]
fn restart_after_abandoned_prompt_waits_for_a_fresh_answer() {
    let mut rig = Rig::new();
    let (port, resolver) = PromptPermission::new();
    let gate = PermissionGate::new(port);
    let commands = CommandQueue::new();
    let feed = rig.feed.clone();

    let platform = async {
        commands.send(SessionCommand::Start).await;
        until(|| resolver.prompts() == 1).await;
        commands.send(SessionCommand::Stop).await;
        settle().await;
        resolver.grant();

        commands.send(SessionCommand::Start).await;
        until(|| resolver.prompts() == 2).await;
        settle().await;
        // The grant meant for the first prompt must not arm this start.
        assert!(!feed.is_subscribed());

        resolver.deny();
        settle().await;
        assert!(!feed.is_subscribed());

        commands.send(SessionCommand::Start).await;
        until(|| resolver.prompts() == 3).await;
        resolver.grant();
        until(|| feed.is_subscribed()).await;
        commands.send(SessionCommand::Close).await;
    };
    run_local(&mut rig.controller, &gate, &commands, &mut rig.sink, platform);

    assert_eq!(rig.feed.subscribe_count(), 1);
    assert!(rig.sink.contains(&AlarmEvent::PermissionDenied));
    assert_eq!(
        rig.sink.transitions(),
        vec![
            (AlarmState::Idle, AlarmState::Armed),
            (AlarmState::Armed, AlarmState::Idle),
        ]
    );
}

#[test]
fn queued_command_is_handled_before_buffered_sample() {
    let mut rig = Rig::new();
    let gate = PermissionGate::new(AlwaysGranted);
    let commands = CommandQueue::new();
    let feed = rig.feed.clone();

    let platform = async {
        commands.send(SessionCommand::Start).await;
        until(|| feed.is_subscribed()).await;
        // Both land before the session runs again.
        assert!(feed.emit_xyz(9.0, 0.0, 0.0));
        assert!(commands.try_send(SessionCommand::Stop).is_ok());
        settle().await;
        commands.send(SessionCommand::Close).await;
    };
    run_local(&mut rig.controller, &gate, &commands, &mut rig.sink, platform);

    assert_eq!(rig.sink.triggers(), 0);
    assert_eq!(rig.audio.oscillators_created(), 0);
    assert_eq!(
        rig.sink.transitions(),
        vec![
            (AlarmState::Idle, AlarmState::Armed),
            (AlarmState::Armed, AlarmState::Idle),
        ]
    );
}
