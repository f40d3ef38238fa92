//! Cooperative session runtime.
//!
//! Drives a [`SessionController`] from two async sources on one
//! single-threaded executor:
//!
//! ```text
//! ┌─────────────┐ SessionCommand ┌──────────────────────────┐
//! │ host UI     │───────────────▶│                          │
//! └─────────────┘  CommandQueue  │  run_session             │
//! ┌─────────────┐  MotionSample  │  (commands win ties)     │──▶ EventSink
//! │ platform cb │───────────────▶│                          │
//! └─────────────┘  SampleQueue   └──────────────────────────┘
//! ```
//!
//! While a start waits on the permission prompt the loop keeps listening
//! for commands.  Stop or toggle abandons the pending start (the prompt's
//! eventual answer is dropped); close ends the session.

use core::future::Future;
use core::pin::pin;

use edge_executor::LocalExecutor;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use futures_lite::future::{block_on, or};
use log::{debug, info};

use crate::app::commands::SessionCommand;
use crate::app::ports::{AudioPort, EventSink, MotionSensorPort, PermissionPort};
use crate::app::service::{SessionController, StartTicket};
use crate::sensors::permission::{PermissionGate, PermissionState};
use crate::sensors::sampler::MotionSample;

/// Depth of the host → session command queue.
pub const COMMAND_QUEUE_DEPTH: usize = 8;

/// Host UI → session commands.
pub type CommandQueue = Channel<CriticalSectionRawMutex, SessionCommand, COMMAND_QUEUE_DEPTH>;

enum Wake {
    Command(SessionCommand),
    Sample(MotionSample),
}

enum PendingStart {
    Answered(PermissionState),
    Command(SessionCommand),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// Run until a [`SessionCommand::Close`] is received.
pub async fn run_session<S, A, P>(
    controller: &mut SessionController<S, A>,
    gate: &PermissionGate<P>,
    commands: &CommandQueue,
    sink: &mut impl EventSink,
) where
    S: MotionSensorPort,
    A: AudioPort,
    P: PermissionPort,
{
    let samples = controller.sample_queue();
    info!("Session loop running");

    loop {
        let wake = or(
            async { Wake::Command(commands.receive().await) },
            async { Wake::Sample(samples.pop().await) },
        )
        .await;

        match wake {
            Wake::Sample(sample) => controller.on_sample(&sample, sink),
            Wake::Command(cmd) => {
                debug!("Session command: {:?}", cmd);
                if let Some(ticket) = controller.handle_command(cmd, sink) {
                    if arm(controller, gate, commands, ticket, sink).await == Flow::Exit {
                        break;
                    }
                }
                if cmd == SessionCommand::Close {
                    break;
                }
            }
        }
    }

    info!("Session loop finished");
}

/// Wait for the permission answer while still honouring commands.
async fn arm<S, A, P>(
    controller: &mut SessionController<S, A>,
    gate: &PermissionGate<P>,
    commands: &CommandQueue,
    ticket: StartTicket,
    sink: &mut impl EventSink,
) -> Flow
where
    S: MotionSensorPort,
    A: AudioPort,
    P: PermissionPort,
{
    let mut request = pin!(gate.request());

    loop {
        let step = or(
            async { PendingStart::Answered(request.as_mut().await) },
            async { PendingStart::Command(commands.receive().await) },
        )
        .await;

        match step {
            PendingStart::Answered(permission) => {
                controller.complete_start(ticket, permission, sink);
                return Flow::Continue;
            }
            PendingStart::Command(SessionCommand::Close) => {
                info!("Close while awaiting permission");
                controller.close(sink);
                return Flow::Exit;
            }
            PendingStart::Command(SessionCommand::Stop | SessionCommand::ToggleActive) => {
                info!("Start abandoned while awaiting permission");
                controller.stop(sink);
                return Flow::Continue;
            }
            PendingStart::Command(SessionCommand::Start) => {
                debug!("Start already pending");
            }
            PendingStart::Command(cmd) => {
                let _ = controller.handle_command(cmd, sink);
            }
        }
    }
}

/// Run a session to completion on a local executor, alongside `platform`
/// (e.g. a sensor replay task).  Both are spawned as tasks so the
/// executor interleaves them; returns once the session loop has exited.
pub fn run_local<S, A, P, F>(
    controller: &mut SessionController<S, A>,
    gate: &PermissionGate<P>,
    commands: &CommandQueue,
    sink: &mut impl EventSink,
    platform: F,
) where
    S: MotionSensorPort,
    A: AudioPort,
    P: PermissionPort,
    F: Future<Output = ()>,
{
    let finished: Signal<CriticalSectionRawMutex, ()> = Signal::new();
    let executor: LocalExecutor<'_, 8> = LocalExecutor::new();

    executor
        .spawn(async {
            run_session(controller, gate, commands, sink).await;
            finished.signal(());
        })
        .detach();
    executor.spawn(platform).detach();

    block_on(executor.run(finished.wait()));
}
