//! Concrete state handler functions and table builder.
//!
//! Each state is defined by plain `fn` pointers: no closures, no dynamic
//! dispatch, no heap.
//!
//! ```text
//!            start (permission granted, sensor subscribed)
//!  IDLE ─────────────────────────────────────────────────▶ ARMED
//!    ▲                                                      │  ▲
//!    │                                  [motion > threshold]│  │ stop_alarm
//!    │                                                      ▼  │
//!    └──────────────── stop / close ◀────────────────── TRIGGERED
//! ```
//!
//! Only `Armed → Triggered` is taken from `on_update`; every other edge
//! is a command and goes through [`Fsm::force_transition`](super::Fsm::force_transition).
//! Triggered is latched: further samples never leave it.

use super::context::{FsmContext, SubsystemCommands};
use super::{AlarmState, StateDescriptor};
use crate::sensors::detector::detect;
use log::{info, warn};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once per controller.
pub fn build_state_table() -> [StateDescriptor; AlarmState::COUNT] {
    [
        // Index 0 — Idle
        StateDescriptor {
            id: AlarmState::Idle,
            name: "Idle",
            on_enter: Some(idle_enter),
            on_exit: None,
            // Samples are not delivered while Idle.
            on_update: None,
        },
        // Index 1 — Armed
        StateDescriptor {
            id: AlarmState::Armed,
            name: "Armed",
            on_enter: Some(armed_enter),
            on_exit: None,
            on_update: Some(armed_update),
        },
        // Index 2 — Triggered
        StateDescriptor {
            id: AlarmState::Triggered,
            name: "Triggered",
            on_enter: Some(triggered_enter),
            on_exit: Some(triggered_exit),
            on_update: Some(triggered_update),
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE state
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(ctx: &mut FsmContext) {
    ctx.commands = SubsystemCommands::all_off();
    ctx.trigger_motion = None;
    info!("IDLE: monitoring off");
}

// ═══════════════════════════════════════════════════════════════════════════
//  ARMED state — subscribed, evaluating every sample
// ═══════════════════════════════════════════════════════════════════════════

fn armed_enter(ctx: &mut FsmContext) {
    ctx.commands.sampling = true;
    ctx.commands.siren = false;
    ctx.trigger_motion = None;
    info!("ARMED: monitoring at sensitivity {}", ctx.sensitivity);
}

fn armed_update(ctx: &mut FsmContext) -> Option<AlarmState> {
    if detect(ctx.reading.motion, ctx.sensitivity) {
        warn!(
            "ARMED: motion {:.2} > {} → triggering",
            ctx.reading.motion, ctx.sensitivity
        );
        ctx.trigger_motion = Some(ctx.reading.motion);
        return Some(AlarmState::Triggered);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  TRIGGERED state — siren sounding until dismissed
// ═══════════════════════════════════════════════════════════════════════════

fn triggered_enter(ctx: &mut FsmContext) {
    ctx.commands.sampling = true;
    ctx.commands.siren = true;
    warn!("TRIGGERED: siren on");
}

fn triggered_exit(ctx: &mut FsmContext) {
    ctx.commands.siren = false;
    info!("TRIGGERED: siren off on state exit");
}

fn triggered_update(_ctx: &mut FsmContext) -> Option<AlarmState> {
    // Latched.  Samples keep the display fresh but never re-evaluate.
    None
}
