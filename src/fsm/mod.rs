//! Function-pointer finite state machine engine.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │  StateTable                                                │
//! │  ┌───────────┬───────────┬──────────┬───────────────────┐  │
//! │  │ AlarmState│ on_enter  │ on_exit  │ on_update         │  │
//! │  ├───────────┼───────────┼──────────┼───────────────────┤  │
//! │  │ Idle      │ fn(ctx)   │ -        │ -                 │  │
//! │  │ Armed     │ fn(ctx)   │ -        │ fn(ctx)->Option<> │  │
//! │  │ Triggered │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> │  │
//! │  └───────────┴───────────┴──────────┴───────────────────┘  │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine is ticked once per processed motion sample.  Each tick it
//! calls `on_update` for the **current** state, if it has one.  If that
//! returns `Some(next)`, the engine runs `on_exit` for the current state,
//! then `on_enter` for the next, and updates the current pointer.  Command
//! driven edges (start, stop, stop-alarm, close) use
//! [`Fsm::force_transition`].

pub mod context;
pub mod states;

use context::FsmContext;
use log::info;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Session lifecycle state.
/// Must stay in sync with the table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum AlarmState {
    /// Not monitoring; no subscription, no siren.
    #[default]
    Idle = 0,
    /// Subscribed and evaluating each sample against the threshold.
    Armed = 1,
    /// Threshold crossed; siren sounding until stopped.
    Triggered = 2,
}

impl AlarmState {
    /// Total number of states; sizes the table array.
    pub const COUNT: usize = 3;

    /// Convert an index back to `AlarmState`.  Panics on out-of-range in
    /// debug builds; returns `Idle` in release (safe fallback).
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Idle,
            1 => Self::Armed,
            2 => Self::Triggered,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Idle
            }
        }
    }

    /// Armed or Triggered.
    pub fn is_active(self) -> bool {
        self != Self::Idle
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
pub type StateActionFn = fn(&mut FsmContext);

/// Signature for the per-sample update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut FsmContext) -> Option<AlarmState>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single FSM state.
pub struct StateDescriptor {
    pub id: AlarmState,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: Option<StateUpdateFn>,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine.
pub struct Fsm {
    /// Fixed-size table indexed by `AlarmState as usize`.
    table: [StateDescriptor; AlarmState::COUNT],
    current: usize,
    /// Samples processed (wraps at u64::MAX).
    tick_count: u64,
    /// Tick at which the current state was entered.
    state_entry_tick: u64,
}

impl Fsm {
    pub fn new(table: [StateDescriptor; AlarmState::COUNT], initial: AlarmState) -> Self {
        Self {
            table,
            current: initial as usize,
            tick_count: 0,
            state_entry_tick: 0,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first `tick()`.
    pub fn start(&mut self, ctx: &mut FsmContext) {
        info!("FSM starting in state: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance by one sample.  Returns the new state if a transition ran.
    pub fn tick(&mut self, ctx: &mut FsmContext) -> Option<AlarmState> {
        self.tick_count = self.tick_count.wrapping_add(1);
        ctx.samples_in_state = self.tick_count.wrapping_sub(self.state_entry_tick);
        ctx.total_samples = self.tick_count;

        let update = self.table[self.current].on_update?;
        let next = update(ctx)?;
        self.transition(next, ctx);
        Some(next)
    }

    /// Force an immediate transition.  No-op if already in `next`.
    pub fn force_transition(&mut self, next: AlarmState, ctx: &mut FsmContext) -> bool {
        if next as usize == self.current {
            return false;
        }
        self.transition(next, ctx);
        true
    }

    pub fn current_state(&self) -> AlarmState {
        AlarmState::from_index(self.current)
    }

    /// How many samples the FSM has processed in the current state.
    pub fn ticks_in_current_state(&self) -> u64 {
        self.tick_count.wrapping_sub(self.state_entry_tick)
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next: AlarmState, ctx: &mut FsmContext) {
        let next_idx = next as usize;

        info!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;
        self.state_entry_tick = self.tick_count;
        ctx.samples_in_state = 0;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
