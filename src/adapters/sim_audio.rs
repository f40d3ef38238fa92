//! In-memory audio graph adapter.
//!
//! Implements [`AudioPort`] without producing sound: every call is
//! recorded as an [`AudioOp`] and node lifetimes are tracked so callers
//! can assert how many oscillators are audible.  Used by the host
//! simulation and the test suite.
//!
//! The adapter is moved into the siren; keep a [`SimAudioProbe`] (from
//! [`SimAudio::probe`]) to inspect it, drive the clock and inject
//! failures afterwards.

use core::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::app::ports::{AudioPort, AudioTarget, NodeId};
use crate::config::Waveform;
use crate::error::AudioError;

/// One recorded call.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioOp {
    CreateContext,
    Resume,
    CloseContext,
    CreateOscillator { id: NodeId, waveform: Waveform, hz: f32 },
    CreateGain { id: NodeId, gain: f32 },
    SetFrequencyAt { node: NodeId, hz: f32, at: f64 },
    RampFrequencyTo { node: NodeId, hz: f32, at: f64 },
    Connect { node: NodeId, target: AudioTarget },
    Disconnect(NodeId),
    Start(NodeId),
    Stop(NodeId),
}

/// Where to inject a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    CreateContext,
    CreateOscillator,
    CreateGain,
    Connect,
    Start,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Oscillator { started: bool, stopped: bool },
    Gain,
}

#[derive(Default)]
struct SimAudioState {
    context_open: bool,
    suspended: bool,
    start_suspended: bool,
    contexts_created: u32,
    oscillators_created: u32,
    clock: f64,
    next_node: u32,
    nodes: HashMap<NodeId, NodeKind>,
    ops: Vec<AudioOp>,
    fail: Option<FailPoint>,
}

impl SimAudioState {
    fn require_context(&self) -> Result<(), AudioError> {
        if self.context_open {
            Ok(())
        } else {
            Err(AudioError::ContextUnavailable)
        }
    }

    fn failing(&self, point: FailPoint) -> bool {
        self.fail == Some(point)
    }

    fn add_node(&mut self, kind: NodeKind) -> NodeId {
        self.next_node += 1;
        let id = NodeId(self.next_node);
        self.nodes.insert(id, kind);
        id
    }
}

/// Recording [`AudioPort`].
pub struct SimAudio {
    shared: Rc<RefCell<SimAudioState>>,
}

impl SimAudio {
    pub fn new() -> Self {
        Self {
            shared: Rc::new(RefCell::new(SimAudioState::default())),
        }
    }

    /// A platform whose autoplay policy creates contexts suspended.
    pub fn suspended() -> Self {
        let sim = Self::new();
        sim.shared.borrow_mut().start_suspended = true;
        sim
    }

    pub fn probe(&self) -> SimAudioProbe {
        SimAudioProbe {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl Default for SimAudio {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioPort for SimAudio {
    fn create_context(&mut self) -> Result<(), AudioError> {
        let mut s = self.shared.borrow_mut();
        if s.failing(FailPoint::CreateContext) {
            return Err(AudioError::ContextUnavailable);
        }
        s.ops.push(AudioOp::CreateContext);
        s.context_open = true;
        s.suspended = s.start_suspended;
        s.contexts_created += 1;
        Ok(())
    }

    fn is_suspended(&self) -> bool {
        let s = self.shared.borrow();
        s.context_open && s.suspended
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        let mut s = self.shared.borrow_mut();
        s.require_context()?;
        s.ops.push(AudioOp::Resume);
        s.suspended = false;
        Ok(())
    }

    fn close_context(&mut self) -> Result<(), AudioError> {
        let mut s = self.shared.borrow_mut();
        if !s.context_open {
            return Err(AudioError::AlreadyReleased);
        }
        s.ops.push(AudioOp::CloseContext);
        s.context_open = false;
        s.nodes.clear();
        Ok(())
    }

    fn current_time(&self) -> f64 {
        self.shared.borrow().clock
    }

    fn create_oscillator(&mut self, waveform: Waveform, frequency_hz: f32) -> Result<NodeId, AudioError> {
        let mut s = self.shared.borrow_mut();
        s.require_context()?;
        if s.failing(FailPoint::CreateOscillator) {
            return Err(AudioError::NodeCreationFailed);
        }
        let id = s.add_node(NodeKind::Oscillator {
            started: false,
            stopped: false,
        });
        s.oscillators_created += 1;
        s.ops.push(AudioOp::CreateOscillator {
            id,
            waveform,
            hz: frequency_hz,
        });
        Ok(id)
    }

    fn create_gain(&mut self, gain: f32) -> Result<NodeId, AudioError> {
        let mut s = self.shared.borrow_mut();
        s.require_context()?;
        if s.failing(FailPoint::CreateGain) {
            return Err(AudioError::NodeCreationFailed);
        }
        let id = s.add_node(NodeKind::Gain);
        s.ops.push(AudioOp::CreateGain { id, gain });
        Ok(id)
    }

    fn set_frequency_at(&mut self, oscillator: NodeId, hz: f32, at: f64) -> Result<(), AudioError> {
        let mut s = self.shared.borrow_mut();
        s.require_context()?;
        s.ops.push(AudioOp::SetFrequencyAt {
            node: oscillator,
            hz,
            at,
        });
        Ok(())
    }

    fn ramp_frequency_to(&mut self, oscillator: NodeId, hz: f32, at: f64) -> Result<(), AudioError> {
        let mut s = self.shared.borrow_mut();
        s.require_context()?;
        s.ops.push(AudioOp::RampFrequencyTo {
            node: oscillator,
            hz,
            at,
        });
        Ok(())
    }

    fn connect(&mut self, node: NodeId, target: AudioTarget) -> Result<(), AudioError> {
        let mut s = self.shared.borrow_mut();
        s.require_context()?;
        if s.failing(FailPoint::Connect) {
            return Err(AudioError::ConnectFailed);
        }
        s.ops.push(AudioOp::Connect { node, target });
        Ok(())
    }

    fn disconnect(&mut self, node: NodeId) -> Result<(), AudioError> {
        let mut s = self.shared.borrow_mut();
        if s.nodes.remove(&node).is_none() {
            return Err(AudioError::AlreadyReleased);
        }
        s.ops.push(AudioOp::Disconnect(node));
        Ok(())
    }

    fn start(&mut self, oscillator: NodeId) -> Result<(), AudioError> {
        let mut s = self.shared.borrow_mut();
        s.require_context()?;
        if s.failing(FailPoint::Start) {
            return Err(AudioError::ScheduleFailed);
        }
        match s.nodes.get_mut(&oscillator) {
            Some(NodeKind::Oscillator { started, .. }) if !*started => *started = true,
            _ => return Err(AudioError::ScheduleFailed),
        }
        s.ops.push(AudioOp::Start(oscillator));
        Ok(())
    }

    fn stop(&mut self, oscillator: NodeId) -> Result<(), AudioError> {
        let mut s = self.shared.borrow_mut();
        let failing = s.failing(FailPoint::Stop);
        match s.nodes.get_mut(&oscillator) {
            Some(NodeKind::Oscillator { started: true, stopped }) if !*stopped => {
                // A failed stop still silences: the platform drops the node.
                *stopped = true;
            }
            _ => return Err(AudioError::AlreadyReleased),
        }
        if failing {
            return Err(AudioError::ScheduleFailed);
        }
        s.ops.push(AudioOp::Stop(oscillator));
        Ok(())
    }
}

/// Inspection and control handle for a [`SimAudio`].
#[derive(Clone)]
pub struct SimAudioProbe {
    shared: Rc<RefCell<SimAudioState>>,
}

impl SimAudioProbe {
    pub fn ops(&self) -> Vec<AudioOp> {
        self.shared.borrow().ops.clone()
    }

    /// Oscillators started and not yet stopped.
    pub fn sounding(&self) -> usize {
        self.shared
            .borrow()
            .nodes
            .values()
            .filter(|k| {
                matches!(
                    k,
                    NodeKind::Oscillator {
                        started: true,
                        stopped: false
                    }
                )
            })
            .count()
    }

    /// Nodes created and not yet disconnected.
    pub fn live_nodes(&self) -> usize {
        self.shared.borrow().nodes.len()
    }

    pub fn contexts_created(&self) -> u32 {
        self.shared.borrow().contexts_created
    }

    pub fn oscillators_created(&self) -> u32 {
        self.shared.borrow().oscillators_created
    }

    pub fn context_open(&self) -> bool {
        self.shared.borrow().context_open
    }

    pub fn is_suspended(&self) -> bool {
        let s = self.shared.borrow();
        s.context_open && s.suspended
    }

    /// Set the audio clock (seconds).
    pub fn set_time(&self, secs: f64) {
        self.shared.borrow_mut().clock = secs;
    }

    /// Make every call at `point` fail until cleared with `None`.
    pub fn fail_at(&self, point: Option<FailPoint>) {
        self.shared.borrow_mut().fail = point;
    }
}
