//! Motion sampler — platform callback to bounded sample queue.
//!
//! The platform invokes its motion callback at a native, variable rate
//! (commonly tens of Hz), possibly from another thread.  The callback
//! hands a [`RawMotionReading`] to the [`SampleSender`], which normalises
//! it into a [`MotionSample`] and pushes it into a bounded
//! `embassy-sync` channel.  The controller is the single consumer.
//!
//! ```text
//! ┌──────────────────┐  RawMotionReading  ┌─────────────┐  MotionSample  ┌────────────┐
//! │ platform callback│───────────────────▶│ SampleQueue │──────────────▶│ Controller │
//! │ (any thread)     │   zero-substitute  │ drop-oldest │  single reader │            │
//! └──────────────────┘                    └─────────────┘                └────────────┘
//! ```
//!
//! Only the most recent motion matters for triggering, so a full queue
//! evicts its oldest sample rather than rejecting the new one.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use log::{debug, info, warn};

use crate::app::ports::{MotionSensorPort, SubscriptionHandle};
use crate::config::SAMPLE_QUEUE_DEPTH;
use crate::error::SensorError;

// ---------------------------------------------------------------------------
// Sample types
// ---------------------------------------------------------------------------

/// One accelerometer reading (m/s², gravity included), ready for processing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionSample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Platform timestamp (µs, monotonic).
    pub captured_at_us: u64,
}

impl MotionSample {
    pub fn new(x: f32, y: f32, z: f32, captured_at_us: u64) -> Self {
        Self { x, y, z, captured_at_us }
    }
}

/// Per-axis values as the platform reports them; any axis may be absent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisReading {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub z: Option<f32>,
}

impl AxisReading {
    pub fn full(x: f32, y: f32, z: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            z: Some(z),
        }
    }
}

/// What the platform motion callback delivers.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawMotionReading {
    /// Acceleration including gravity (preferred).
    pub including_gravity: Option<AxisReading>,
    /// Acceleration without gravity (fallback on devices lacking the above).
    pub linear: Option<AxisReading>,
    pub timestamp_us: u64,
}

impl RawMotionReading {
    /// Normalise into a [`MotionSample`].
    ///
    /// Prefers the with-gravity vector, falls back to the linear one.
    /// Missing or non-finite axes become `0.0`; a reading with no vector at
    /// all becomes an all-zero sample.  The sample is never skipped.
    pub fn normalise(&self) -> MotionSample {
        let axes = self.including_gravity.or(self.linear).unwrap_or_default();
        let axis = |v: Option<f32>| v.filter(|v| v.is_finite()).unwrap_or(0.0);
        MotionSample {
            x: axis(axes.x),
            y: axis(axes.y),
            z: axis(axes.z),
            captured_at_us: self.timestamp_us,
        }
    }
}

// ---------------------------------------------------------------------------
// SampleQueue
// ---------------------------------------------------------------------------

/// Bounded single-consumer sample queue with drop-oldest overflow.
///
/// `accepting` is raised on subscribe and lowered on unsubscribe so a
/// platform callback that fires after removal cannot leak samples into
/// an Idle session.
pub struct SampleQueue {
    channel: Channel<CriticalSectionRawMutex, MotionSample, SAMPLE_QUEUE_DEPTH>,
    accepting: AtomicBool,
    dropped: AtomicU32,
}

impl SampleQueue {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
            accepting: AtomicBool::new(false),
            dropped: AtomicU32::new(0),
        }
    }

    /// Push a sample.  Returns `false` if the queue is not accepting.
    pub fn push(&self, sample: MotionSample) -> bool {
        if !self.accepting.load(Ordering::Acquire) {
            return false;
        }
        match self.channel.try_send(sample) {
            Ok(()) => true,
            Err(TrySendError::Full(sample)) => {
                // Evict the oldest; the newest motion is what matters.
                let _ = self.channel.try_receive();
                self.dropped.fetch_add(1, Ordering::Relaxed);
                if self.channel.try_send(sample).is_err() {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                }
                true
            }
        }
    }

    /// Pop the next sample without waiting.
    pub fn try_pop(&self) -> Option<MotionSample> {
        self.channel.try_receive().ok()
    }

    /// Wait for the next sample.
    pub async fn pop(&self) -> MotionSample {
        self.channel.receive().await
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    /// Samples evicted by overflow since construction.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::Acquire)
    }

    fn set_accepting(&self, on: bool) {
        self.accepting.store(on, Ordering::Release);
    }

    /// Discard everything queued.
    fn clear(&self) {
        while self.channel.try_receive().is_ok() {}
    }
}

impl Default for SampleQueue {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// SampleSender
// ---------------------------------------------------------------------------

/// Producer handle given to the platform adapter on subscribe.
///
/// `Send + Sync`; cloning is cheap.
#[derive(Clone)]
pub struct SampleSender {
    queue: Arc<SampleQueue>,
}

impl SampleSender {
    /// Normalise and enqueue one platform reading.
    pub fn deliver(&self, reading: &RawMotionReading) -> bool {
        self.queue.push(reading.normalise())
    }

    /// Enqueue an already-complete sample.
    pub fn deliver_sample(&self, sample: MotionSample) -> bool {
        self.queue.push(sample)
    }
}

// ---------------------------------------------------------------------------
// MotionSampler
// ---------------------------------------------------------------------------

/// Owns the sensor port and the live subscription, if any.
pub struct MotionSampler<S> {
    port: S,
    queue: Arc<SampleQueue>,
    handle: Option<SubscriptionHandle>,
}

impl<S: MotionSensorPort> MotionSampler<S> {
    pub fn new(port: S) -> Self {
        Self {
            port,
            queue: Arc::new(SampleQueue::new()),
            handle: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.port.is_available()
    }

    /// Subscribe to the platform stream.  No-op if already subscribed.
    ///
    /// Callers must have a Granted permission.
    pub fn subscribe(&mut self) -> Result<SubscriptionHandle, SensorError> {
        if let Some(handle) = self.handle {
            return Ok(handle);
        }
        if !self.port.is_available() {
            return Err(SensorError::Unavailable);
        }
        self.queue.clear();
        self.queue.set_accepting(true);
        let sender = SampleSender {
            queue: Arc::clone(&self.queue),
        };
        match self.port.subscribe(sender) {
            Ok(handle) => {
                info!("Sampler: subscribed ({:?})", handle);
                self.handle = Some(handle);
                Ok(handle)
            }
            Err(e) => {
                self.queue.set_accepting(false);
                warn!("Sampler: subscribe failed: {}", e);
                Err(e)
            }
        }
    }

    /// Release the subscription.  Always leaves the sampler unsubscribed;
    /// platform release errors are logged, never propagated.
    pub fn unsubscribe(&mut self) {
        self.queue.set_accepting(false);
        self.queue.clear();
        let Some(handle) = self.handle.take() else {
            return;
        };
        match self.port.unsubscribe(handle) {
            Ok(()) => info!("Sampler: unsubscribed ({:?})", handle),
            Err(e) => warn!("Sampler: unsubscribe of {:?} failed: {}", handle, e),
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.handle.is_some()
    }

    /// Next queued sample, if any.
    pub fn try_next(&self) -> Option<MotionSample> {
        let sample = self.queue.try_pop();
        if let Some(s) = &sample {
            debug!("Sampler: sample @{}us", s.captured_at_us);
        }
        sample
    }

    /// Shared queue handle (for async consumers).
    pub fn queue(&self) -> Arc<SampleQueue> {
        Arc::clone(&self.queue)
    }

    pub fn port(&self) -> &S {
        &self.port
    }
}
