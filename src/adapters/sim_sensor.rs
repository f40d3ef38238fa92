//! Scripted motion sensor adapter.
//!
//! Implements [`MotionSensorPort`] for hosts without an accelerometer
//! (desktop simulation, tests).  The port half is moved into the
//! controller; the [`MotionFeed`] half plays the platform callback,
//! pushing readings into whatever subscription is live.

use core::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use async_io_mini::Timer;
use log::debug;

use crate::app::ports::{MotionSensorPort, SubscriptionHandle};
use crate::error::SensorError;
use crate::sensors::sampler::{AxisReading, RawMotionReading, SampleSender};

/// Nominal spacing of generated timestamps (50 Hz).
const FEED_PERIOD_US: u64 = 20_000;

struct FeedState {
    available: bool,
    refuse_subscribe: bool,
    sender: Option<SampleSender>,
    handle: Option<SubscriptionHandle>,
    next_handle: u32,
    subscribes: u32,
    unsubscribes: u32,
    clock_us: u64,
}

/// Port half: owned by the sampler.
pub struct ScriptedMotionSensor {
    shared: Rc<RefCell<FeedState>>,
}

impl ScriptedMotionSensor {
    pub fn new() -> Self {
        Self {
            shared: Rc::new(RefCell::new(FeedState {
                available: true,
                refuse_subscribe: false,
                sender: None,
                handle: None,
                next_handle: 0,
                subscribes: 0,
                unsubscribes: 0,
                clock_us: 0,
            })),
        }
    }

    /// A device with no motion sensor at all.
    pub fn unavailable() -> Self {
        let sensor = Self::new();
        sensor.shared.borrow_mut().available = false;
        sensor
    }

    /// Platform-side handle for injecting readings.
    pub fn feed(&self) -> MotionFeed {
        MotionFeed {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl Default for ScriptedMotionSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionSensorPort for ScriptedMotionSensor {
    fn is_available(&self) -> bool {
        self.shared.borrow().available
    }

    fn subscribe(&mut self, sender: SampleSender) -> Result<SubscriptionHandle, SensorError> {
        let mut s = self.shared.borrow_mut();
        if !s.available {
            return Err(SensorError::Unavailable);
        }
        if s.refuse_subscribe {
            return Err(SensorError::SubscribeFailed);
        }
        s.next_handle += 1;
        let handle = SubscriptionHandle(s.next_handle);
        s.sender = Some(sender);
        s.handle = Some(handle);
        s.subscribes += 1;
        Ok(handle)
    }

    fn unsubscribe(&mut self, handle: SubscriptionHandle) -> Result<(), SensorError> {
        let mut s = self.shared.borrow_mut();
        if s.handle != Some(handle) {
            return Err(SensorError::UnknownHandle);
        }
        s.handle = None;
        s.unsubscribes += 1;
        // The sender is kept on purpose: a real platform may still fire a
        // queued callback after removal.
        Ok(())
    }
}

/// Platform-callback half.  Cheap to clone.
#[derive(Clone)]
pub struct MotionFeed {
    shared: Rc<RefCell<FeedState>>,
}

impl MotionFeed {
    /// Fire the platform callback once.  Returns whether the reading was
    /// accepted into the sample queue.
    pub fn emit(&self, reading: &RawMotionReading) -> bool {
        let sender = self.shared.borrow().sender.clone();
        match sender {
            Some(sender) => sender.deliver(reading),
            None => {
                debug!("MotionFeed: no listener, reading dropped");
                false
            }
        }
    }

    /// Fire the callback with a full with-gravity vector and a generated
    /// timestamp.
    pub fn emit_xyz(&self, x: f32, y: f32, z: f32) -> bool {
        let timestamp_us = {
            let mut s = self.shared.borrow_mut();
            s.clock_us += FEED_PERIOD_US;
            s.clock_us
        };
        self.emit(&RawMotionReading {
            including_gravity: Some(AxisReading::full(x, y, z)),
            linear: None,
            timestamp_us,
        })
    }

    /// Emit `readings` at a fixed interval on the async timer.  Returns the
    /// number accepted.
    pub async fn replay(&self, readings: &[(f32, f32, f32)], interval: Duration) -> usize {
        let mut accepted = 0;
        for &(x, y, z) in readings {
            Timer::after(interval).await;
            if self.emit_xyz(x, y, z) {
                accepted += 1;
            }
        }
        accepted
    }

    pub fn is_subscribed(&self) -> bool {
        self.shared.borrow().handle.is_some()
    }

    pub fn subscribe_count(&self) -> u32 {
        self.shared.borrow().subscribes
    }

    pub fn unsubscribe_count(&self) -> u32 {
        self.shared.borrow().unsubscribes
    }

    pub fn set_available(&self, available: bool) {
        self.shared.borrow_mut().available = available;
    }

    /// Make the platform reject subscriptions (e.g. revoked at OS level).
    pub fn refuse_subscribe(&self, refuse: bool) {
        self.shared.borrow_mut().refuse_subscribe = refuse;
    }
}
