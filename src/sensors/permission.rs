//! Permission gate for motion-sensor access.
//!
//! Wraps a [`PermissionPort`] and adds three behaviours on top of it:
//!
//! - **Implicit grant**: platforms without a request API resolve to
//!   `Granted` immediately, without touching the port.
//! - **Caching**: once granted, later requests answer from the cache.
//! - **Coalescing**: while one request is in flight, concurrent callers
//!   wait for its outcome instead of prompting the user a second time.
//!
//! Anything other than an explicit `Granted` (an `Unknown` answer, a
//! platform error) is treated as denial.
//!
//! The gate is single-threaded (`RefCell`, not a mutex): every caller
//! lives on the same cooperative executor as the session controller.

use core::cell::RefCell;
use core::task::{Poll, Waker};

use futures_lite::future::poll_fn;
use log::{info, warn};

use crate::app::ports::PermissionPort;

/// Outcome of the platform capability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionState {
    #[default]
    Unknown,
    Granted,
    Denied,
}

struct GateInner {
    state: PermissionState,
    in_flight: bool,
    /// Bumped every time an in-flight request resolves.
    completions: u64,
    last_outcome: PermissionState,
    waiters: Vec<Waker>,
}

/// Caching, coalescing front for a [`PermissionPort`].
pub struct PermissionGate<P> {
    port: P,
    inner: RefCell<GateInner>,
}

impl<P: PermissionPort> PermissionGate<P> {
    pub fn new(port: P) -> Self {
        Self {
            port,
            inner: RefCell::new(GateInner {
                state: PermissionState::Unknown,
                in_flight: false,
                completions: 0,
                last_outcome: PermissionState::Unknown,
                waiters: Vec::new(),
            }),
        }
    }

    /// Last known answer.
    pub fn state(&self) -> PermissionState {
        self.inner.borrow().state
    }

    /// Whether a platform request is currently outstanding.
    pub fn is_pending(&self) -> bool {
        self.inner.borrow().in_flight
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    /// Resolve the permission, prompting the platform at most once for
    /// any number of concurrent callers.
    pub async fn request(&self) -> PermissionState {
        loop {
            let seen = {
                let mut inner = self.inner.borrow_mut();
                if inner.state == PermissionState::Granted {
                    return PermissionState::Granted;
                }
                if !self.port.requires_request() {
                    info!("Permission: implicitly granted");
                    inner.state = PermissionState::Granted;
                    return PermissionState::Granted;
                }
                if !inner.in_flight {
                    inner.in_flight = true;
                    break;
                }
                inner.completions
            };

            // Someone else is asking; wait for their answer.
            let outcome = poll_fn(|cx| {
                let mut inner = self.inner.borrow_mut();
                if inner.completions != seen {
                    return Poll::Ready(Some(inner.last_outcome));
                }
                if !inner.in_flight {
                    // The asker was dropped before the platform answered.
                    return Poll::Ready(None);
                }
                if !inner.waiters.iter().any(|w| w.will_wake(cx.waker())) {
                    inner.waiters.push(cx.waker().clone());
                }
                Poll::Pending
            })
            .await;

            if let Some(outcome) = outcome {
                return outcome;
            }
        }

        let guard = InFlight { gate: self, done: false };
        info!("Permission: requesting from platform");
        let outcome = match self.port.request_permission().await {
            Ok(PermissionState::Granted) => PermissionState::Granted,
            Ok(other) => {
                info!("Permission: platform answered {:?}", other);
                PermissionState::Denied
            }
            Err(e) => {
                warn!("Permission: request failed: {}", e);
                PermissionState::Denied
            }
        };
        guard.complete(outcome);
        outcome
    }

    fn finish(&self, outcome: Option<PermissionState>) {
        let waiters = {
            let mut inner = self.inner.borrow_mut();
            inner.in_flight = false;
            if let Some(outcome) = outcome {
                inner.state = outcome;
                inner.last_outcome = outcome;
                inner.completions = inner.completions.wrapping_add(1);
            }
            core::mem::take(&mut inner.waiters)
        };
        for w in waiters {
            w.wake();
        }
    }
}

/// Clears the in-flight flag if the asking future is dropped mid-request,
/// so a waiter can take over.
struct InFlight<'a, P: PermissionPort> {
    gate: &'a PermissionGate<P>,
    done: bool,
}

impl<P: PermissionPort> InFlight<'_, P> {
    fn complete(mut self, outcome: PermissionState) {
        self.done = true;
        self.gate.finish(Some(outcome));
    }
}

impl<P: PermissionPort> Drop for InFlight<'_, P> {
    fn drop(&mut self) {
        if !self.done {
            self.gate.finish(None);
        }
    }
}
