//! Permission adapters.
//!
//! - [`AlwaysGranted`]: platforms with no request API.
//! - [`PromptPermission`]: platforms that show a user-facing prompt.  The
//!   request suspends until the paired [`PromptResolver`] answers, the way
//!   a UI thread answers a dialog.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use log::info;

use crate::app::ports::PermissionPort;
use crate::error::PermissionError;
use crate::sensors::permission::PermissionState;

/// No gating: access is implicitly granted.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysGranted;

impl PermissionPort for AlwaysGranted {
    fn requires_request(&self) -> bool {
        false
    }

    async fn request_permission(&self) -> Result<PermissionState, PermissionError> {
        Ok(PermissionState::Granted)
    }
}

/// What the user (or platform) answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptAnswer {
    Granted,
    Denied,
    /// The request API threw.
    Failed,
}

struct PromptShared {
    answer: Signal<CriticalSectionRawMutex, PromptAnswer>,
    prompts: AtomicU32,
}

/// Gated platform: each request shows a prompt and waits.
pub struct PromptPermission {
    shared: Arc<PromptShared>,
}

impl PromptPermission {
    pub fn new() -> (Self, PromptResolver) {
        let shared = Arc::new(PromptShared {
            answer: Signal::new(),
            prompts: AtomicU32::new(0),
        });
        (
            Self {
                shared: Arc::clone(&shared),
            },
            PromptResolver { shared },
        )
    }
}

impl PermissionPort for PromptPermission {
    fn requires_request(&self) -> bool {
        true
    }

    async fn request_permission(&self) -> Result<PermissionState, PermissionError> {
        // An answer to an abandoned prompt must not resolve this one.
        self.shared.answer.reset();
        let n = self.shared.prompts.fetch_add(1, Ordering::Relaxed) + 1;
        info!("Permission prompt #{} shown", n);
        match self.shared.answer.wait().await {
            PromptAnswer::Granted => Ok(PermissionState::Granted),
            PromptAnswer::Denied => Ok(PermissionState::Denied),
            PromptAnswer::Failed => Err(PermissionError::PlatformError),
        }
    }
}

/// Answers the pending prompt.  Answers given while no prompt is shown
/// are discarded when the next one opens.
#[derive(Clone)]
pub struct PromptResolver {
    shared: Arc<PromptShared>,
}

impl PromptResolver {
    pub fn grant(&self) {
        self.shared.answer.signal(PromptAnswer::Granted);
    }

    pub fn deny(&self) {
        self.shared.answer.signal(PromptAnswer::Denied);
    }

    pub fn fail(&self) {
        self.shared.answer.signal(PromptAnswer::Failed);
    }

    /// Prompts shown so far.
    pub fn prompts(&self) -> u32 {
        self.shared.prompts.load(Ordering::Relaxed)
    }
}
