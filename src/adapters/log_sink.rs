//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured alarm events through
//! the `log` facade.  A UI binding would implement the same trait.

use log::{info, warn};

use crate::app::events::AlarmEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AlarmEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AlarmEvent) {
        match event {
            AlarmEvent::Telemetry(t) => {
                info!(
                    "TELEM | state={:?} | motion={:.2} (last {:.2}) | sens={} | \
                     perm={:?} | samples={} dropped={} | triggers={} | siren={}",
                    t.state,
                    t.current_motion,
                    t.last_motion,
                    t.sensitivity,
                    t.permission,
                    t.samples_processed,
                    t.dropped_samples,
                    t.trigger_count,
                    if t.siren_sounding { "ON" } else { "off" },
                );
            }
            AlarmEvent::StateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            AlarmEvent::Triggered { motion, sensitivity } => {
                warn!("ALARM | motion={:.2} > sens={}", motion, sensitivity);
            }
            AlarmEvent::PermissionDenied => {
                warn!("PERM  | motion sensor permission denied");
            }
            AlarmEvent::SensorUnavailable => {
                warn!("SENSE | motion sensor unavailable");
            }
            AlarmEvent::StartDiscarded => {
                info!("START | discarded (session stopped meanwhile)");
            }
            AlarmEvent::SensitivityChanged(s) => {
                info!("SENS  | set to {}", s);
            }
            AlarmEvent::SensitivityRejected { requested, state } => {
                info!("SENS  | {} rejected in {:?}", requested, state);
            }
            AlarmEvent::SirenFault(e) => {
                warn!("SIREN | fault: {}", e);
            }
        }
    }
}
