use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::handler::{EventOutcome, Outcome};

/// Receives one outcome per handled event.
pub trait ReportSink: Send + Sync {
    fn report(&self, outcome: &EventOutcome);
}

impl<T: ReportSink + ?Sized> ReportSink for Arc<T> {
    fn report(&self, outcome: &EventOutcome) {
        (**self).report(outcome)
    }
}

/// Logs each outcome through `tracing`: one line per event, with the
/// rendered diff attached to successful ones.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn report(&self, outcome: &EventOutcome) {
        let target = outcome.target();
        match &outcome.outcome {
            Outcome::Diffed {
                previous,
                ordering_verified,
                report,
            } => info!(
                event = %target,
                previous = %previous,
                ordering_verified,
                summary = %report.render_summary(),
                "diff computed\n{report}"
            ),
            Outcome::NoPreviousVersion => info!(event = %target, "no previous version"),
            Outcome::Failed { stage, error } => warn!(
                event = %target,
                %stage,
                kind = %error.kind(),
                reason = %error,
                "event failed"
            ),
        }
    }
}

/// Keeps every outcome in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    outcomes: Mutex<Vec<EventOutcome>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the outcomes reported so far.
    pub fn outcomes(&self) -> Vec<EventOutcome> {
        self.outcomes
            .lock()
            .map(|o| o.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.outcomes.lock().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ReportSink for CollectingSink {
    fn report(&self, outcome: &EventOutcome) {
        if let Ok(mut outcomes) = self.outcomes.lock() {
            outcomes.push(outcome.clone());
        }
    }
}
