//! The per-event change-handling state machine.
//!
//! ```text
//! Start -> FetchLatest -> ListRevisions -> Resolve -> FetchPrevious -> Diff -> Done
//!               |              |              |             |
//!               v              v              v (no prior)  v
//!             Failed         Failed          Done         Failed
//! ```
//!
//! Every state either succeeds or ends the event. There are no retries.

use std::fmt;
use std::sync::Arc;

use revdiff_diff::{diff_lines, DiffReport};
use revdiff_store::ObjectStore;
use revdiff_types::{ChangeEvent, Notification, NotificationRecord, RevisionMarker};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::HandlerConfig;
use crate::error::HandlerError;
use crate::fetcher::{ContentFetcher, Staging};
use crate::resolver::RevisionResolver;
use crate::sink::ReportSink;

// ---------------------------------------------------------------------------
// Stage / Outcome
// ---------------------------------------------------------------------------

/// States of the per-event state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Stage {
    Start,
    FetchLatest,
    ListRevisions,
    Resolve,
    FetchPrevious,
    Diff,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Start => "Start",
            Self::FetchLatest => "FetchLatest",
            Self::ListRevisions => "ListRevisions",
            Self::Resolve => "Resolve",
            Self::FetchPrevious => "FetchPrevious",
            Self::Diff => "Diff",
            Self::Done => "Done",
            Self::Failed => "Failed",
        };
        write!(f, "{s}")
    }
}

/// How one event ended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// Both payloads were fetched and diffed.
    Diffed {
        previous: RevisionMarker,
        ordering_verified: bool,
        report: DiffReport,
    },
    /// The object has no revision before the current one.
    NoPreviousVersion,
    /// The event stopped at `stage`.
    Failed { stage: Stage, error: HandlerError },
}

impl Outcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Terminal state of the state machine for this outcome.
    pub fn terminal_stage(&self) -> Stage {
        if self.is_failed() {
            Stage::Failed
        } else {
            Stage::Done
        }
    }
}

/// The result of handling one notification record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EventOutcome {
    /// The validated event; `None` if the record was malformed.
    pub event: Option<ChangeEvent>,
    /// States visited, in order, ending in `Done` or `Failed`.
    pub trace: Vec<Stage>,
    pub outcome: Outcome,
}

impl EventOutcome {
    /// `container/object` for log lines, or `<malformed>`.
    pub fn target(&self) -> String {
        match &self.event {
            Some(e) => format!("{}/{}", e.container, e.object),
            None => "<malformed>".into(),
        }
    }
}

/// Totals over a batch of outcomes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub diffed: usize,
    pub no_previous: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: &[EventOutcome]) -> Self {
        outcomes.iter().fold(Self::default(), |mut s, o| {
            s.total += 1;
            match o.outcome {
                Outcome::Diffed { .. } => s.diffed += 1,
                Outcome::NoPreviousVersion => s.no_previous += 1,
                Outcome::Failed { .. } => s.failed += 1,
            }
            s
        })
    }
}

// ---------------------------------------------------------------------------
// ChangeHandler
// ---------------------------------------------------------------------------

/// Drives fetch, resolve, fetch, diff for each change event.
///
/// The store handle is injected and shared read-only; all other state is
/// local to the event being handled.
pub struct ChangeHandler {
    store: Arc<dyn ObjectStore>,
    fetcher: ContentFetcher,
    resolver: RevisionResolver,
    sink: Box<dyn ReportSink>,
}

impl ChangeHandler {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        config: &HandlerConfig,
        sink: Box<dyn ReportSink>,
    ) -> Self {
        let fetcher = ContentFetcher::new(Arc::clone(&store), Staging::from_config(config));
        Self {
            store,
            fetcher,
            resolver: RevisionResolver::new(config.listing_order),
            sink,
        }
    }

    pub fn resolver(&self) -> &RevisionResolver {
        &self.resolver
    }

    /// Handle every record of a notification, in order.
    ///
    /// A failed or malformed record never stops the records after it.
    pub fn handle_notification(&self, notification: &Notification) -> Vec<EventOutcome> {
        info!(records = notification.len(), "handling notification batch");
        let outcomes: Vec<EventOutcome> = notification
            .records
            .iter()
            .map(|record| self.handle_record(record))
            .collect();

        let summary = BatchSummary::from_outcomes(&outcomes);
        info!(
            total = summary.total,
            diffed = summary.diffed,
            no_previous = summary.no_previous,
            failed = summary.failed,
            "notification batch handled"
        );
        outcomes
    }

    /// Validate one raw record and handle it.
    pub fn handle_record(&self, record: &NotificationRecord) -> EventOutcome {
        match ChangeEvent::try_from(record) {
            Ok(event) => self.handle_event(&event),
            Err(e) => {
                let outcome = EventOutcome {
                    event: None,
                    trace: vec![Stage::Start, Stage::Failed],
                    outcome: Outcome::Failed {
                        stage: Stage::Start,
                        error: e.into(),
                    },
                };
                self.sink.report(&outcome);
                outcome
            }
        }
    }

    /// Run the state machine for one event and report the outcome.
    pub fn handle_event(&self, event: &ChangeEvent) -> EventOutcome {
        debug!(
            container = %event.container,
            object = %event.object,
            source = event.source.as_deref().unwrap_or("unknown"),
            occurred_at = ?event.occurred_at,
            "handling change event"
        );

        let mut trace = vec![Stage::Start];
        let outcome = self
            .drive(event, &mut trace)
            .unwrap_or_else(|(stage, error)| Outcome::Failed { stage, error });
        trace.push(outcome.terminal_stage());

        let outcome = EventOutcome {
            event: Some(event.clone()),
            trace,
            outcome,
        };
        self.sink.report(&outcome);
        outcome
    }

    fn drive(
        &self,
        event: &ChangeEvent,
        trace: &mut Vec<Stage>,
    ) -> Result<Outcome, (Stage, HandlerError)> {
        let (container, object) = (&event.container, &event.object);

        trace.push(Stage::FetchLatest);
        let latest = self
            .fetcher
            .fetch(container, object, &RevisionMarker::current())
            .map_err(failed_at(Stage::FetchLatest))?;

        trace.push(Stage::ListRevisions);
        let revisions = self
            .store
            .list_revisions(container)
            .map_err(failed_at(Stage::ListRevisions))?;

        trace.push(Stage::Resolve);
        let Some(previous) = self.resolver.resolve(object, &revisions) else {
            return Ok(Outcome::NoPreviousVersion);
        };

        trace.push(Stage::FetchPrevious);
        let previous_text = self
            .fetcher
            .fetch(container, object, &previous.marker)
            .map_err(failed_at(Stage::FetchPrevious))?;

        trace.push(Stage::Diff);
        let report = diff_lines(&previous_text, &latest);
        Ok(Outcome::Diffed {
            previous: previous.marker,
            ordering_verified: previous.ordering_verified,
            report,
        })
    }
}

fn failed_at<E: Into<HandlerError>>(stage: Stage) -> impl FnOnce(E) -> (Stage, HandlerError) {
    move |e| (stage, e.into())
}

impl fmt::Debug for ChangeHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeHandler")
            .field("fetcher", &self.fetcher)
            .field("resolver", &self.resolver)
            .finish()
    }
}
