//! Change handling for revdiff.
//!
//! Reacts to storage-change notifications: for each changed object it
//! fetches the current payload, resolves the revision immediately before
//! it, fetches that payload, and reports a line diff between the two.
//!
//! # Key Types
//!
//! - [`ChangeHandler`] -- per-event state machine and batch driver
//! - [`RevisionResolver`] / [`ListingOrder`] -- previous-revision selection
//! - [`ContentFetcher`] / [`Staging`] -- payload retrieval
//! - [`ReportSink`] -- where per-event outcomes go
//!
//! Events are handled one at a time. Each event owns its payloads and
//! report; a failure ends that event only, never the batch.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod handler;
pub mod resolver;
pub mod sink;

pub use config::{HandlerConfig, RevdiffConfig, StoreConfig};
pub use error::{ConfigError, ErrorKind, FetchError, FetchResult, HandlerError};
pub use fetcher::{ContentFetcher, Staging};
pub use handler::{BatchSummary, ChangeHandler, EventOutcome, Outcome, Stage};
pub use resolver::{resolve_previous, ListingOrder, PreviousRevision, RevisionResolver};
pub use sink::{CollectingSink, ReportSink, TracingSink};
