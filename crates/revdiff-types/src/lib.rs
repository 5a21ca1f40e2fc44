//! Foundation types for revdiff.
//!
//! Every other revdiff crate depends on `revdiff-types`. The types here are
//! transient: they live for the processing of a single change event.
//!
//! # Key Types
//!
//! - [`ContainerId`] -- Namespace holding objects (a bucket)
//! - [`ObjectIdentifier`] -- Opaque key naming an object within a container
//! - [`RevisionMarker`] -- Opaque version token; empty means "current"
//! - [`RevisionRecord`] -- One entry of a backend revision listing
//! - [`ChangeEvent`] -- A validated storage-change notification
//! - [`Notification`] -- Wire format of a batch of change notifications

pub mod error;
pub mod event;
pub mod object;
pub mod revision;

pub use error::TypeError;
pub use event::{ChangeEvent, Notification, NotificationRecord};
pub use object::{ContainerId, ObjectIdentifier, RevisionMarker};
pub use revision::RevisionRecord;
