use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::object::{ObjectIdentifier, RevisionMarker};

/// One entry of a backend revision listing.
///
/// Listings are returned in backend order, which is not guaranteed to be
/// chronological. `is_latest` and `last_modified` are carried when the
/// backend reports them but nothing requires them to be present.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionRecord {
    pub object_id: ObjectIdentifier,
    pub marker: RevisionMarker,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_latest: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
}

impl RevisionRecord {
    /// A record with only the required attributes.
    pub fn new(object_id: ObjectIdentifier, marker: impl Into<RevisionMarker>) -> Self {
        Self {
            object_id,
            marker: marker.into(),
            is_latest: None,
            last_modified: None,
        }
    }

    pub fn with_last_modified(mut self, at: DateTime<Utc>) -> Self {
        self.last_modified = Some(at);
        self
    }

    pub fn with_is_latest(mut self, is_latest: bool) -> Self {
        self.is_latest = Some(is_latest);
        self
    }

    /// Returns `true` if this record belongs to `object`.
    pub fn is_for(&self, object: &ObjectIdentifier) -> bool {
        &self.object_id == object
    }
}
