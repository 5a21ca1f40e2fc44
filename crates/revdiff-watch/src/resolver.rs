//! Previous-revision resolution over a backend revision listing.
//!
//! Backend listings carry no ordering guarantee, so the caller states what
//! it knows about the order through [`ListingOrder`]. The positional modes
//! never re-sort: they pick an index of the listing filtered to the target
//! object, in backend order.

use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

use revdiff_types::{ObjectIdentifier, RevisionMarker, RevisionRecord};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// What the caller knows about the order of a revision listing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListingOrder {
    /// Guaranteed latest-first: the previous revision is entry 1.
    LatestFirst,
    /// No guarantee. Entry 1 is still taken, but the result is flagged as
    /// resting on an unverified ordering.
    #[default]
    Unverified,
    /// Guaranteed oldest-first: the previous revision is the second-to-last entry.
    OldestFirst,
    /// Ignore position; use `last_modified` timestamps instead.
    ByTimestamp,
}

impl ListingOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LatestFirst => "latest-first",
            Self::Unverified => "unverified",
            Self::OldestFirst => "oldest-first",
            Self::ByTimestamp => "by-timestamp",
        }
    }

    /// Returns `true` if this mode does not depend on an unchecked assumption.
    pub fn is_verified(&self) -> bool {
        !matches!(self, Self::Unverified)
    }
}

impl fmt::Display for ListingOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListingOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "latest-first" => Ok(Self::LatestFirst),
            "unverified" => Ok(Self::Unverified),
            "oldest-first" => Ok(Self::OldestFirst),
            "by-timestamp" => Ok(Self::ByTimestamp),
            other => Err(format!("unknown listing order: {other}")),
        }
    }
}

/// The revision selected as immediately preceding the current one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PreviousRevision {
    pub marker: RevisionMarker,
    /// `false` when the choice relied on an unverified listing order.
    pub ordering_verified: bool,
}

/// Selects the previous revision of an object from a revision listing.
///
/// Read-only over the listing. Fewer than two records for the object means
/// there is no previous revision, which is not an error.
#[derive(Clone, Copy, Debug, Default)]
pub struct RevisionResolver {
    order: ListingOrder,
}

impl RevisionResolver {
    pub fn new(order: ListingOrder) -> Self {
        Self { order }
    }

    pub fn order(&self) -> ListingOrder {
        self.order
    }

    pub fn resolve(
        &self,
        object: &ObjectIdentifier,
        revisions: &[RevisionRecord],
    ) -> Option<PreviousRevision> {
        let matching: Vec<&RevisionRecord> =
            revisions.iter().filter(|r| r.is_for(object)).collect();
        debug!(
            %object,
            candidates = matching.len(),
            listed = revisions.len(),
            order = %self.order,
            "resolving previous revision"
        );

        if matching.len() < 2 {
            return None;
        }

        let record = match self.order {
            ListingOrder::LatestFirst => matching[1],
            ListingOrder::Unverified => {
                if matching[0].is_latest == Some(false) {
                    warn!(%object, "listing head is not flagged as latest; entry 1 may not be the previous revision");
                } else {
                    warn!(%object, "previous revision chosen from an unverified listing order");
                }
                matching[1]
            }
            ListingOrder::OldestFirst => matching[matching.len() - 2],
            ListingOrder::ByTimestamp => previous_by_timestamp(&matching)?,
        };

        Some(PreviousRevision {
            marker: record.marker.clone(),
            ordering_verified: self.order.is_verified(),
        })
    }
}

/// The record with the largest timestamp strictly below the latest one.
/// Records without a timestamp are ignored; ties go to backend order.
fn previous_by_timestamp<'a>(records: &[&'a RevisionRecord]) -> Option<&'a RevisionRecord> {
    let latest = records.iter().filter_map(|r| r.last_modified).max()?;
    records
        .iter()
        .copied()
        .filter(|r| r.last_modified.is_some_and(|t| t < latest))
        .min_by_key(|r| Reverse(r.last_modified))
}

/// Marker of the revision before the current one, or `None` if there is none.
pub fn resolve_previous(
    object: &ObjectIdentifier,
    revisions: &[RevisionRecord],
    order: ListingOrder,
) -> Option<RevisionMarker> {
    RevisionResolver::new(order)
        .resolve(object, revisions)
        .map(|p| p.marker)
}
