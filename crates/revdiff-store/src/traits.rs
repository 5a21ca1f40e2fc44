use revdiff_types::{ContainerId, ObjectIdentifier, RevisionMarker, RevisionRecord};

use crate::error::StoreResult;

/// Versioned object storage as seen by the change handler.
///
/// All implementations must satisfy these invariants:
/// - Reading with a current marker returns the object's current payload.
/// - `list_revisions` returns the records in the backend's own order.
///   Callers must not assume that order is chronological.
/// - Both operations are read-only.
/// - Missing data is reported as [`StoreError::NotFound`] or
///   [`StoreError::ContainerNotFound`], never as an empty payload.
///
/// [`StoreError::NotFound`]: crate::StoreError::NotFound
/// [`StoreError::ContainerNotFound`]: crate::StoreError::ContainerNotFound
pub trait ObjectStore: Send + Sync {
    /// Read the payload of `object` at `marker`.
    fn get_object(
        &self,
        container: &ContainerId,
        object: &ObjectIdentifier,
        marker: &RevisionMarker,
    ) -> StoreResult<Vec<u8>>;

    /// List every revision of every object in `container`.
    fn list_revisions(&self, container: &ContainerId) -> StoreResult<Vec<RevisionRecord>>;

    /// List the revisions of a single object, preserving backend order.
    ///
    /// Default implementation filters [`Self::list_revisions`]. Backends
    /// with a per-key listing may override it.
    fn list_object_revisions(
        &self,
        container: &ContainerId,
        object: &ObjectIdentifier,
    ) -> StoreResult<Vec<RevisionRecord>> {
        Ok(self
            .list_revisions(container)?
            .into_iter()
            .filter(|r| r.is_for(object))
            .collect())
    }
}
