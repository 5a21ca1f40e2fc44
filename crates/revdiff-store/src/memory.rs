use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use revdiff_types::{ContainerId, ObjectIdentifier, RevisionMarker, RevisionRecord};

use crate::error::{StoreError, StoreResult};
use crate::traits::ObjectStore;

#[derive(Default)]
struct Container {
    /// Revision listing in the order `list_revisions` reports it.
    listing: Vec<RevisionRecord>,
    current: HashMap<ObjectIdentifier, Vec<u8>>,
    versions: HashMap<(ObjectIdentifier, String), Vec<u8>>,
}

/// In-memory, HashMap-based versioned object store.
///
/// Intended for tests and embedding. New revisions are listed latest-first,
/// the way typical versioned buckets report them; [`Self::set_listing`]
/// replaces the listing verbatim to model backends that do not.
pub struct InMemoryObjectStore {
    containers: RwLock<HashMap<ContainerId, Container>>,
    unavailable: AtomicBool,
}

impl InMemoryObjectStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            containers: RwLock::new(HashMap::new()),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Record a new revision of `object` and make it the current payload.
    ///
    /// The marker must be non-empty and not already used by `object`.
    pub fn put_revision(
        &self,
        container: &ContainerId,
        object: &ObjectIdentifier,
        marker: &str,
        data: impl Into<Vec<u8>>,
    ) -> StoreResult<()> {
        if marker.is_empty() {
            return Err(StoreError::InvalidName("revision marker must not be empty".into()));
        }
        let data = data.into();
        let mut map = self.write_lock()?;
        let entry = map.entry(container.clone()).or_default();

        if entry.versions.contains_key(&(object.clone(), marker.to_string())) {
            return Err(StoreError::DuplicateRevision {
                container: container.clone(),
                object: object.clone(),
                marker: marker.to_string(),
            });
        }

        for record in entry.listing.iter_mut().filter(|r| r.is_for(object)) {
            record.is_latest = Some(false);
        }
        let record = RevisionRecord::new(object.clone(), marker)
            .with_is_latest(true)
            .with_last_modified(Utc::now());
        entry.listing.insert(0, record);

        entry
            .versions
            .insert((object.clone(), marker.to_string()), data.clone());
        entry.current.insert(object.clone(), data);
        Ok(())
    }

    /// Replace the revision listing of `container` verbatim.
    ///
    /// Payloads are untouched; records that point at unknown revisions will
    /// produce `NotFound` when fetched.
    pub fn set_listing(
        &self,
        container: &ContainerId,
        listing: Vec<RevisionRecord>,
    ) -> StoreResult<()> {
        let mut map = self.write_lock()?;
        map.entry(container.clone()).or_default().listing = listing;
        Ok(())
    }

    /// Simulate a backend outage: every call fails with `BackendUnavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of containers currently stored.
    pub fn container_count(&self) -> usize {
        self.containers.read().map(|m| m.len()).unwrap_or(0)
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::BackendUnavailable("store marked unavailable".into()));
        }
        Ok(())
    }

    fn read_lock(&self) -> StoreResult<RwLockReadGuard<'_, HashMap<ContainerId, Container>>> {
        self.check_available()?;
        self.containers
            .read()
            .map_err(|_| StoreError::BackendUnavailable("lock poisoned".into()))
    }

    fn write_lock(&self) -> StoreResult<RwLockWriteGuard<'_, HashMap<ContainerId, Container>>> {
        self.containers
            .write()
            .map_err(|_| StoreError::BackendUnavailable("lock poisoned".into()))
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn get_object(
        &self,
        container: &ContainerId,
        object: &ObjectIdentifier,
        marker: &RevisionMarker,
    ) -> StoreResult<Vec<u8>> {
        let map = self.read_lock()?;
        let entry = map
            .get(container)
            .ok_or_else(|| StoreError::ContainerNotFound(container.clone()))?;

        let payload = match marker.token() {
            None => entry.current.get(object),
            Some(token) => entry.versions.get(&(object.clone(), token.to_string())),
        };

        payload.cloned().ok_or_else(|| StoreError::NotFound {
            container: container.clone(),
            object: object.clone(),
            marker: marker.clone(),
        })
    }

    fn list_revisions(&self, container: &ContainerId) -> StoreResult<Vec<RevisionRecord>> {
        let map = self.read_lock()?;
        map.get(container)
            .map(|c| c.listing.clone())
            .ok_or_else(|| StoreError::ContainerNotFound(container.clone()))
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("container_count", &self.container_count())
            .field("unavailable", &self.unavailable.load(Ordering::SeqCst))
            .finish()
    }
}
