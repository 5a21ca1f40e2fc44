use revdiff_types::{ContainerId, ObjectIdentifier, RevisionMarker};

/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object, or the requested revision of it, does not exist.
    #[error("object not found: {container}/{object} at {marker}")]
    NotFound {
        container: ContainerId,
        object: ObjectIdentifier,
        marker: RevisionMarker,
    },

    /// The container itself does not exist.
    #[error("container not found: {0}")]
    ContainerNotFound(ContainerId),

    /// The backend could not be reached or refused the request.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The object already has a revision with this marker.
    #[error("revision {marker} of {container}/{object} already exists")]
    DuplicateRevision {
        container: ContainerId,
        object: ObjectIdentifier,
        marker: String,
    },

    /// A name cannot be mapped onto the backend's namespace.
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Returns `true` if the error means the addressed data does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::ContainerNotFound(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
