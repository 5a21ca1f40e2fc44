//! Error types for change handling.

use std::fmt;
use std::path::PathBuf;

use revdiff_store::StoreError;
use revdiff_types::TypeError;
use serde::Serialize;
use thiserror::Error;

/// Coarse classification of a per-event failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    NotFound,
    BackendUnavailable,
    MalformedEvent,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotFound => "NotFound",
            Self::BackendUnavailable => "BackendUnavailable",
            Self::MalformedEvent => "MalformedEvent",
        };
        write!(f, "{s}")
    }
}

/// Errors from the content fetcher.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The object or the requested revision does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Transient I/O, network, or authorization failure.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
}

impl From<StoreError> for FetchError {
    fn from(err: StoreError) -> Self {
        if err.is_not_found() {
            Self::NotFound(err.to_string())
        } else {
            Self::BackendUnavailable(err.to_string())
        }
    }
}

pub type FetchResult<T> = Result<T, FetchError>;

/// Why a single change event ended in the `Failed` state.
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail")]
pub enum HandlerError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("malformed event: {0}")]
    MalformedEvent(String),
}

impl HandlerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::BackendUnavailable(_) => ErrorKind::BackendUnavailable,
            Self::MalformedEvent(_) => ErrorKind::MalformedEvent,
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            Self::NotFound(d) | Self::BackendUnavailable(d) | Self::MalformedEvent(d) => d,
        }
    }
}

impl From<FetchError> for HandlerError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::NotFound(d) => Self::NotFound(d),
            FetchError::BackendUnavailable(d) => Self::BackendUnavailable(d),
        }
    }
}

impl From<StoreError> for HandlerError {
    fn from(err: StoreError) -> Self {
        FetchError::from(err).into()
    }
}

impl From<TypeError> for HandlerError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::MalformedEvent(d) => Self::MalformedEvent(d),
            other => Self::MalformedEvent(other.to_string()),
        }
    }
}

/// Errors loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}
