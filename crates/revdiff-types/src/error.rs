use thiserror::Error;

/// Errors produced by type construction and parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("malformed event: {0}")]
    MalformedEvent(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
