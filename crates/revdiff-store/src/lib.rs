//! Versioned object storage for revdiff.
//!
//! This crate is the storage boundary of the system. The change handler
//! only ever talks to an [`ObjectStore`]: it reads payloads by
//! `(container, object, marker)` and lists revisions per container.
//!
//! # Storage Backends
//!
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and embedding
//! - [`DirectoryObjectStore`] -- versioned buckets laid out on local disk
//!
//! # Design Rules
//!
//! 1. Stores are shared read-only by the handler; writes happen out of band.
//! 2. Revision listings keep backend order. Nothing re-sorts them.
//! 3. All I/O errors are propagated, never silently ignored.

pub mod directory;
pub mod error;
pub mod memory;
pub mod traits;

pub use directory::DirectoryObjectStore;
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryObjectStore;
pub use traits::ObjectStore;
