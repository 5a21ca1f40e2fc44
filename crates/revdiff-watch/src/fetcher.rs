use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::sync::Arc;

use revdiff_store::ObjectStore;
use revdiff_types::{ContainerId, ObjectIdentifier, RevisionMarker};
use tracing::debug;

use crate::config::HandlerConfig;
use crate::error::{FetchError, FetchResult};

/// How fetched payloads pass through the local filesystem.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Staging {
    /// Hand the payload straight to the caller.
    Disabled,
    /// Write the payload to a temporary file and read it back. The file is
    /// removed before `fetch` returns.
    TempFile { dir: Option<PathBuf> },
}

impl Staging {
    pub fn from_config(config: &HandlerConfig) -> Self {
        if config.staging {
            Self::TempFile {
                dir: config.staging_dir.clone(),
            }
        } else {
            Self::Disabled
        }
    }

    fn stage(&self, data: Vec<u8>) -> io::Result<Vec<u8>> {
        let dir = match self {
            Self::Disabled => return Ok(data),
            Self::TempFile { dir } => dir,
        };
        let mut file = match dir {
            Some(dir) => tempfile::NamedTempFile::new_in(dir)?,
            None => tempfile::NamedTempFile::new()?,
        };
        file.write_all(&data)?;
        file.flush()?;
        file.seek(SeekFrom::Start(0))?;

        let mut staged = Vec::with_capacity(data.len());
        file.read_to_end(&mut staged)?;
        debug!(path = %file.path().display(), bytes = staged.len(), "payload staged");
        Ok(staged)
    }
}

/// Retrieves object payloads as text.
///
/// Payloads are decoded as UTF-8; invalid sequences are replaced rather
/// than rejected.
pub struct ContentFetcher {
    store: Arc<dyn ObjectStore>,
    staging: Staging,
}

impl ContentFetcher {
    pub fn new(store: Arc<dyn ObjectStore>, staging: Staging) -> Self {
        Self { store, staging }
    }

    pub fn staging(&self) -> &Staging {
        &self.staging
    }

    /// Fetch `object` at `marker`; a current marker reads the current payload.
    pub fn fetch(
        &self,
        container: &ContainerId,
        object: &ObjectIdentifier,
        marker: &RevisionMarker,
    ) -> FetchResult<String> {
        let data = self.store.get_object(container, object, marker)?;
        let data = self
            .staging
            .stage(data)
            .map_err(|e| FetchError::BackendUnavailable(format!("staging failed: {e}")))?;

        debug!(%container, %object, %marker, bytes = data.len(), "fetched payload");
        Ok(match String::from_utf8(data) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })
    }
}

impl std::fmt::Debug for ContentFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentFetcher")
            .field("staging", &self.staging)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use revdiff_store::InMemoryObjectStore;

    use super::*;

    fn bucket() -> ContainerId {
        ContainerId::new("bucket").unwrap()
    }

    fn key() -> ObjectIdentifier {
        ObjectIdentifier::new("notes.txt").unwrap()
    }

    fn seeded() -> Arc<InMemoryObjectStore> {
        let store = Arc::new(InMemoryObjectStore::new());
        store.put_revision(&bucket(), &key(), "v1", "first\n").unwrap();
        store.put_revision(&bucket(), &key(), "v2", "second\n").unwrap();
        store
    }

    #[test]
    fn fetch_current_and_revision() {
        let fetcher = ContentFetcher::new(seeded(), Staging::Disabled);
        assert_eq!(
            fetcher.fetch(&bucket(), &key(), &RevisionMarker::current()).unwrap(),
            "second\n"
        );
        assert_eq!(
            fetcher.fetch(&bucket(), &key(), &RevisionMarker::new("v1")).unwrap(),
            "first\n"
        );
    }

    #[test]
    fn staged_fetch_returns_same_payload_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let staging = Staging::TempFile {
            dir: Some(dir.path().to_path_buf()),
        };
        let fetcher = ContentFetcher::new(seeded(), staging);

        let text = fetcher.fetch(&bucket(), &key(), &RevisionMarker::current()).unwrap();
        assert_eq!(text, "second\n");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn staging_into_missing_dir_is_backend_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let staging = Staging::TempFile {
            dir: Some(dir.path().join("does-not-exist")),
        };
        let fetcher = ContentFetcher::new(seeded(), staging);

        let err = fetcher
            .fetch(&bucket(), &key(), &RevisionMarker::current())
            .unwrap_err();
        assert!(matches!(err, FetchError::BackendUnavailable(_)));
    }

    #[test]
    fn missing_marker_is_not_found() {
        let fetcher = ContentFetcher::new(seeded(), Staging::Disabled);
        let err = fetcher
            .fetch(&bucket(), &key(), &RevisionMarker::new("v9"))
            .unwrap_err();
        assert!(matches!(err, FetchError::NotFound(_)));
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let store = Arc::new(InMemoryObjectStore::new());
        store.put_revision(&bucket(), &key(), "v1", vec![b'o', b'k', 0xFF]).unwrap();
        let fetcher = ContentFetcher::new(store, Staging::Disabled);

        let text = fetcher.fetch(&bucket(), &key(), &RevisionMarker::current()).unwrap();
        assert_eq!(text, "ok\u{FFFD}");
    }

    #[test]
    fn staging_follows_config() {
        let mut config = HandlerConfig::default();
        assert_eq!(Staging::from_config(&config), Staging::TempFile { dir: None });
        config.staging = false;
        assert_eq!(Staging::from_config(&config), Staging::Disabled);
    }
}
