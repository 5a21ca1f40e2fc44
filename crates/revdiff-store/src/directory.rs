use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use revdiff_types::{ContainerId, ObjectIdentifier, RevisionMarker, RevisionRecord};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::ObjectStore;

const LISTING_FILE: &str = "revisions.json";
const OBJECTS_DIR: &str = "objects";
const REVISIONS_DIR: &str = "revisions";
const CURRENT_FILE: &str = "current";

/// Hex digits per path component; well under the usual 255-byte name limit.
const SEGMENT_LEN: usize = 200;
/// Suffix of every component except the last of a split name. Never a hex
/// digit, so a split prefix cannot collide with a complete short name.
const CONTINUED: char = '+';

/// Versioned buckets laid out on local disk.
///
/// ```text
/// <root>/<container>/revisions.json                          listing, backend order
/// <root>/<container>/objects/<hex(object)>/current           current payload
/// <root>/<container>/objects/<hex(object)>/revisions/<hex(marker)>
/// ```
///
/// Keys and markers are hex-encoded on disk so that arbitrary keys
/// (including ones with `/`) are safe path names. Long encodings are split
/// into components of at most [`SEGMENT_LEN`] digits, all but the last
/// ending in `+`. The listing file is read verbatim, so hand-edited
/// listings keep whatever order they were written in.
#[derive(Clone, Debug)]
pub struct DirectoryObjectStore {
    root: PathBuf,
}

impl DirectoryObjectStore {
    /// Open a store rooted at `root`. The directory is created if missing.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        debug!(root = %root.display(), "directory store opened");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Record a new revision of `object` and make it the current payload.
    ///
    /// The new record is placed at the head of the listing. The marker must
    /// be non-empty and not already used by `object`. The revision payload
    /// is written first, then the listing, then `current`, so `current`
    /// never points past what the listing knows about.
    pub fn put_revision(
        &self,
        container: &ContainerId,
        object: &ObjectIdentifier,
        marker: &str,
        data: &[u8],
    ) -> StoreResult<()> {
        if marker.is_empty() {
            return Err(StoreError::InvalidName("revision marker must not be empty".into()));
        }
        let container_dir = self.container_dir(container)?;
        fs::create_dir_all(&container_dir)?;

        let mut listing = self.read_listing(&container_dir)?;
        if listing
            .iter()
            .any(|r| r.is_for(object) && r.marker.token() == Some(marker))
        {
            return Err(StoreError::DuplicateRevision {
                container: container.clone(),
                object: object.clone(),
                marker: marker.to_string(),
            });
        }

        let object_dir = object_dir(&container_dir, object);
        let revision_file = object_dir.join(REVISIONS_DIR).join(encoded_path(marker));
        if let Some(parent) = revision_file.parent() {
            fs::create_dir_all(parent)?;
        }
        write_atomic(&revision_file, data)?;

        for record in listing.iter_mut().filter(|r| r.is_for(object)) {
            record.is_latest = Some(false);
        }
        listing.insert(
            0,
            RevisionRecord::new(object.clone(), marker)
                .with_is_latest(true)
                .with_last_modified(Utc::now()),
        );
        self.write_listing(&container_dir, &listing)?;

        write_atomic(&object_dir.join(CURRENT_FILE), data)?;

        debug!(%container, %object, marker, bytes = data.len(), "revision recorded");
        Ok(())
    }

    fn container_dir(&self, container: &ContainerId) -> StoreResult<PathBuf> {
        let name = container.as_str();
        if name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(StoreError::InvalidName(format!(
                "container name {name:?} is not a single path component"
            )));
        }
        Ok(self.root.join(name))
    }

    fn read_listing(&self, container_dir: &Path) -> StoreResult<Vec<RevisionRecord>> {
        match fs::read(container_dir.join(LISTING_FILE)) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| StoreError::Serialization(e.to_string())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_listing(&self, container_dir: &Path, listing: &[RevisionRecord]) -> StoreResult<()> {
        let json = serde_json::to_vec_pretty(listing)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        write_atomic(&container_dir.join(LISTING_FILE), &json)
    }
}

fn object_dir(container_dir: &Path, object: &ObjectIdentifier) -> PathBuf {
    container_dir
        .join(OBJECTS_DIR)
        .join(encoded_path(object.as_str()))
}

/// Hex-encode `name` into a relative path of bounded-length components.
fn encoded_path(name: &str) -> PathBuf {
    let hex = hex::encode(name);
    let mut path = PathBuf::new();
    let mut rest = hex.as_str();
    while rest.len() > SEGMENT_LEN {
        let (head, tail) = rest.split_at(SEGMENT_LEN);
        path.push(format!("{head}{CONTINUED}"));
        rest = tail;
    }
    path.push(rest);
    path
}

/// Write through a temp file in the same directory, then rename into place.
fn write_atomic(path: &Path, data: &[u8]) -> StoreResult<()> {
    let dir = path
        .parent()
        .ok_or_else(|| StoreError::InvalidName(format!("{} has no parent", path.display())))?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

impl ObjectStore for DirectoryObjectStore {
    fn get_object(
        &self,
        container: &ContainerId,
        object: &ObjectIdentifier,
        marker: &RevisionMarker,
    ) -> StoreResult<Vec<u8>> {
        let container_dir = self.container_dir(container)?;
        if !container_dir.is_dir() {
            return Err(StoreError::ContainerNotFound(container.clone()));
        }
        let object_dir = object_dir(&container_dir, object);
        let path = match marker.token() {
            None => object_dir.join(CURRENT_FILE),
            Some(token) => object_dir.join(REVISIONS_DIR).join(encoded_path(token)),
        };

        match fs::read(&path) {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StoreError::NotFound {
                container: container.clone(),
                object: object.clone(),
                marker: marker.clone(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    fn list_revisions(&self, container: &ContainerId) -> StoreResult<Vec<RevisionRecord>> {
        let container_dir = self.container_dir(container)?;
        if !container_dir.is_dir() {
            return Err(StoreError::ContainerNotFound(container.clone()));
        }
        self.read_listing(&container_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket() -> ContainerId {
        ContainerId::new("docs").unwrap()
    }

    fn key(k: &str) -> ObjectIdentifier {
        ObjectIdentifier::new(k).unwrap()
    }

    #[test]
    fn put_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryObjectStore::open(dir.path()).unwrap();
        store.put_revision(&bucket(), &key("notes/a.txt"), "v1", b"one\n").unwrap();
        store.put_revision(&bucket(), &key("notes/a.txt"), "v2", b"two\n").unwrap();

        let current = store
            .get_object(&bucket(), &key("notes/a.txt"), &RevisionMarker::current())
            .unwrap();
        assert_eq!(current, b"two\n");

        let old = store
            .get_object(&bucket(), &key("notes/a.txt"), &RevisionMarker::new("v1"))
            .unwrap();
        assert_eq!(old, b"one\n");
    }

    #[test]
    fn listing_persists_latest_first() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = DirectoryObjectStore::open(dir.path()).unwrap();
            store.put_revision(&bucket(), &key("a"), "v1", b"1").unwrap();
            store.put_revision(&bucket(), &key("a"), "v2", b"2").unwrap();
        }

        let reopened = DirectoryObjectStore::open(dir.path()).unwrap();
        let listing = reopened.list_revisions(&bucket()).unwrap();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].marker.token(), Some("v2"));
        assert_eq!(listing[0].is_latest, Some(true));
        assert_eq!(listing[1].marker.token(), Some("v1"));
        assert_eq!(listing[1].is_latest, Some(false));
        assert!(listing.iter().all(|r| r.last_modified.is_some()));
    }

    #[test]
    fn hand_written_listing_order_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryObjectStore::open(dir.path()).unwrap();
        fs::create_dir_all(dir.path().join("docs")).unwrap();
        fs::write(
            dir.path().join("docs").join(LISTING_FILE),
            r#"[{"object_id":"a","marker":"v1"},{"object_id":"a","marker":"v3"}]"#,
        )
        .unwrap();

        let listing = store.list_revisions(&bucket()).unwrap();
        let markers: Vec<_> = listing.iter().filter_map(|r| r.marker.token()).collect();
        assert_eq!(markers, vec!["v1", "v3"]);
    }

    #[test]
    fn missing_object_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryObjectStore::open(dir.path()).unwrap();
        store.put_revision(&bucket(), &key("a"), "v1", b"1").unwrap();

        let err = store
            .get_object(&bucket(), &key("b"), &RevisionMarker::current())
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn missing_container_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryObjectStore::open(dir.path()).unwrap();
        let err = store.list_revisions(&bucket()).unwrap_err();
        assert!(matches!(err, StoreError::ContainerNotFound(_)));
    }

    #[test]
    fn container_without_listing_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryObjectStore::open(dir.path()).unwrap();
        fs::create_dir_all(dir.path().join("docs")).unwrap();
        assert!(store.list_revisions(&bucket()).unwrap().is_empty());
    }

    #[test]
    fn path_like_container_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryObjectStore::open(dir.path()).unwrap();
        let bad = ContainerId::new("../escape").unwrap();
        let err = store.list_revisions(&bad).unwrap_err();
        assert!(matches!(err, StoreError::InvalidName(_)));
    }

    #[test]
    fn empty_marker_rejected_on_put() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryObjectStore::open(dir.path()).unwrap();
        let err = store.put_revision(&bucket(), &key("a"), "", b"x").unwrap_err();
        assert!(matches!(err, StoreError::InvalidName(_)));
    }

    #[test]
    fn maximum_length_key_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryObjectStore::open(dir.path()).unwrap();
        let long = key(&"k".repeat(1024));
        let long_marker = "m".repeat(300);
        store.put_revision(&bucket(), &long, &long_marker, b"one\n").unwrap();
        store.put_revision(&bucket(), &long, "v2", b"two\n").unwrap();

        let current = store
            .get_object(&bucket(), &long, &RevisionMarker::current())
            .unwrap();
        assert_eq!(current, b"two\n");
        let old = store
            .get_object(&bucket(), &long, &RevisionMarker::new(long_marker.as_str()))
            .unwrap();
        assert_eq!(old, b"one\n");
    }

    #[test]
    fn missing_long_key_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryObjectStore::open(dir.path()).unwrap();
        store.put_revision(&bucket(), &key("a"), "v1", b"1").unwrap();

        let err = store
            .get_object(&bucket(), &key(&"k".repeat(1024)), &RevisionMarker::current())
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
        assert!(err.is_not_found());

        let err = store
            .get_object(&bucket(), &key("a"), &RevisionMarker::new("m".repeat(1024)))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn split_key_does_not_shadow_its_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryObjectStore::open(dir.path()).unwrap();
        // 100 bytes encode to exactly one full component.
        let short = key(&"p".repeat(100));
        let long = key(&"p".repeat(150));
        store.put_revision(&bucket(), &short, "v1", b"short").unwrap();
        store.put_revision(&bucket(), &long, "v1", b"long").unwrap();

        let read = |k: &ObjectIdentifier| {
            store.get_object(&bucket(), k, &RevisionMarker::current()).unwrap()
        };
        assert_eq!(read(&short), b"short");
        assert_eq!(read(&long), b"long");
    }

    #[test]
    fn encoded_path_components_are_bounded() {
        let path = encoded_path(&"x".repeat(1024));
        let parts: Vec<_> = path.iter().map(|c| c.to_string_lossy().into_owned()).collect();
        assert_eq!(parts.len(), 11);
        assert!(parts.iter().all(|p| p.len() <= SEGMENT_LEN + 1));
        assert!(parts[..10].iter().all(|p| p.ends_with(CONTINUED)));
        assert!(!parts[10].ends_with(CONTINUED));
        assert_eq!(encoded_path("a"), PathBuf::from("61"));
    }

    #[test]
    fn duplicate_marker_rejected_on_put() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryObjectStore::open(dir.path()).unwrap();
        store.put_revision(&bucket(), &key("a"), "v1", b"one").unwrap();

        let err = store.put_revision(&bucket(), &key("a"), "v1", b"again").unwrap_err();
        assert!(matches!(err, StoreError::DuplicateRevision { .. }));
        assert_eq!(store.list_revisions(&bucket()).unwrap().len(), 1);
        let data = store
            .get_object(&bucket(), &key("a"), &RevisionMarker::new("v1"))
            .unwrap();
        assert_eq!(data, b"one");

        store.put_revision(&bucket(), &key("b"), "v1", b"other").unwrap();
    }

    #[test]
    fn failed_listing_update_leaves_current_alone() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryObjectStore::open(dir.path()).unwrap();
        store.put_revision(&bucket(), &key("a"), "v1", b"one").unwrap();

        let listing = dir.path().join("docs").join(LISTING_FILE);
        fs::remove_file(&listing).unwrap();
        fs::create_dir(&listing).unwrap();

        assert!(store.put_revision(&bucket(), &key("a"), "v2", b"two").is_err());
        let current = store
            .get_object(&bucket(), &key("a"), &RevisionMarker::current())
            .unwrap();
        assert_eq!(current, b"one");
    }

    #[test]
    fn corrupt_listing_is_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryObjectStore::open(dir.path()).unwrap();
        fs::create_dir_all(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs").join(LISTING_FILE), "not json").unwrap();

        let err = store.list_revisions(&bucket()).unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }
}
