use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::resolver::ListingOrder;

/// Configuration for the change handler.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlerConfig {
    /// What the backend's revision listing order can be relied on for.
    pub listing_order: ListingOrder,
    /// Stage every fetched payload through a temporary file.
    pub staging: bool,
    /// Directory for staged payloads. `None` uses the system temp dir.
    pub staging_dir: Option<PathBuf>,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            listing_order: ListingOrder::Unverified,
            staging: true,
            staging_dir: None,
        }
    }
}

/// Where the directory-backed store lives.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub root: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
        }
    }
}

/// Top-level configuration file.
///
/// ```toml
/// [store]
/// root = "/var/lib/revdiff"
///
/// [handler]
/// listing_order = "latest-first"
/// staging = false
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevdiffConfig {
    pub store: StoreConfig,
    pub handler: HandlerConfig,
}

impl RevdiffConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = RevdiffConfig::default();
        assert_eq!(c.handler.listing_order, ListingOrder::Unverified);
        assert!(c.handler.staging);
        assert!(c.handler.staging_dir.is_none());
        assert_eq!(c.store.root, PathBuf::from("."));
    }

    #[test]
    fn parse_full_file() {
        let c = RevdiffConfig::from_toml_str(
            r#"
            [store]
            root = "/srv/buckets"

            [handler]
            listing_order = "by-timestamp"
            staging = false
            staging_dir = "/tmp/revdiff"
            "#,
        )
        .unwrap();
        assert_eq!(c.store.root, PathBuf::from("/srv/buckets"));
        assert_eq!(c.handler.listing_order, ListingOrder::ByTimestamp);
        assert!(!c.handler.staging);
        assert_eq!(c.handler.staging_dir, Some(PathBuf::from("/tmp/revdiff")));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let c = RevdiffConfig::from_toml_str("[handler]\nlisting_order = \"latest-first\"\n")
            .unwrap();
        assert_eq!(c.handler.listing_order, ListingOrder::LatestFirst);
        assert!(c.handler.staging);
        assert_eq!(c.store, StoreConfig::default());
    }

    #[test]
    fn unknown_order_is_rejected() {
        let err = RevdiffConfig::from_toml_str("[handler]\nlisting_order = \"random\"\n");
        assert!(matches!(err, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = RevdiffConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("revdiff.toml");
        std::fs::write(&path, "[store]\nroot = \"data\"\n").unwrap();
        let c = RevdiffConfig::load(&path).unwrap();
        assert_eq!(c.store.root, PathBuf::from("data"));
    }
}
