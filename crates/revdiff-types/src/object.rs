use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Name of the namespace holding objects (for example a bucket).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContainerId(String);

impl ContainerId {
    /// Create a container ID. Empty names are rejected.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if name.is_empty() {
            return Err(TypeError::Empty("container id"));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Opaque key uniquely naming an object within a container.
///
/// Keys are kept verbatim: no normalization or URL decoding is applied.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectIdentifier(String);

impl ObjectIdentifier {
    /// Create an object identifier. Empty keys are rejected.
    pub fn new(key: impl Into<String>) -> Result<Self, TypeError> {
        let key = key.into();
        if key.is_empty() {
            return Err(TypeError::Empty("object id"));
        }
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

macro_rules! string_newtype_impls {
    ($ty:ident, $label:literal) => {
        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:?})", $label, self.0)
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl TryFrom<String> for $ty {
            type Error = TypeError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $ty {
            type Error = TypeError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> Self {
                value.0
            }
        }
    };
}

string_newtype_impls!(ContainerId, "ContainerId");
string_newtype_impls!(ObjectIdentifier, "ObjectIdentifier");

/// Opaque revision token handed out by the storage backend.
///
/// A marker with no token (or an empty one) addresses the current,
/// unversioned state of the object.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub struct RevisionMarker(Option<String>);

impl RevisionMarker {
    /// Marker addressing the current state of an object.
    pub const fn current() -> Self {
        Self(None)
    }

    /// Marker for a specific revision. An empty token collapses to
    /// [`RevisionMarker::current`].
    pub fn new(token: impl Into<String>) -> Self {
        let token = token.into();
        if token.is_empty() {
            Self(None)
        } else {
            Self(Some(token))
        }
    }

    /// Returns `true` if this marker addresses the current state.
    pub fn is_current(&self) -> bool {
        self.0.is_none()
    }

    /// The version token, if any.
    pub fn token(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl fmt::Debug for RevisionMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(token) => write!(f, "RevisionMarker({token:?})"),
            None => write!(f, "RevisionMarker(current)"),
        }
    }
}

impl fmt::Display for RevisionMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_deref().unwrap_or("current"))
    }
}

impl From<Option<String>> for RevisionMarker {
    fn from(value: Option<String>) -> Self {
        value.map(Self::new).unwrap_or_default()
    }
}

impl From<RevisionMarker> for Option<String> {
    fn from(value: RevisionMarker) -> Self {
        value.0
    }
}

impl From<&str> for RevisionMarker {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_identifiers_rejected() {
        assert_eq!(ObjectIdentifier::new(""), Err(TypeError::Empty("object id")));
        assert_eq!(ContainerId::new(""), Err(TypeError::Empty("container id")));
    }

    #[test]
    fn identifiers_are_verbatim() {
        let id = ObjectIdentifier::new("reports/2024+Q1.txt").unwrap();
        assert_eq!(id.as_str(), "reports/2024+Q1.txt");
        assert_eq!(id.to_string(), "reports/2024+Q1.txt");
    }

    #[test]
    fn empty_marker_is_current() {
        assert!(RevisionMarker::new("").is_current());
        assert!(RevisionMarker::current().is_current());
        assert_eq!(RevisionMarker::default(), RevisionMarker::current());
    }

    #[test]
    fn marker_token() {
        let marker = RevisionMarker::new("v2");
        assert!(!marker.is_current());
        assert_eq!(marker.token(), Some("v2"));
        assert_eq!(marker.to_string(), "v2");
        assert_eq!(RevisionMarker::current().to_string(), "current");
    }

    #[test]
    fn serde_roundtrip_uses_plain_strings() {
        let id = ObjectIdentifier::new("a").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"a\"");

        let marker: RevisionMarker = serde_json::from_str("\"v1\"").unwrap();
        assert_eq!(marker.token(), Some("v1"));
        let current: RevisionMarker = serde_json::from_str("null").unwrap();
        assert!(current.is_current());
    }

    #[test]
    fn serde_rejects_empty_object_id() {
        let result: Result<ObjectIdentifier, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }
}
