use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::object::{ContainerId, ObjectIdentifier};

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

/// A batch of storage-change notifications as delivered by the trigger.
///
/// Every field of the wire format is optional so that one bad record never
/// prevents the rest of the batch from being read. Validation happens per
/// record in [`ChangeEvent::try_from`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "Records", default)]
    pub records: Vec<NotificationRecord>,
}

impl Notification {
    /// Parse a notification batch from JSON.
    pub fn from_json(json: &str) -> Result<Self, TypeError> {
        serde_json::from_str(json).map_err(|e| TypeError::Serialization(e.to_string()))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A single notification record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecord {
    #[serde(rename = "eventSource", default, skip_serializing_if = "Option::is_none")]
    pub event_source: Option<String>,
    #[serde(rename = "eventTime", default, skip_serializing_if = "Option::is_none")]
    pub event_time: Option<String>,
    #[serde(rename = "eventName", default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3: Option<StorageEntity>,
}

impl NotificationRecord {
    /// Build a well-formed record, mainly for tests and tooling.
    pub fn new(container: &str, object: &str) -> Self {
        Self {
            event_source: None,
            event_time: None,
            event_name: None,
            s3: Some(StorageEntity {
                bucket: Some(BucketEntity {
                    name: Some(container.into()),
                }),
                object: Some(ObjectEntity {
                    key: Some(object.into()),
                    version_id: None,
                    size: None,
                }),
            }),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageEntity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<BucketEntity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<ObjectEntity>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketEntity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectEntity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(rename = "versionId", default, skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

// ---------------------------------------------------------------------------
// ChangeEvent
// ---------------------------------------------------------------------------

/// A validated notification that an object in a container changed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub container: ContainerId,
    pub object: ObjectIdentifier,
    /// When the change happened, if the notification carried a parseable time.
    pub occurred_at: Option<DateTime<Utc>>,
    /// Which system emitted the notification (e.g. `aws:s3`).
    pub source: Option<String>,
}

impl ChangeEvent {
    pub fn new(container: ContainerId, object: ObjectIdentifier) -> Self {
        Self {
            container,
            object,
            occurred_at: None,
            source: None,
        }
    }
}

impl TryFrom<&NotificationRecord> for ChangeEvent {
    type Error = TypeError;

    fn try_from(record: &NotificationRecord) -> Result<Self, Self::Error> {
        let entity = record
            .s3
            .as_ref()
            .ok_or_else(|| TypeError::MalformedEvent("record has no storage entity".into()))?;

        let container = entity
            .bucket
            .as_ref()
            .and_then(|b| b.name.as_deref())
            .ok_or_else(|| TypeError::MalformedEvent("missing container name".into()))
            .and_then(|name| {
                ContainerId::new(name)
                    .map_err(|_| TypeError::MalformedEvent("empty container name".into()))
            })?;

        let object = entity
            .object
            .as_ref()
            .and_then(|o| o.key.as_deref())
            .ok_or_else(|| TypeError::MalformedEvent("missing object key".into()))
            .and_then(|key| {
                ObjectIdentifier::new(key)
                    .map_err(|_| TypeError::MalformedEvent("empty object key".into()))
            })?;

        // An unparseable timestamp does not make the event unusable.
        let occurred_at = record
            .event_time
            .as_deref()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map(|t| t.with_timezone(&Utc));

        Ok(Self {
            container,
            object,
            occurred_at,
            source: record.event_source.clone(),
        })
    }
}
