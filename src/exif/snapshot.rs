use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use super::timestamp::CaptureTimestamp;

/// Keys tried, in order, when looking for the capture timestamp.
const CAPTURE_TIMESTAMP_KEYS: &[&str] = &[
    "Composite:SubSecDateTimeOriginal",
    "EXIF:DateTimeOriginal",
    "XMP:DateTimeOriginal",
    "DateTimeOriginal",
];

/// Tags read from a single file at one point in time.
///
/// Keys are group-qualified tag names as printed by `exiftool -G`
/// (`IPTC:Keywords`, `XMP:HierarchicalSubject`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(BTreeMap<String, Value>);

/// Before and after values of one changed tag. `None` means the tag was absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagChange {
    pub before: Option<Value>,
    pub after: Option<Value>,
}

/// Changed tags between two snapshots of the same file.
pub type MetaDiff = BTreeMap<String, TagChange>;

impl Snapshot {
    pub fn new(tags: BTreeMap<String, Value>) -> Self {
        Self(tags)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn tags(&self) -> &BTreeMap<String, Value> {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The capture timestamp, if one of the known date/time tags holds a valid value.
    pub fn capture_timestamp(&self) -> Option<CaptureTimestamp> {
        CAPTURE_TIMESTAMP_KEYS
            .iter()
            .filter_map(|key| self.0.get(*key))
            .filter_map(Value::as_str)
            .find_map(CaptureTimestamp::parse)
    }

    /// Every key present in either snapshot whose value differs.
    pub fn diff(&self, after: &Snapshot) -> MetaDiff {
        let keys: BTreeSet<&String> = self.0.keys().chain(after.0.keys()).collect();

        keys.into_iter()
            .filter_map(|key| {
                let before = self.0.get(key);
                let now = after.0.get(key);
                (before != now).then(|| {
                    (
                        key.clone(),
                        TagChange {
                            before: before.cloned(),
                            after: now.cloned(),
                        },
                    )
                })
            })
            .collect()
    }
}
