//! Slot state definitions for the node registry
//!
//! A slot is created `Pending` and resolves exactly once, to either `Absent`
//! or `Present`. The snapshot encoding is `null` for pending, `{}` for
//! absent, and the record object for present.
use crate::state::Record;
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

/// Resolution state of one node id
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    /// Scheduled for fetching but not yet resolved
    Pending,

    /// The directory confirmed there is no entity with this id
    Absent,

    /// Fetched and parsed
    Present(Record),
}

impl Slot {
    /// Returns true while the slot still needs a fetch
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Returns true once the slot reached a terminal state
    pub fn is_resolved(&self) -> bool {
        !self.is_pending()
    }

    pub fn record(&self) -> Option<&Record> {
        match self {
            Self::Present(record) => Some(record),
            _ => None,
        }
    }

    pub fn record_mut(&mut self) -> Option<&mut Record> {
        match self {
            Self::Present(record) => Some(record),
            _ => None,
        }
    }

    /// Short name used in log messages and errors
    pub fn state_name(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Absent => "absent",
            Self::Present(_) => "present",
        }
    }
}

impl From<Option<Record>> for Slot {
    fn from(outcome: Option<Record>) -> Self {
        match outcome {
            Some(record) => Self::Present(record),
            None => Self::Absent,
        }
    }
}

impl Serialize for Slot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Pending => serializer.serialize_none(),
            Self::Absent => serializer.serialize_map(Some(0))?.end(),
            Self::Present(record) => record.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Slot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Option::<Map<String, Value>>::deserialize(deserializer)? {
            None => Ok(Self::Pending),
            Some(map) if map.is_empty() => Ok(Self::Absent),
            Some(map) => serde_json::from_value(Value::Object(map))
                .map(Self::Present)
                .map_err(serde::de::Error::custom),
        }
    }
}
