//! Canonical metastore events for table replication
//!
//! A `MetaStoreEvent` is the normalized, replica-aware form of a catalog change
//! notification. Readers build one per upstream event; appliers consume it to
//! mutate the replica catalog.

use serde::{Deserialize, Serialize};
use std::fmt;

mod error;
// Canonical event and its builder
pub mod event;

// Re-export commonly used types
pub use error::{MetaStoreEventError, Result};
pub use event::{MetaStoreEvent, MetaStoreEventBuilder};

/// Table parameter injected into every canonical event, holding the source
/// metastore endpoint so the applier can re-fetch full table metadata.
pub const METASTORE_URIS_PARAMETER: &str = "hive.metastore.uris";

/// Kind of catalog mutation carried by an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    CreateTable,
    DropTable,
    AlterTable,
    AddPartition,
    DropPartition,
    AlterPartition,
    Insert,
}

impl EventType {
    /// Whether replicating this event must physically remove replica data
    pub fn deletes_data(&self) -> bool {
        matches!(self, EventType::DropTable | EventType::DropPartition)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::CreateTable => "CREATE_TABLE",
            EventType::DropTable => "DROP_TABLE",
            EventType::AlterTable => "ALTER_TABLE",
            EventType::AddPartition => "ADD_PARTITION",
            EventType::DropPartition => "DROP_PARTITION",
            EventType::AlterPartition => "ALTER_PARTITION",
            EventType::Insert => "INSERT",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Replication hint attached to a canonical event
///
/// `MetadataUpdate` tells the applier that only catalog metadata changed and
/// no data needs to be copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplicationMode {
    #[default]
    Unspecified,
    MetadataUpdate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_drop_events_delete_data() {
        let deleting: Vec<EventType> = [
            EventType::CreateTable,
            EventType::DropTable,
            EventType::AlterTable,
            EventType::AddPartition,
            EventType::DropPartition,
            EventType::AlterPartition,
            EventType::Insert,
        ]
        .into_iter()
        .filter(EventType::deletes_data)
        .collect();

        assert_eq!(
            deleting,
            vec![EventType::DropTable, EventType::DropPartition]
        );
    }

    #[test]
    fn test_event_type_wire_names() {
        let json = serde_json::to_string(&EventType::AddPartition).unwrap();
        assert_eq!(json, "\"ADD_PARTITION\"");

        let parsed: EventType = serde_json::from_str("\"INSERT\"").unwrap();
        assert_eq!(parsed, EventType::Insert);
        assert_eq!(EventType::AlterTable.to_string(), "ALTER_TABLE");
    }

    #[test]
    fn test_replication_mode_defaults_to_unspecified() {
        assert_eq!(ReplicationMode::default(), ReplicationMode::Unspecified);
        assert_eq!(
            serde_json::to_string(&ReplicationMode::MetadataUpdate).unwrap(),
            "\"METADATA_UPDATE\""
        );
    }
}
