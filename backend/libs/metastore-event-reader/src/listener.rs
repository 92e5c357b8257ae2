//! Raw catalog change events, as published by the source metastore listener
//!
//! Payloads are JSON objects tagged by `eventType`:
//!
//! ```json
//! {
//!   "eventType": "ADD_PARTITION",
//!   "dbName": "sales",
//!   "tableName": "orders",
//!   "tableParameters": {"EXTERNAL": "TRUE"},
//!   "partitionKeys": {"year": "string", "month": "string"},
//!   "partitionValues": ["2020", "01"]
//! }
//! ```
//!
//! Key order of `partitionKeys` and `partitionKeyValues` is significant and is
//! preserved on decode.

use metastore_event::EventType;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// String-to-string mapping that keeps the source's key order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedMap(Vec<(String, String)>);

impl OrderedMap {
    /// Keys in source order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Splits into parallel key and value sequences from a single pass
    pub fn unzip(&self) -> (Vec<String>, Vec<String>) {
        self.0.iter().cloned().unzip()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for OrderedMap {
    /// Later duplicates replace the earlier value in place
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut entries: Vec<(String, String)> = Vec::new();
        for (key, value) in iter {
            let (key, value) = (key.into(), value.into());
            match entries.iter_mut().find(|(k, _)| *k == key) {
                Some(entry) => entry.1 = value,
                None => entries.push((key, value)),
            }
        }
        Self(entries)
    }
}

impl Serialize for OrderedMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for OrderedMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedMapVisitor;

        impl<'de> Visitor<'de> for OrderedMapVisitor {
            type Value = OrderedMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of strings")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries: Vec<(String, String)> =
                    Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, String>()? {
                    entries.push((key, value));
                }
                Ok(entries.into_iter().collect())
            }
        }

        deserializer.deserialize_map(OrderedMapVisitor)
    }
}

/// Free-form properties recorded alongside the catalog call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentContext {
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

/// Fields shared by every listener event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventHeader {
    pub db_name: String,
    pub table_name: String,
    #[serde(default)]
    pub table_parameters: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_context: Option<EnvironmentContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol_version: Option<String>,
}

impl EventHeader {
    pub fn new(db_name: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            db_name: db_name.into(),
            table_name: table_name.into(),
            table_parameters: HashMap::new(),
            environment_context: None,
            protocol_version: None,
        }
    }

    pub fn qualified_table_name(&self) -> String {
        format!("{}.{}", self.db_name, self.table_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTableEvent {
    #[serde(flatten)]
    pub header: EventHeader,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropTableEvent {
    #[serde(flatten)]
    pub header: EventHeader,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlterTableEvent {
    #[serde(flatten)]
    pub header: EventHeader,
    #[serde(default)]
    pub old_table_name: Option<String>,
    #[serde(default)]
    pub table_location: Option<String>,
    #[serde(default)]
    pub old_table_location: Option<String>,
}

impl AlterTableEvent {
    /// Both locations are known and identical
    pub fn is_location_unchanged(&self) -> bool {
        match (&self.table_location, &self.old_table_location) {
            (Some(new), Some(old)) => new == old,
            _ => false,
        }
    }

    pub fn is_rename(&self) -> bool {
        self.old_table_name
            .as_deref()
            .is_some_and(|old| !old.eq_ignore_ascii_case(&self.header.table_name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPartitionEvent {
    #[serde(flatten)]
    pub header: EventHeader,
    /// Partition column name to column type
    pub partition_keys: OrderedMap,
    pub partition_values: Vec<String>,
    #[serde(default)]
    pub partition_location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlterPartitionEvent {
    #[serde(flatten)]
    pub header: EventHeader,
    pub partition_keys: OrderedMap,
    pub partition_values: Vec<String>,
    #[serde(default)]
    pub old_partition_values: Vec<String>,
    #[serde(default)]
    pub partition_location: Option<String>,
    #[serde(default)]
    pub old_partition_location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropPartitionEvent {
    #[serde(flatten)]
    pub header: EventHeader,
    pub partition_keys: OrderedMap,
    pub partition_values: Vec<String>,
    #[serde(default)]
    pub partition_location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertTableEvent {
    #[serde(flatten)]
    pub header: EventHeader,
    /// Partition column name to value; empty for unpartitioned tables
    pub partition_key_values: OrderedMap,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub file_checksums: Vec<String>,
}

/// Catalog change notification, one variant per event kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "eventType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ListenerEvent {
    CreateTable(CreateTableEvent),
    DropTable(DropTableEvent),
    AlterTable(AlterTableEvent),
    AddPartition(AddPartitionEvent),
    DropPartition(DropPartitionEvent),
    AlterPartition(AlterPartitionEvent),
    Insert(InsertTableEvent),
}

impl ListenerEvent {
    pub fn event_type(&self) -> EventType {
        match self {
            ListenerEvent::CreateTable(_) => EventType::CreateTable,
            ListenerEvent::DropTable(_) => EventType::DropTable,
            ListenerEvent::AlterTable(_) => EventType::AlterTable,
            ListenerEvent::AddPartition(_) => EventType::AddPartition,
            ListenerEvent::DropPartition(_) => EventType::DropPartition,
            ListenerEvent::AlterPartition(_) => EventType::AlterPartition,
            ListenerEvent::Insert(_) => EventType::Insert,
        }
    }

    pub fn header(&self) -> &EventHeader {
        match self {
            ListenerEvent::CreateTable(e) => &e.header,
            ListenerEvent::DropTable(e) => &e.header,
            ListenerEvent::AlterTable(e) => &e.header,
            ListenerEvent::AddPartition(e) => &e.header,
            ListenerEvent::DropPartition(e) => &e.header,
            ListenerEvent::AlterPartition(e) => &e.header,
            ListenerEvent::Insert(e) => &e.header,
        }
    }

    pub fn db_name(&self) -> &str {
        &self.header().db_name
    }

    pub fn table_name(&self) -> &str {
        &self.header().table_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_add_partition_preserves_key_order() {
        let payload = r#"{
            "eventType": "ADD_PARTITION",
            "dbName": "sales",
            "tableName": "orders",
            "tableParameters": {"EXTERNAL": "TRUE"},
            "partitionKeys": {"year": "string", "month": "string", "day": "string"},
            "partitionValues": ["2020", "01", "31"],
            "partitionLocation": "s3://bucket/orders/year=2020/month=01/day=31"
        }"#;

        let event: ListenerEvent = serde_json::from_str(payload).unwrap();
        assert_eq!(event.event_type(), EventType::AddPartition);
        assert_eq!(event.db_name(), "sales");

        let ListenerEvent::AddPartition(add) = event else {
            panic!("expected ADD_PARTITION");
        };
        assert_eq!(add.partition_keys.keys().collect::<Vec<_>>(), vec!["year", "month", "day"]);
        assert_eq!(add.header.table_parameters["EXTERNAL"], "TRUE");
        assert!(add.header.environment_context.is_none());
    }

    #[test]
    fn test_decode_insert_with_environment_context() {
        let payload = r#"{
            "eventType": "INSERT",
            "dbName": "sales",
            "tableName": "orders",
            "environmentContext": {"properties": {"user": "etl"}},
            "partitionKeyValues": {"month": "01", "year": "2020"},
            "files": ["part-0000"],
            "fileChecksums": ["abc"]
        }"#;

        let event: ListenerEvent = serde_json::from_str(payload).unwrap();
        let ListenerEvent::Insert(insert) = event else {
            panic!("expected INSERT");
        };
        let (columns, values) = insert.partition_key_values.unzip();
        assert_eq!(columns, vec!["month", "year"]);
        assert_eq!(values, vec!["01", "2020"]);
        assert_eq!(
            insert.header.environment_context.unwrap().properties["user"],
            "etl"
        );
    }

    #[test]
    fn test_decode_alter_table_locations() {
        let payload = json!({
            "eventType": "ALTER_TABLE",
            "dbName": "sales",
            "tableName": "orders",
            "oldTableName": "orders",
            "tableLocation": "s3://bucket/orders",
            "oldTableLocation": "s3://bucket/orders"
        });

        let event = serde_json::from_value::<ListenerEvent>(payload).unwrap();
        let ListenerEvent::AlterTable(alter) = event else {
            panic!("expected ALTER_TABLE");
        };
        assert!(alter.is_location_unchanged());
        assert!(!alter.is_rename());
    }

    #[test]
    fn test_location_unchanged_requires_both_locations() {
        let mut alter = AlterTableEvent {
            header: EventHeader::new("db", "tbl"),
            old_table_name: Some("old_tbl".into()),
            table_location: Some("s3://a".into()),
            old_table_location: None,
        };
        assert!(!alter.is_location_unchanged());
        assert!(alter.is_rename());

        alter.old_table_location = Some("s3://b".into());
        assert!(!alter.is_location_unchanged());
    }

    #[test]
    fn test_decode_rejects_missing_partition_payload() {
        let payload = json!({
            "eventType": "DROP_PARTITION",
            "dbName": "sales",
            "tableName": "orders",
            "partitionValues": ["2020"]
        });

        let err = serde_json::from_value::<ListenerEvent>(payload).unwrap_err();
        assert!(err.to_string().contains("partitionKeys"));
    }

    #[test]
    fn test_decode_rejects_unknown_event_type() {
        let payload = json!({"eventType": "CREATE_FUNCTION", "dbName": "db", "tableName": "t"});
        assert!(serde_json::from_value::<ListenerEvent>(payload).is_err());
    }

    #[test]
    fn test_ordered_map_keeps_last_duplicate_in_place() {
        let map: OrderedMap = [("a", "1"), ("b", "2"), ("a", "3")].into_iter().collect();
        assert_eq!(map.len(), 2);
        assert_eq!(map.iter().collect::<Vec<_>>(), vec![("a", "3"), ("b", "2")]);
        assert_eq!(map.get("b"), Some("2"));
    }

    #[test]
    fn test_encode_round_trips_through_json() {
        let event = ListenerEvent::DropTable(DropTableEvent {
            header: EventHeader::new("db", "tbl"),
        });

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["eventType"], "DROP_TABLE");
        assert_eq!(json["dbName"], "db");

        let decoded: ListenerEvent = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, event);
    }
}
