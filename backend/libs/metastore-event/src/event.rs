use serde::Serialize;
use std::collections::HashMap;

use crate::error::{MetaStoreEventError, Result};
use crate::{EventType, ReplicationMode};

/// Normalized catalog change, addressed to both the source and the replica table
///
/// Instances are immutable once built; use [`MetaStoreEvent::builder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetaStoreEvent {
    event_type: EventType,
    database_name: String,
    table_name: String,
    replica_database_name: String,
    replica_table_name: String,
    parameters: HashMap<String, String>,
    environment_context: Option<HashMap<String, String>>,
    partition_columns: Vec<String>,
    partition_values: Vec<String>,
    delete_data: bool,
    replication_mode: ReplicationMode,
}

impl MetaStoreEvent {
    pub fn builder(
        event_type: EventType,
        database_name: impl Into<String>,
        table_name: impl Into<String>,
        replica_database_name: impl Into<String>,
        replica_table_name: impl Into<String>,
    ) -> MetaStoreEventBuilder {
        MetaStoreEventBuilder {
            event_type,
            database_name: database_name.into(),
            table_name: table_name.into(),
            replica_database_name: replica_database_name.into(),
            replica_table_name: replica_table_name.into(),
            parameters: HashMap::new(),
            environment_context: None,
            partition_columns: Vec::new(),
            partition_values: Vec::new(),
            delete_data: false,
            replication_mode: ReplicationMode::Unspecified,
        }
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn replica_database_name(&self) -> &str {
        &self.replica_database_name
    }

    pub fn replica_table_name(&self) -> &str {
        &self.replica_table_name
    }

    /// `database.table` on the source side
    pub fn qualified_table_name(&self) -> String {
        format!("{}.{}", self.database_name, self.table_name)
    }

    /// `database.table` on the replica side
    pub fn replica_qualified_table_name(&self) -> String {
        format!("{}.{}", self.replica_database_name, self.replica_table_name)
    }

    pub fn parameters(&self) -> &HashMap<String, String> {
        &self.parameters
    }

    /// Environment context properties, `None` when the source recorded none
    pub fn environment_context(&self) -> Option<&HashMap<String, String>> {
        self.environment_context.as_ref()
    }

    pub fn partition_columns(&self) -> &[String] {
        &self.partition_columns
    }

    pub fn partition_values(&self) -> &[String] {
        &self.partition_values
    }

    /// Iterates `(column, value)` pairs in partition order
    pub fn partitions(&self) -> impl Iterator<Item = (&str, &str)> {
        self.partition_columns
            .iter()
            .zip(self.partition_values.iter())
            .map(|(column, value)| (column.as_str(), value.as_str()))
    }

    pub fn is_delete_data(&self) -> bool {
        self.delete_data
    }

    pub fn is_drop_event(&self) -> bool {
        self.event_type.deletes_data()
    }

    pub fn replication_mode(&self) -> ReplicationMode {
        self.replication_mode
    }
}

/// Builder for [`MetaStoreEvent`]
#[derive(Debug, Clone)]
#[must_use]
pub struct MetaStoreEventBuilder {
    event_type: EventType,
    database_name: String,
    table_name: String,
    replica_database_name: String,
    replica_table_name: String,
    parameters: HashMap<String, String>,
    environment_context: Option<HashMap<String, String>>,
    partition_columns: Vec<String>,
    partition_values: Vec<String>,
    delete_data: bool,
    replication_mode: ReplicationMode,
}

impl MetaStoreEventBuilder {
    /// Adds all entries, overwriting keys already present
    pub fn parameters<I, K, V>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.parameters.extend(
            parameters
                .into_iter()
                .map(|(key, value)| (key.into(), value.into())),
        );
        self
    }

    pub fn parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn environment_context(mut self, properties: Option<HashMap<String, String>>) -> Self {
        self.environment_context = properties;
        self
    }

    pub fn partition_columns(mut self, columns: Vec<String>) -> Self {
        self.partition_columns = columns;
        self
    }

    pub fn partition_values(mut self, values: Vec<String>) -> Self {
        self.partition_values = values;
        self
    }

    pub fn delete_data(mut self, delete_data: bool) -> Self {
        self.delete_data = delete_data;
        self
    }

    pub fn replication_mode(mut self, replication_mode: ReplicationMode) -> Self {
        self.replication_mode = replication_mode;
        self
    }

    /// Validates identifiers and partition alignment, then freezes the event
    pub fn build(self) -> Result<MetaStoreEvent> {
        for (field, value) in [
            ("database name", &self.database_name),
            ("table name", &self.table_name),
            ("replica database name", &self.replica_database_name),
            ("replica table name", &self.replica_table_name),
        ] {
            if value.trim().is_empty() {
                return Err(MetaStoreEventError::EmptyIdentifier(field));
            }
        }

        if self.partition_columns.len() != self.partition_values.len() {
            return Err(MetaStoreEventError::PartitionMismatch {
                columns: self.partition_columns.len(),
                values: self.partition_values.len(),
            });
        }

        Ok(MetaStoreEvent {
            event_type: self.event_type,
            database_name: self.database_name,
            table_name: self.table_name,
            replica_database_name: self.replica_database_name,
            replica_table_name: self.replica_table_name,
            parameters: self.parameters,
            environment_context: self.environment_context,
            partition_columns: self.partition_columns,
            partition_values: self.partition_values,
            delete_data: self.delete_data,
            replication_mode: self.replication_mode,
        })
    }
}
