//! Source to replica table mapping

use std::collections::HashMap;
use tracing::warn;

/// Replica-side identifiers for a source table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaTable {
    pub database_name: String,
    pub table_name: String,
}

/// One configured override; omitted replica names fall back to the source's
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableReplication {
    pub source_database_name: String,
    pub source_table_name: String,
    pub replica_database_name: Option<String>,
    pub replica_table_name: Option<String>,
}

impl TableReplication {
    pub fn new(
        source_database_name: impl Into<String>,
        source_table_name: impl Into<String>,
    ) -> Self {
        Self {
            source_database_name: source_database_name.into(),
            source_table_name: source_table_name.into(),
            replica_database_name: None,
            replica_table_name: None,
        }
    }

    pub fn with_replica(
        mut self,
        database_name: impl Into<String>,
        table_name: impl Into<String>,
    ) -> Self {
        self.replica_database_name = Some(database_name.into());
        self.replica_table_name = Some(table_name.into());
        self
    }

    pub fn replica_table(&self) -> ReplicaTable {
        ReplicaTable {
            database_name: self
                .replica_database_name
                .clone()
                .unwrap_or_else(|| self.source_database_name.clone()),
            table_name: self
                .replica_table_name
                .clone()
                .unwrap_or_else(|| self.source_table_name.clone()),
        }
    }
}

/// Answers where a source table is replicated to
///
/// `None` is the ordinary answer for tables without an override and means
/// "replicate under the same identifiers".
pub trait ReplicationTargetResolver {
    fn resolve(&self, database_name: &str, table_name: &str) -> Option<&ReplicaTable>;
}

/// Read-only lookup table of replication overrides
///
/// Database and table names are matched case-insensitively, as catalog
/// identifiers are.
#[derive(Debug, Clone, Default)]
pub struct TableReplications {
    replicas: HashMap<(String, String), ReplicaTable>,
}

impl TableReplications {
    pub fn new(replications: impl IntoIterator<Item = TableReplication>) -> Self {
        let mut replicas = HashMap::new();
        for replication in replications {
            let key = lookup_key(
                &replication.source_database_name,
                &replication.source_table_name,
            );
            if let Some(previous) = replicas.insert(key, replication.replica_table()) {
                warn!(
                    source_database = %replication.source_database_name,
                    source_table = %replication.source_table_name,
                    replaced_database = %previous.database_name,
                    replaced_table = %previous.table_name,
                    "Duplicate table replication, keeping the last entry"
                );
            }
        }
        Self { replicas }
    }

    pub fn len(&self) -> usize {
        self.replicas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replicas.is_empty()
    }
}

impl FromIterator<TableReplication> for TableReplications {
    fn from_iter<I: IntoIterator<Item = TableReplication>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl ReplicationTargetResolver for TableReplications {
    fn resolve(&self, database_name: &str, table_name: &str) -> Option<&ReplicaTable> {
        self.replicas.get(&lookup_key(database_name, table_name))
    }
}

fn lookup_key(database_name: &str, table_name: &str) -> (String, String) {
    (database_name.to_lowercase(), table_name.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_configured_table() {
        let replications = TableReplications::new([
            TableReplication::new("sales", "orders").with_replica("replica_sales", "orders_copy"),
        ]);

        let replica = replications.resolve("sales", "orders").unwrap();
        assert_eq!(replica.database_name, "replica_sales");
        assert_eq!(replica.table_name, "orders_copy");
    }

    #[test]
    fn test_resolve_miss_is_none() {
        let replications: TableReplications =
            [TableReplication::new("sales", "orders").with_replica("r", "t")]
                .into_iter()
                .collect();

        assert!(replications.resolve("sales", "customers").is_none());
        assert!(TableReplications::default().resolve("sales", "orders").is_none());
    }

    #[test]
    fn test_resolve_ignores_case() {
        let replications = TableReplications::new([
            TableReplication::new("Sales", "Orders").with_replica("replica_sales", "orders"),
        ]);

        assert!(replications.resolve("SALES", "orders").is_some());
    }

    #[test]
    fn test_dotted_identifiers_do_not_collide() {
        let replications = TableReplications::new([
            TableReplication::new("a.b", "c").with_replica("first", "c"),
            TableReplication::new("a", "b.c").with_replica("second", "b_c"),
        ]);

        assert_eq!(replications.len(), 2);
        assert_eq!(replications.resolve("a.b", "c").unwrap().database_name, "first");
        assert_eq!(replications.resolve("a", "b.c").unwrap().database_name, "second");
    }

    #[test]
    fn test_omitted_replica_names_fall_back_to_source() {
        let mut replication = TableReplication::new("sales", "orders");
        replication.replica_database_name = Some("archive".to_string());
        let replications = TableReplications::new([replication]);

        let replica = replications.resolve("sales", "orders").unwrap();
        assert_eq!(replica.database_name, "archive");
        assert_eq!(replica.table_name, "orders");
    }

    #[test]
    fn test_duplicate_entries_keep_last() {
        let replications = TableReplications::new([
            TableReplication::new("sales", "orders").with_replica("first", "orders"),
            TableReplication::new("SALES", "ORDERS").with_replica("second", "orders"),
        ]);

        assert_eq!(replications.len(), 1);
        assert_eq!(
            replications.resolve("sales", "orders").unwrap().database_name,
            "second"
        );
    }
}
