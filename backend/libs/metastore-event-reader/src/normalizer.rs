//! Listener event to canonical event mapping

use metastore_event::{MetaStoreEvent, ReplicationMode, METASTORE_URIS_PARAMETER};
use tracing::debug;

use crate::catalog::PartitionedTableOracle;
use crate::error::{ReaderError, ReaderResult};
use crate::listener::{ListenerEvent, OrderedMap};
use crate::replication::ReplicationTargetResolver;

/// Maps [`ListenerEvent`]s onto replica-aware [`MetaStoreEvent`]s
///
/// The only side effect is the oracle call made for `ALTER_TABLE` events.
#[derive(Debug, Clone)]
pub struct EventNormalizer<R, O> {
    source_metastore_uris: String,
    replications: R,
    oracle: O,
}

impl<R, O> EventNormalizer<R, O>
where
    R: ReplicationTargetResolver,
    O: PartitionedTableOracle,
{
    /// Create a normalizer
    ///
    /// # Arguments
    ///
    /// * `source_metastore_uris` - Source catalog endpoint, injected into every event's parameters
    /// * `replications` - Replica overrides per source table
    /// * `oracle` - Source catalog lookup for table alterations
    pub fn new(source_metastore_uris: impl Into<String>, replications: R, oracle: O) -> Self {
        Self {
            source_metastore_uris: source_metastore_uris.into(),
            replications,
            oracle,
        }
    }

    /// Build the canonical event for one listener event
    ///
    /// # Errors
    ///
    /// - [`ReaderError::CatalogLookup`] if an `ALTER_TABLE` table cannot be looked up
    /// - [`ReaderError::MalformedEvent`] if partition keys and values are misaligned
    pub fn normalize(&self, event: &ListenerEvent) -> ReaderResult<MetaStoreEvent> {
        let header = event.header();
        let (replica_database_name, replica_table_name) = match self
            .replications
            .resolve(&header.db_name, &header.table_name)
        {
            Some(replica) => (replica.database_name.clone(), replica.table_name.clone()),
            None => (header.db_name.clone(), header.table_name.clone()),
        };

        let builder = MetaStoreEvent::builder(
            event.event_type(),
            header.db_name.as_str(),
            header.table_name.as_str(),
            replica_database_name,
            replica_table_name,
        )
        .parameters(header.table_parameters.clone())
        .parameter(METASTORE_URIS_PARAMETER, self.source_metastore_uris.as_str())
        .environment_context(
            header
                .environment_context
                .as_ref()
                .map(|context| context.properties.clone()),
        );

        let builder = match event {
            ListenerEvent::AddPartition(add) => builder
                .partition_columns(partition_columns(&add.partition_keys))
                .partition_values(add.partition_values.clone()),
            ListenerEvent::AlterPartition(alter) => builder
                .partition_columns(partition_columns(&alter.partition_keys))
                .partition_values(alter.partition_values.clone()),
            ListenerEvent::DropPartition(dropped) => builder
                .partition_columns(partition_columns(&dropped.partition_keys))
                .partition_values(dropped.partition_values.clone())
                .delete_data(true),
            ListenerEvent::Insert(insert) => {
                let (columns, values) = insert.partition_key_values.unzip();
                builder.partition_columns(columns).partition_values(values)
            }
            ListenerEvent::AlterTable(alter) => {
                let partitioned = self
                    .oracle
                    .is_partitioned(&header.db_name, &header.table_name)?;
                if partitioned && alter.is_location_unchanged() {
                    debug!(
                        table = %header.qualified_table_name(),
                        "Location unchanged on partitioned table, metadata update only"
                    );
                    builder.replication_mode(ReplicationMode::MetadataUpdate)
                } else {
                    builder
                }
            }
            ListenerEvent::DropTable(_) => builder.delete_data(true),
            ListenerEvent::CreateTable(_) => builder,
        };

        builder.build().map_err(|e| {
            ReaderError::MalformedEvent(format!(
                "{} on {}: {}",
                event.event_type(),
                header.qualified_table_name(),
                e
            ))
        })
    }
}

fn partition_columns(partition_keys: &OrderedMap) -> Vec<String> {
    partition_keys.keys().map(str::to_string).collect()
}
