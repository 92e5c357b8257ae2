//! # Metastore Event Reader
//!
//! Reads catalog change notifications published by a source metastore
//! listener and turns each into a [`MetaStoreEvent`] addressed to the replica
//! catalog.
//!
//! ## Architecture
//!
//! ```text
//! Kafka → MessageReader → MetaStoreEventReader → EventNormalizer → MetaStoreEvent
//!                              (ack first)            ↓        ↓
//!                                        TableReplications   PartitionedTableOracle
//!                                                                    ↓
//!                                                           Source metastore
//! ```
//!
//! ## Normalization
//!
//! - Replica database/table come from [`TableReplications`]; tables without an
//!   override replicate under their source identifiers
//! - Every event carries the table parameters plus `hive.metastore.uris`, the
//!   source endpoint the applier re-fetches metadata from
//! - Partition events carry aligned partition columns and values
//! - `DROP_TABLE` and `DROP_PARTITION` set `delete_data`
//! - `ALTER_TABLE` on a partitioned table whose location did not change is
//!   marked [`ReplicationMode::MetadataUpdate`]; deciding this needs a source
//!   catalog lookup, and a failed lookup fails the event
//!
//! ## Usage Example
//!
//! ```ignore
//! use metastore_event_reader::{KafkaMetaStoreEventReader, ReaderConfig};
//! use std::path::Path;
//!
//! let config = ReaderConfig::load(Some(Path::new("shunting-yard.yml")))?;
//! let mut reader = KafkaMetaStoreEventReader::from_config(&config, metastore_client)?;
//!
//! loop {
//!     match reader.read() {
//!         Ok(Some(event)) => applier.apply(event)?,
//!         Ok(None) => {}
//!         Err(e) if e.is_transport() => break,
//!         Err(e) => tracing::warn!(error = %e, "Dropped event"),
//!     }
//! }
//! reader.close()?;
//! ```
//!
//! ## Design Trade-offs
//!
//! Messages are acknowledged before they are normalized and handed to the
//! caller. Delivery is therefore at most once: a crash after `read` and before
//! the event is applied loses that event, and so does a normalization failure.
//! Whether the replica can tolerate that is the caller's decision.

pub mod catalog;
pub mod config;
mod error;
pub mod kafka;
pub mod listener;
pub mod normalizer;
pub mod reader;
pub mod replication;

pub use catalog::{
    CatalogClientError, CatalogLookupError, FieldSchema, MetastoreTableOracle,
    PartitionedTableOracle, SourceCatalogClient, TableDescriptor,
};
pub use crate::config::{KafkaConfig, ReaderConfig};
pub use error::{ConfigError, MessagingError, ReaderError, ReaderResult};
pub use kafka::{KafkaMessageReader, KafkaMetaStoreEventReader};
pub use listener::ListenerEvent;
pub use normalizer::EventNormalizer;
pub use reader::{MessageEvent, MessageReader, MetaStoreEventReader};
pub use replication::{
    ReplicaTable, ReplicationTargetResolver, TableReplication, TableReplications,
};

pub use metastore_event::{EventType, MetaStoreEvent, ReplicationMode};
