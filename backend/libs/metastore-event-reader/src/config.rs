//! Reader configuration
//!
//! Loaded from an optional YAML (or TOML/JSON) file, then overridden by
//! environment variables prefixed with `SHUNTING_YARD_`, using `__` between
//! nested keys:
//!
//! ```yaml
//! source_catalog:
//!   hive_metastore_uris: thrift://source-metastore:9083
//! kafka:
//!   bootstrap_servers: kafka:9092
//!   topic: metastore-events
//! table_replications:
//!   - source_table: { database_name: sales, table_name: orders }
//!     replica_table: { database_name: replica_sales, table_name: orders }
//! ```
//!
//! `SHUNTING_YARD_KAFKA__TOPIC=other-topic` overrides `kafka.topic`.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::error::ConfigError;
use crate::replication::{TableReplication, TableReplications};

pub const ENV_PREFIX: &str = "SHUNTING_YARD";

#[derive(Debug, Clone, Deserialize)]
pub struct ReaderConfig {
    pub source_catalog: SourceCatalogConfig,
    pub kafka: KafkaConfig,
    #[serde(default)]
    pub table_replications: Vec<TableReplicationConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceCatalogConfig {
    /// Source metastore endpoint(s), e.g. `thrift://host:9083`
    pub hive_metastore_uris: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KafkaConfig {
    pub bootstrap_servers: String,
    pub topic: String,
    pub group_id: String,
    pub poll_timeout_ms: u64,
    pub session_timeout_ms: u64,
    /// Extra librdkafka properties (security, client id, ...)
    #[serde(default)]
    pub client_properties: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableReplicationConfig {
    pub source_table: SourceTableConfig,
    #[serde(default)]
    pub replica_table: Option<ReplicaTableConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceTableConfig {
    pub database_name: String,
    pub table_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplicaTableConfig {
    #[serde(default)]
    pub database_name: Option<String>,
    #[serde(default)]
    pub table_name: Option<String>,
}

impl ReaderConfig {
    /// Load configuration
    ///
    /// # Loading Order
    /// 1. Defaults (`group_id`, `poll_timeout_ms`, `session_timeout_ms`)
    /// 2. Configuration file, if given
    /// 3. `.env` file and environment variables (highest priority)
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let mut builder = config::Config::builder()
            .set_default("kafka.group_id", "shunting-yard")?
            .set_default("kafka.poll_timeout_ms", 1000)?
            .set_default("kafka.session_timeout_ms", 30000)?;

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::from(path));
        }

        let config: ReaderConfig = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source_catalog.hive_metastore_uris.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "source_catalog.hive_metastore_uris is required".to_string(),
            ));
        }

        if self.kafka.bootstrap_servers.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "kafka.bootstrap_servers is required".to_string(),
            ));
        }

        if self.kafka.topic.trim().is_empty() {
            return Err(ConfigError::Invalid("kafka.topic is required".to_string()));
        }

        if self.kafka.poll_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "kafka.poll_timeout_ms must be greater than 0".to_string(),
            ));
        }

        for (index, replication) in self.table_replications.iter().enumerate() {
            let source = &replication.source_table;
            if source.database_name.trim().is_empty() || source.table_name.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "table_replications[{}]: source database and table names are required",
                    index
                )));
            }

            let replica = replication.replica_table.clone().unwrap_or_default();
            let blank =
                |name: &Option<String>| name.as_deref().is_some_and(|n| n.trim().is_empty());
            if blank(&replica.database_name) || blank(&replica.table_name) {
                return Err(ConfigError::Invalid(format!(
                    "table_replications[{}]: replica names must not be blank",
                    index
                )));
            }
        }

        Ok(())
    }

    /// Replication overrides as a lookup table
    pub fn table_replications(&self) -> TableReplications {
        self.table_replications
            .iter()
            .map(|replication| {
                let replica = replication.replica_table.clone().unwrap_or_default();
                TableReplication {
                    source_database_name: replication.source_table.database_name.clone(),
                    source_table_name: replication.source_table.table_name.clone(),
                    replica_database_name: replica.database_name,
                    replica_table_name: replica.table_name,
                }
            })
            .collect()
    }
}
