//! Source catalog access used to classify table alterations

use thiserror::Error;
use tracing::debug;

/// Column definition as reported by the source catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    pub name: String,
    pub data_type: String,
}

impl FieldSchema {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// Subset of source table metadata the reader needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    pub database_name: String,
    pub table_name: String,
    pub location: Option<String>,
    pub partition_keys: Vec<FieldSchema>,
}

impl TableDescriptor {
    pub fn is_partitioned(&self) -> bool {
        !self.partition_keys.is_empty()
    }
}

#[derive(Error, Debug)]
pub enum CatalogClientError {
    #[error("table not found")]
    NotFound,

    /// Remote call failed (connection, protocol, server error)
    #[error("remote catalog call failed: {0}")]
    Remote(String),
}

/// Client for the source metastore
///
/// Calls block until the remote catalog answers; timeouts are the client's
/// responsibility.
pub trait SourceCatalogClient {
    fn get_table(
        &self,
        database_name: &str,
        table_name: &str,
    ) -> Result<TableDescriptor, CatalogClientError>;
}

/// Partition-ness of a table could not be determined
#[derive(Error, Debug)]
#[error("Could not find table {database_name}.{table_name}: {source}")]
pub struct CatalogLookupError {
    pub database_name: String,
    pub table_name: String,
    #[source]
    pub source: CatalogClientError,
}

/// Answers whether a source table has partition keys
pub trait PartitionedTableOracle {
    fn is_partitioned(
        &self,
        database_name: &str,
        table_name: &str,
    ) -> Result<bool, CatalogLookupError>;
}

/// [`PartitionedTableOracle`] backed by a live source catalog
#[derive(Debug, Clone)]
pub struct MetastoreTableOracle<C> {
    client: C,
}

impl<C: SourceCatalogClient> MetastoreTableOracle<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

impl<C: SourceCatalogClient> PartitionedTableOracle for MetastoreTableOracle<C> {
    fn is_partitioned(
        &self,
        database_name: &str,
        table_name: &str,
    ) -> Result<bool, CatalogLookupError> {
        let table = self
            .client
            .get_table(database_name, table_name)
            .map_err(|source| CatalogLookupError {
                database_name: database_name.to_string(),
                table_name: table_name.to_string(),
                source,
            })?;

        debug!(
            database = %database_name,
            table = %table_name,
            partition_keys = table.partition_keys.len(),
            "Fetched source table"
        );

        Ok(table.is_partitioned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct StaticCatalog {
        tables: HashMap<(String, String), TableDescriptor>,
    }

    impl StaticCatalog {
        fn with(tables: Vec<TableDescriptor>) -> Self {
            Self {
                tables: tables
                    .into_iter()
                    .map(|t| ((t.database_name.clone(), t.table_name.clone()), t))
                    .collect(),
            }
        }
    }

    impl SourceCatalogClient for StaticCatalog {
        fn get_table(
            &self,
            database_name: &str,
            table_name: &str,
        ) -> Result<TableDescriptor, CatalogClientError> {
            self.tables
                .get(&(database_name.to_string(), table_name.to_string()))
                .cloned()
                .ok_or(CatalogClientError::NotFound)
        }
    }

    fn table(name: &str, partition_keys: Vec<FieldSchema>) -> TableDescriptor {
        TableDescriptor {
            database_name: "sales".to_string(),
            table_name: name.to_string(),
            location: Some(format!("s3://bucket/{}", name)),
            partition_keys,
        }
    }

    #[test]
    fn test_partitioned_table() {
        let oracle = MetastoreTableOracle::new(StaticCatalog::with(vec![
            table("orders", vec![FieldSchema::new("year", "string")]),
            table("customers", vec![]),
        ]));

        assert!(oracle.is_partitioned("sales", "orders").unwrap());
        assert!(!oracle.is_partitioned("sales", "customers").unwrap());
    }

    #[test]
    fn test_missing_table_is_lookup_error() {
        let oracle = MetastoreTableOracle::new(StaticCatalog::with(vec![]));

        let err = oracle.is_partitioned("sales", "orders").unwrap_err();
        assert_eq!(err.database_name, "sales");
        assert_eq!(err.table_name, "orders");
        assert!(matches!(err.source, CatalogClientError::NotFound));
        assert_eq!(
            err.to_string(),
            "Could not find table sales.orders: table not found"
        );
    }
}
