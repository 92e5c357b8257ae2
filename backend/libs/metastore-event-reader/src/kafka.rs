//! Kafka transport for listener events
//!
//! Offsets are committed manually: [`MessageReader::delete`] commits the
//! offset following the acknowledged message, synchronously.

use rdkafka::config::ClientConfig;
use rdkafka::consumer::{BaseConsumer, CommitMode, Consumer};
use rdkafka::message::Message;
use rdkafka::{Offset, TopicPartitionList};
use std::collections::HashMap;
use std::io;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::catalog::{MetastoreTableOracle, SourceCatalogClient};
use crate::config::{KafkaConfig, ReaderConfig};
use crate::error::{MessagingError, ReaderResult};
use crate::listener::ListenerEvent;
use crate::normalizer::EventNormalizer;
use crate::reader::{MessageEvent, MessageReader, MetaStoreEventReader};
use crate::replication::TableReplications;

pub const TOPIC_PROPERTY: &str = "kafka.topic";
pub const PARTITION_PROPERTY: &str = "kafka.partition";
pub const OFFSET_PROPERTY: &str = "kafka.offset";

/// [`MessageReader`] over a blocking Kafka consumer
///
/// The consumer is dropped on [`MessageReader::close`], which releases its
/// broker connections; later reads and acknowledgments fail with
/// [`MessagingError::Closed`].
pub struct KafkaMessageReader {
    consumer: Option<BaseConsumer>,
    poll_timeout: Duration,
}

impl KafkaMessageReader {
    /// Create a consumer and subscribe it to the configured topic
    pub fn new(config: &KafkaConfig) -> Result<Self, MessagingError> {
        info!(
            brokers = %config.bootstrap_servers,
            topic = %config.topic,
            group_id = %config.group_id,
            "Initializing Kafka listener event reader"
        );

        let mut client_config = ClientConfig::new();
        client_config
            .set("group.id", &config.group_id)
            .set("bootstrap.servers", &config.bootstrap_servers)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", config.session_timeout_ms.to_string())
            .set("enable.partition.eof", "false");
        for (key, value) in &config.client_properties {
            client_config.set(key, value);
        }

        let consumer: BaseConsumer = client_config.create().map_err(|e| {
            error!("Failed to create Kafka consumer: {}", e);
            e
        })?;
        consumer.subscribe(&[config.topic.as_str()]).map_err(|e| {
            error!("Failed to subscribe to topic {}: {}", config.topic, e);
            e
        })?;

        Ok(Self {
            consumer: Some(consumer),
            poll_timeout: Duration::from_millis(config.poll_timeout_ms),
        })
    }

    fn consumer(&self) -> Result<&BaseConsumer, MessagingError> {
        self.consumer.as_ref().ok_or(MessagingError::Closed)
    }
}

impl MessageReader for KafkaMessageReader {
    fn read(&mut self) -> Result<Option<MessageEvent>, MessagingError> {
        let message = match self.consumer()?.poll(self.poll_timeout) {
            None => return Ok(None),
            Some(result) => result?,
        };

        let payload = message.payload().ok_or_else(|| MessagingError::EmptyPayload {
            topic: message.topic().to_string(),
            partition: message.partition(),
            offset: message.offset(),
        })?;

        debug!(
            topic = message.topic(),
            partition = message.partition(),
            offset = message.offset(),
            "Received listener event"
        );

        let event: ListenerEvent = serde_json::from_slice(payload)?;
        let properties = HashMap::from([
            (TOPIC_PROPERTY.to_string(), message.topic().to_string()),
            (PARTITION_PROPERTY.to_string(), message.partition().to_string()),
            (OFFSET_PROPERTY.to_string(), message.offset().to_string()),
        ]);

        Ok(Some(MessageEvent::new(event, properties)))
    }

    fn delete(&mut self, message: &MessageEvent) -> Result<(), MessagingError> {
        let (topic, partition, offset) = commit_position(message)?;

        let mut positions = TopicPartitionList::new();
        positions.add_partition_offset(topic, partition, Offset::Offset(offset + 1))?;
        self.consumer()?.commit(&positions, CommitMode::Sync)?;

        debug!(topic, partition, offset, "Committed listener event");
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        if let Some(consumer) = self.consumer.take() {
            consumer.unsubscribe();
            drop(consumer);
            info!("Kafka listener event reader closed");
        }
        Ok(())
    }
}

/// Reader wired to Kafka, configured replications and a live source catalog
pub type KafkaMetaStoreEventReader<C> =
    MetaStoreEventReader<KafkaMessageReader, TableReplications, MetastoreTableOracle<C>>;

impl<C: SourceCatalogClient> KafkaMetaStoreEventReader<C> {
    /// Build a reader from loaded configuration
    ///
    /// # Example
    ///
    /// ```ignore
    /// use metastore_event_reader::{KafkaMetaStoreEventReader, ReaderConfig};
    ///
    /// let config = ReaderConfig::load(Some(Path::new("shunting-yard.yml")))?;
    /// let mut reader = KafkaMetaStoreEventReader::from_config(&config, metastore_client)?;
    /// loop {
    ///     if let Some(event) = reader.read()? {
    ///         applier.apply(event)?;
    ///     }
    /// }
    /// ```
    pub fn from_config(config: &ReaderConfig, catalog_client: C) -> ReaderResult<Self> {
        let message_reader = KafkaMessageReader::new(&config.kafka)?;
        let replications = config.table_replications();
        info!(
            replications = replications.len(),
            source_metastore_uris = %config.source_catalog.hive_metastore_uris,
            "Configured metastore event reader"
        );

        let normalizer = EventNormalizer::new(
            config.source_catalog.hive_metastore_uris.as_str(),
            replications,
            MetastoreTableOracle::new(catalog_client),
        );
        Ok(MetaStoreEventReader::new(message_reader, normalizer))
    }
}

/// Topic, partition and offset recorded on a message by [`KafkaMessageReader::read`]
fn commit_position(message: &MessageEvent) -> Result<(&str, i32, i64), MessagingError> {
    let topic = message
        .property(TOPIC_PROPERTY)
        .ok_or(MessagingError::MissingProperty(TOPIC_PROPERTY))?;
    let partition = parse_property(message, PARTITION_PROPERTY)?;
    let offset = parse_property(message, OFFSET_PROPERTY)?;
    Ok((topic, partition, offset))
}

fn parse_property<T: std::str::FromStr>(
    message: &MessageEvent,
    name: &'static str,
) -> Result<T, MessagingError> {
    let value = message
        .property(name)
        .ok_or(MessagingError::MissingProperty(name))?;
    value.parse().map_err(|_| MessagingError::InvalidProperty {
        name,
        value: value.to_string(),
    })
}
