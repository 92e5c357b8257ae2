//! Pull-based reader turning queued listener events into canonical events

use metastore_event::MetaStoreEvent;
use std::collections::HashMap;
use std::io;
use tracing::{debug, info, warn};

use crate::catalog::PartitionedTableOracle;
use crate::error::{MessagingError, ReaderError, ReaderResult};
use crate::listener::ListenerEvent;
use crate::normalizer::EventNormalizer;
use crate::replication::ReplicationTargetResolver;

/// A listener event as delivered by the queue, with transport metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEvent {
    event: ListenerEvent,
    properties: HashMap<String, String>,
}

impl MessageEvent {
    pub fn new(event: ListenerEvent, properties: HashMap<String, String>) -> Self {
        Self { event, properties }
    }

    pub fn event(&self) -> &ListenerEvent {
        &self.event
    }

    /// Transport properties (receipt handle, topic/partition/offset, ...)
    pub fn properties(&self) -> &HashMap<String, String> {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }
}

/// Queue client delivering listener events
///
/// The transport is expected to be at-least-once; `delete` acknowledges a
/// message so it is not delivered again.
pub trait MessageReader {
    /// Next message, or `None` if nothing is currently available
    fn read(&mut self) -> Result<Option<MessageEvent>, MessagingError>;

    fn delete(&mut self, message: &MessageEvent) -> Result<(), MessagingError>;

    fn close(&mut self) -> io::Result<()>;
}

/// Reads listener events from a queue and returns them as [`MetaStoreEvent`]s
///
/// ## Delivery semantics
///
/// Each message is deleted from the queue *before* it is normalized, so the
/// reader delivers at most once: if the process dies after `read` acknowledged
/// a message but before the caller applied the returned event, that event is
/// lost. Likewise a message whose normalization fails (catalog unreachable,
/// malformed payload) is already gone when the error is returned. Callers that
/// cannot tolerate loss must reconcile the replica independently.
///
/// ## Concurrency
///
/// `read` takes `&mut self`; the reader owns its queue client and is meant to
/// be driven by a single caller loop:
///
/// ```ignore
/// while running {
///     match reader.read() {
///         Ok(Some(event)) => applier.apply(event)?,
///         Ok(None) => continue,
///         Err(e) if e.is_transport() => return Err(e.into()),
///         Err(e) => warn!(error = %e, "Skipping event"),
///     }
/// }
/// reader.close()?;
/// ```
pub struct MetaStoreEventReader<M, R, O> {
    message_reader: M,
    normalizer: EventNormalizer<R, O>,
    closed: bool,
}

impl<M, R, O> MetaStoreEventReader<M, R, O>
where
    M: MessageReader,
    R: ReplicationTargetResolver,
    O: PartitionedTableOracle,
{
    pub fn new(message_reader: M, normalizer: EventNormalizer<R, O>) -> Self {
        Self {
            message_reader,
            normalizer,
            closed: false,
        }
    }

    /// Read, acknowledge and normalize the next event
    ///
    /// # Returns
    ///
    /// - `Ok(Some(event))` for the next queued event
    /// - `Ok(None)` if the queue is currently empty
    /// - `Err` on transport failure, or if the acknowledged event could not be normalized
    pub fn read(&mut self) -> ReaderResult<Option<MetaStoreEvent>> {
        if self.closed {
            return Err(ReaderError::Closed);
        }

        let Some(message) = self.message_reader.read()? else {
            return Ok(None);
        };

        let listener_event = message.event();
        debug!(
            event_type = %listener_event.event_type(),
            table = %listener_event.header().qualified_table_name(),
            "Read listener event"
        );

        // Acknowledge before normalizing: at-most-once delivery
        self.message_reader.delete(&message)?;

        match self.normalizer.normalize(listener_event) {
            Ok(event) => Ok(Some(event)),
            Err(e) => {
                warn!(
                    event_type = %listener_event.event_type(),
                    table = %listener_event.header().qualified_table_name(),
                    error = %e,
                    "Acknowledged event could not be normalized and will not be redelivered"
                );
                Err(e)
            }
        }
    }

    /// Release the queue client
    ///
    /// Subsequent `read` calls fail with [`ReaderError::Closed`]; closing again is a no-op.
    pub fn close(&mut self) -> ReaderResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.message_reader.close()?;
        info!("Metastore event reader closed");
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}
