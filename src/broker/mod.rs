//! Message broker boundary
//!
//! The relay consumes job requests and publishes results through these
//! traits. Offsets are committed manually, and only after the matching
//! result has been flushed; delivery is therefore at-least-once.

mod memory;

#[cfg(feature = "kafka")]
mod kafka;

pub use memory::{MemoryBroker, MemoryBrokerHandle, MemoryConsumer, MemoryProducer};

use std::time::Duration;

use thiserror::Error;

use crate::config::BrokerSettings;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("poll failed: {0}")]
    Poll(String),

    #[error("publish failed: {0}")]
    Publish(String),

    #[error("flush failed: {0}")]
    Flush(String),

    #[error("commit failed: {0}")]
    Commit(String),
}

/// One message pulled from the inbound topic
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub payload: Vec<u8>,
}

/// Consumes job requests from the inbound topic.
///
/// Auto-commit must be off in implementations; the relay decides when an
/// offset is safe to commit.
pub trait JobConsumer: Send {
    /// Wait up to `timeout` for the next message. `Ok(None)` on a quiet topic.
    fn poll(&mut self, timeout: Duration) -> Result<Option<InboundMessage>, BrokerError>;

    /// Synchronously commit the offsets of every message polled so far
    fn commit(&mut self) -> Result<(), BrokerError>;

    /// Release the consumer's broker handle
    fn close(&mut self);
}

/// Publishes job results to the outbound topic.
///
/// `send` only queues; records are not durable until a `flush` succeeds.
pub trait ResultProducer: Send {
    fn send(&mut self, key: &str, payload: &[u8]) -> Result<(), BrokerError>;

    /// Block until every queued record is acknowledged
    fn flush(&mut self) -> Result<(), BrokerError>;

    /// Release the producer's broker handle
    fn close(&mut self);
}

/// Build the consumer/producer pair selected by configuration
pub fn build(
    settings: &BrokerSettings,
) -> anyhow::Result<(Box<dyn JobConsumer>, Box<dyn ResultProducer>)> {
    match settings.driver.as_str() {
        "memory" => {
            let (consumer, producer, _) = MemoryBroker::new();
            Ok((Box::new(consumer), Box::new(producer)))
        }
        "kafka" => build_kafka(settings),
        other => anyhow::bail!("Unknown broker driver '{}'. Available drivers: memory, kafka", other),
    }
}

#[cfg(feature = "kafka")]
fn build_kafka(
    settings: &BrokerSettings,
) -> anyhow::Result<(Box<dyn JobConsumer>, Box<dyn ResultProducer>)> {
    let consumer = kafka::KafkaJobConsumer::from_settings(settings)?;
    let producer = kafka::KafkaResultProducer::from_settings(settings)?;
    Ok((Box::new(consumer), Box::new(producer)))
}

#[cfg(not(feature = "kafka"))]
fn build_kafka(
    _settings: &BrokerSettings,
) -> anyhow::Result<(Box<dyn JobConsumer>, Box<dyn ResultProducer>)> {
    anyhow::bail!("This build has no Kafka support. Rebuild with `--features kafka`.")
}
