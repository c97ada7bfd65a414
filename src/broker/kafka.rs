//! Kafka broker driver
//!
//! Thin adapters over rdkafka's `BaseConsumer` and `BaseProducer`. Both are
//! synchronous by design; the relay drives them from its worker thread.

use std::time::Duration;

use anyhow::{Context, Result};
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{BaseConsumer, CommitMode, Consumer};
use rdkafka::message::Message;
use rdkafka::producer::{BaseProducer, BaseRecord, Producer};
use tracing::debug;

use crate::config::BrokerSettings;

use super::{BrokerError, InboundMessage, JobConsumer, ResultProducer};

const FLUSH_TIMEOUT: Duration = Duration::from_secs(30);

pub struct KafkaJobConsumer {
    inner: BaseConsumer,
}

impl KafkaJobConsumer {
    pub fn from_settings(settings: &BrokerSettings) -> Result<Self> {
        let inner: BaseConsumer = ClientConfig::new()
            .set("bootstrap.servers", &settings.bootstrap_servers)
            .set("group.id", &settings.group_id)
            .set("enable.auto.commit", "false")
            .set(
                "max.poll.interval.ms",
                settings.max_poll_interval_ms.to_string(),
            )
            .create()
            .context("Failed to create Kafka consumer")?;

        inner
            .subscribe(&[settings.inbound_topic.as_str()])
            .with_context(|| format!("Failed to subscribe to '{}'", settings.inbound_topic))?;

        debug!(
            "Kafka consumer subscribed to '{}' as group '{}'",
            settings.inbound_topic, settings.group_id
        );

        Ok(Self { inner })
    }
}

impl JobConsumer for KafkaJobConsumer {
    fn poll(&mut self, timeout: Duration) -> Result<Option<InboundMessage>, BrokerError> {
        match self.inner.poll(timeout) {
            None => Ok(None),
            Some(Err(e)) => Err(BrokerError::Poll(e.to_string())),
            Some(Ok(message)) => Ok(Some(InboundMessage {
                payload: message.payload().unwrap_or_default().to_vec(),
            })),
        }
    }

    fn commit(&mut self) -> Result<(), BrokerError> {
        self.inner
            .commit_consumer_state(CommitMode::Sync)
            .map_err(|e| BrokerError::Commit(e.to_string()))
    }

    fn close(&mut self) {
        self.inner.unsubscribe();
        debug!("Kafka consumer closed");
    }
}

pub struct KafkaResultProducer {
    inner: BaseProducer,
    topic: String,
}

impl KafkaResultProducer {
    pub fn from_settings(settings: &BrokerSettings) -> Result<Self> {
        let inner: BaseProducer = ClientConfig::new()
            .set("bootstrap.servers", &settings.bootstrap_servers)
            .create()
            .context("Failed to create Kafka producer")?;

        Ok(Self {
            inner,
            topic: settings.outbound_topic.clone(),
        })
    }
}

impl ResultProducer for KafkaResultProducer {
    fn send(&mut self, key: &str, payload: &[u8]) -> Result<(), BrokerError> {
        self.inner
            .send(BaseRecord::to(&self.topic).key(key).payload(payload))
            .map_err(|(e, _)| BrokerError::Publish(e.to_string()))?;

        // Serve delivery callbacks without blocking
        self.inner.poll(Duration::ZERO);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), BrokerError> {
        self.inner
            .flush(FLUSH_TIMEOUT)
            .map_err(|e| BrokerError::Flush(e.to_string()))
    }

    fn close(&mut self) {
        debug!("Kafka producer closed");
    }
}
