//! In-process broker driver
//!
//! Default driver: a bounded channel for the inbound topic and a buffered
//! vector for the outbound one. Keeps single-node deployments and the test
//! suite free of a real broker. The handle side can inject flush and commit
//! failures to exercise the relay's redelivery behavior.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};

use super::{BrokerError, InboundMessage, JobConsumer, ResultProducer};

const TOPIC_CAPACITY: usize = 1024;

#[derive(Default)]
struct Shared {
    /// Records flushed to the outbound topic, in delivery order
    delivered: Mutex<Vec<(String, Vec<u8>)>>,

    /// Records sent but not yet flushed
    buffered: Mutex<Vec<(String, Vec<u8>)>>,

    commits: AtomicUsize,
    flushes: AtomicUsize,
    fail_next_flush: AtomicBool,
    fail_next_commit: AtomicBool,
    consumer_closed: AtomicBool,
    producer_closed: AtomicBool,
}

pub struct MemoryBroker;

impl MemoryBroker {
    /// Create a connected consumer/producer pair plus a handle for feeding
    /// the inbound topic and inspecting the outbound one.
    pub fn new() -> (MemoryConsumer, MemoryProducer, MemoryBrokerHandle) {
        let (feed, inbound) = bounded(TOPIC_CAPACITY);
        let shared = Arc::new(Shared::default());

        (
            MemoryConsumer {
                inbound,
                _feed: feed.clone(),
                shared: shared.clone(),
            },
            MemoryProducer {
                shared: shared.clone(),
            },
            MemoryBrokerHandle { feed, shared },
        )
    }
}

pub struct MemoryConsumer {
    inbound: Receiver<Vec<u8>>,
    // Keeps the channel open even after the handle is dropped
    _feed: Sender<Vec<u8>>,
    shared: Arc<Shared>,
}

impl JobConsumer for MemoryConsumer {
    fn poll(&mut self, timeout: Duration) -> Result<Option<InboundMessage>, BrokerError> {
        match self.inbound.recv_timeout(timeout) {
            Ok(payload) => Ok(Some(InboundMessage { payload })),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Ok(None),
        }
    }

    fn commit(&mut self) -> Result<(), BrokerError> {
        if self.shared.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(BrokerError::Commit("injected commit failure".to_string()));
        }
        self.shared.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn close(&mut self) {
        self.shared.consumer_closed.store(true, Ordering::SeqCst);
    }
}

pub struct MemoryProducer {
    shared: Arc<Shared>,
}

impl ResultProducer for MemoryProducer {
    fn send(&mut self, key: &str, payload: &[u8]) -> Result<(), BrokerError> {
        let mut buffered = self
            .shared
            .buffered
            .lock()
            .map_err(|_| BrokerError::Publish("outbound buffer poisoned".to_string()))?;
        buffered.push((key.to_string(), payload.to_vec()));
        Ok(())
    }

    fn flush(&mut self) -> Result<(), BrokerError> {
        if self.shared.fail_next_flush.swap(false, Ordering::SeqCst) {
            return Err(BrokerError::Flush("injected flush failure".to_string()));
        }

        let mut buffered = self
            .shared
            .buffered
            .lock()
            .map_err(|_| BrokerError::Flush("outbound buffer poisoned".to_string()))?;
        let mut delivered = self
            .shared
            .delivered
            .lock()
            .map_err(|_| BrokerError::Flush("outbound topic poisoned".to_string()))?;
        delivered.append(&mut buffered);

        self.shared.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn close(&mut self) {
        self.shared.producer_closed.store(true, Ordering::SeqCst);
    }
}

/// Feed and inspection side of the in-memory broker
#[derive(Clone)]
pub struct MemoryBrokerHandle {
    feed: Sender<Vec<u8>>,
    shared: Arc<Shared>,
}

impl MemoryBrokerHandle {
    /// Put a message on the inbound topic
    pub fn enqueue(&self, payload: &[u8]) -> Result<(), BrokerError> {
        self.feed
            .try_send(payload.to_vec())
            .map_err(|e| BrokerError::Publish(e.to_string()))
    }

    /// Flushed outbound records, in delivery order
    pub fn delivered(&self) -> Vec<(String, Vec<u8>)> {
        self.shared.delivered.lock().map(|d| d.clone()).unwrap_or_default()
    }

    /// Records queued on the producer but not yet flushed
    pub fn buffered_len(&self) -> usize {
        self.shared.buffered.lock().map(|b| b.len()).unwrap_or(0)
    }

    pub fn commit_count(&self) -> usize {
        self.shared.commits.load(Ordering::SeqCst)
    }

    pub fn flush_count(&self) -> usize {
        self.shared.flushes.load(Ordering::SeqCst)
    }

    /// Make the next `flush` fail once
    pub fn fail_next_flush(&self) {
        self.shared.fail_next_flush.store(true, Ordering::SeqCst);
    }

    /// Make the next `commit` fail once
    pub fn fail_next_commit(&self) {
        self.shared.fail_next_commit.store(true, Ordering::SeqCst);
    }

    pub fn consumer_closed(&self) -> bool {
        self.shared.consumer_closed.load(Ordering::SeqCst)
    }

    pub fn producer_closed(&self) -> bool {
        self.shared.producer_closed.load(Ordering::SeqCst)
    }
}
