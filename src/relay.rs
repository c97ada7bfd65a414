//! The transcribe relay
//!
//! One loop, one thread: poll the inbound topic, execute the job, publish
//! the result, flush, then commit the offset. A failure anywhere in that
//! sequence leaves the offset uncommitted so the broker redelivers the job.
//! Commits never happen for work whose result is not flushed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::broker::{BrokerError, InboundMessage, JobConsumer, ResultProducer};
use crate::config::BrokerSettings;
use crate::job::{ExecutionError, JobDescriptor, JobExecutor};

/// Cooperative stop flag shared between the relay loop and its runner
#[derive(Clone, Default)]
pub struct ShutdownSignal(Arc<AtomicBool>);

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Error)]
enum ProcessError {
    #[error("malformed job payload: {0}")]
    Malformed(serde_json::Error),

    #[error("job execution failed: {0}")]
    Execution(#[from] ExecutionError),

    #[error("failed to encode job result: {0}")]
    Encode(serde_json::Error),

    #[error("result publish failed: {0}")]
    Publish(BrokerError),

    #[error("offset commit failed after publish: {0}")]
    Commit(BrokerError),
}

pub struct TranscribeRelay {
    consumer: Box<dyn JobConsumer>,
    producer: Box<dyn ResultProducer>,
    executor: Arc<JobExecutor>,
    poll_timeout: Duration,
    flush_interval: Duration,
    pending: usize,
    last_flush: Instant,
}

impl TranscribeRelay {
    pub fn new(
        consumer: Box<dyn JobConsumer>,
        producer: Box<dyn ResultProducer>,
        executor: Arc<JobExecutor>,
        settings: &BrokerSettings,
    ) -> Self {
        Self {
            consumer,
            producer,
            executor,
            poll_timeout: Duration::from_millis(settings.poll_timeout_ms),
            flush_interval: Duration::from_millis(settings.flush_interval_ms),
            pending: 0,
            last_flush: Instant::now(),
        }
    }

    /// Run until `shutdown` is requested, then close both broker handles.
    ///
    /// Blocking; the runner hosts this on a dedicated worker thread. An
    /// in-flight job always finishes its publish/commit sequence before the
    /// flag is honored.
    pub fn run(mut self, shutdown: &ShutdownSignal) {
        info!(
            "Transcribe relay started (poll {:?}, flush every {:?})",
            self.poll_timeout, self.flush_interval
        );

        while !shutdown.is_requested() {
            let message = match self.consumer.poll(self.poll_timeout) {
                Ok(message) => message,
                Err(e) => {
                    warn!("Inbound poll failed: {}", e);
                    None
                }
            };

            self.flush_if_due();

            let Some(message) = message else { continue };

            if let Err(e) = self.process(&message) {
                match e {
                    ProcessError::Malformed(_) => {
                        warn!("{}; offset left uncommitted", e);
                    }
                    ProcessError::Commit(_) => {
                        error!("{}; job may be redelivered and republished", e);
                    }
                    _ => {
                        error!("{}; offset left uncommitted, awaiting redelivery", e);
                    }
                }
            }
        }

        self.shutdown();
    }

    /// Decode, execute, publish, flush, commit. Any error aborts the
    /// sequence and skips the commit.
    fn process(&mut self, message: &InboundMessage) -> Result<(), ProcessError> {
        let job: JobDescriptor =
            serde_json::from_slice(&message.payload).map_err(ProcessError::Malformed)?;
        debug!("Transcription requested for job {}", job.job_id);

        let result = self.executor.execute(&job)?;

        let payload = serde_json::to_vec(&result).map_err(ProcessError::Encode)?;
        let key = job.job_id.to_string();
        self.producer
            .send(&key, &payload)
            .map_err(ProcessError::Publish)?;
        self.pending += 1;

        self.flush().map_err(ProcessError::Publish)?;
        self.consumer.commit().map_err(ProcessError::Commit)?;

        info!("Job {} relayed ({})", job.job_id, result.turnaround);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), BrokerError> {
        self.producer.flush()?;
        self.pending = 0;
        self.last_flush = Instant::now();
        Ok(())
    }

    /// Scheduled flush for records a failed per-job flush left behind.
    /// Failures are logged and retried on the next pass.
    fn flush_if_due(&mut self) {
        if self.pending == 0 || self.last_flush.elapsed() < self.flush_interval {
            return;
        }
        debug!("Scheduled flush of {} pending records", self.pending);
        if let Err(e) = self.flush() {
            warn!("Scheduled flush failed: {}", e);
        }
    }

    /// Final flush, then release the consumer before the producer
    fn shutdown(mut self) {
        if let Err(e) = self.producer.flush() {
            error!("Final flush failed: {}", e);
        }
        self.consumer.close();
        self.producer.close();
        info!("Transcribe relay stopped");
    }
}
