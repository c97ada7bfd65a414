//! End-to-end execution of a single job

use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::info;

use crate::job::{JobDescriptor, JobResult};
use crate::media::{MediaStager, StagingError};
use crate::pipeline::{ChainError, ProcessingChain};

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error(transparent)]
    Staging(#[from] StagingError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("failed to encode transcript: {0}")]
    EncodeTranscript(#[from] serde_json::Error),
}

/// Runs jobs: stage the recording, run the chain, shape the result.
///
/// Shared by the broker relay and the HTTP endpoint. Blocking; callers keep
/// it on the worker context.
pub struct JobExecutor {
    stager: MediaStager,
    chain: ProcessingChain,
}

impl JobExecutor {
    pub fn new(stager: MediaStager, chain: ProcessingChain) -> Self {
        Self { stager, chain }
    }

    /// Execute `job` and produce its result.
    ///
    /// Turnaround covers staging through result shaping; scratch cleanup
    /// happens afterwards, when the staged media drops.
    pub fn execute(&self, job: &JobDescriptor) -> Result<JobResult, ExecutionError> {
        let started = Instant::now();
        info!("Job {} started (source '{}')", job.job_id, job.source_ref);

        let staged = self.stager.stage(job)?;
        let output = self.chain.run(staged.audio_path())?;

        let transcript = serde_json::to_string_pretty(&output.segments)?;
        let turnaround = format_turnaround(started.elapsed());
        info!(
            "Job {} completed in {} ({} segments)",
            job.job_id,
            turnaround,
            output.segments.len()
        );

        Ok(JobResult::completed(
            job.job_id,
            transcript,
            output.summary,
            turnaround,
        ))
    }
}

/// Human-readable elapsed time, truncated to milliseconds
fn format_turnaround(elapsed: Duration) -> String {
    let truncated = Duration::from_millis(elapsed.as_millis() as u64);
    humantime::format_duration(truncated).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turnaround_reads_like_a_duration() {
        assert_eq!(format_turnaround(Duration::from_millis(1500)), "1s 500ms");
        assert_eq!(format_turnaround(Duration::from_secs(92)), "1m 32s");
    }

    #[test]
    fn turnaround_drops_sub_millisecond_noise() {
        assert_eq!(format_turnaround(Duration::from_nanos(1_500_300)), "1ms");
    }
}
