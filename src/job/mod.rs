//! Job data model
//!
//! Wire types shared by the HTTP endpoint and the broker relay. Field names
//! follow the camelCase contract the upstream meeting platform publishes.

mod executor;

pub use executor::{ExecutionError, JobExecutor};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Speaker label used when diarization cannot attribute a segment
pub const UNKNOWN_SPEAKER: &str = "SPEAKER_UNKNOWN";

/// Sentinel for a missing segment timestamp
pub const UNKNOWN_TIME: f64 = -1.0;

/// A transcription job request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDescriptor {
    /// Stable identity of the job, chosen by the submitter
    pub job_id: Uuid,

    /// Object storage key of the recording
    pub source_ref: String,

    /// Informational origin URL of the recording
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,

    /// Size of the recording in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,

    /// Duration of the recording in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u64>,
}

/// One attributed utterance of the transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Speaker label, `SPEAKER_UNKNOWN` until diarization assigns one
    #[serde(default = "default_speaker")]
    pub speaker: String,

    /// Start offset in seconds, -1.0 when the engine omitted it
    #[serde(default = "unknown_time")]
    pub start: f64,

    /// End offset in seconds, -1.0 when the engine omitted it
    #[serde(default = "unknown_time")]
    pub end: f64,

    /// Spoken text, absent for silent segments
    #[serde(default)]
    pub text: Option<String>,
}

fn default_speaker() -> String {
    UNKNOWN_SPEAKER.to_string()
}

fn unknown_time() -> f64 {
    UNKNOWN_TIME
}

impl Segment {
    /// A segment with text but no speaker attribution yet
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            speaker: UNKNOWN_SPEAKER.to_string(),
            start,
            end,
            text: Some(text.into()),
        }
    }

    /// Length of the segment in seconds
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Lifecycle state of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// Outcome of a finished job, published on the outbound topic and returned
/// by the HTTP endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResult {
    /// Identity copied from the descriptor
    pub job_id: Uuid,

    /// Pretty-printed JSON array of the surviving segments
    pub transcript: String,

    /// Meeting minutes, empty when no speech survived filtering
    pub summary: String,

    /// Failure detail, absent on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    pub status: JobStatus,

    /// Wall-clock processing time, human readable (e.g. "1m 32s")
    pub turnaround: String,
}

impl JobResult {
    pub fn completed(job_id: Uuid, transcript: String, summary: String, turnaround: String) -> Self {
        Self {
            job_id,
            transcript,
            summary,
            error_message: None,
            status: JobStatus::Completed,
            turnaround,
        }
    }
}
