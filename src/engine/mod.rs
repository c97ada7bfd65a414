//! Speech engine boundary
//!
//! Transcription, alignment, and diarization run in an external engine;
//! this module only defines the calling contract and the HTTP client for it.

mod http;

pub use http::HttpSpeechEngine;

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::config::EngineSettings;
use crate::job::Segment;

/// Coarse transcription output, segments not yet word-aligned
#[derive(Debug, Clone, Deserialize)]
pub struct Transcription {
    /// Detected language code, e.g. "en" or "ko"
    pub language: String,

    #[serde(default)]
    pub segments: Vec<Segment>,
}

/// One diarized speaker turn
#[derive(Debug, Clone, Deserialize)]
pub struct SpeakerTurn {
    pub speaker: String,
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("speech engine request failed: {0}")]
    Request(String),

    #[error("speech engine returned an invalid response: {0}")]
    InvalidResponse(String),
}

/// The three heavy speech stages.
///
/// Calls block for however long inference takes; the relay runs them on the
/// worker context, never on the request-serving runtime. Implementations are
/// expected to release per-call model resources before returning, since the
/// stages of one job run back to back on shared hardware.
pub trait SpeechEngine: Send + Sync {
    /// Transcribe the recording at `audio`
    fn transcribe(&self, audio: &Path) -> Result<Transcription, EngineError>;

    /// Refine segment timestamps against the audio
    fn align(
        &self,
        segments: &[Segment],
        language: &str,
        audio: &Path,
    ) -> Result<Vec<Segment>, EngineError>;

    /// Detect who spoke when
    fn diarize(&self, audio: &Path) -> Result<Vec<SpeakerTurn>, EngineError>;
}

/// Build the configured speech engine client
pub fn build_engine(settings: &EngineSettings) -> anyhow::Result<Arc<dyn SpeechEngine>> {
    Ok(Arc::new(HttpSpeechEngine::from_settings(settings)?))
}
