//! HTTP client for the speech engine sidecar
//!
//! The sidecar exposes the three stages as JSON endpoints and shares the
//! scratch volume with this service, so requests carry local file paths
//! instead of audio bytes.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::EngineSettings;
use crate::job::Segment;

use super::{EngineError, SpeechEngine, SpeakerTurn, Transcription};

#[derive(Debug)]
pub struct HttpSpeechEngine {
    http: reqwest::blocking::Client,
    endpoint: String,
    batch_size: u32,
}

impl HttpSpeechEngine {
    pub fn from_settings(settings: &EngineSettings) -> Result<Self> {
        if settings.endpoint.trim().is_empty() {
            anyhow::bail!(
                "Speech engine endpoint is not configured. Set engine.endpoint in the config file."
            );
        }

        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("Failed to build speech engine HTTP client")?;

        Ok(Self {
            http,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            batch_size: settings.batch_size,
        })
    }

    fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, EngineError> {
        let url = format!("{}{}", self.endpoint, path);

        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .map_err(|e| EngineError::Request(e.to_string()))?
            .error_for_status()
            .map_err(|e| EngineError::Request(e.to_string()))?;

        response
            .json()
            .map_err(|e| EngineError::InvalidResponse(e.to_string()))
    }
}

#[derive(Serialize)]
struct TranscribeRequest<'a> {
    audio_path: &'a str,
    batch_size: u32,
}

#[derive(Serialize)]
struct AlignRequest<'a> {
    audio_path: &'a str,
    language: &'a str,
    segments: &'a [Segment],
}

#[derive(Serialize)]
struct DiarizeRequest<'a> {
    audio_path: &'a str,
}

#[derive(Deserialize)]
struct SegmentsResponse {
    #[serde(default)]
    segments: Vec<Segment>,
}

#[derive(Deserialize)]
struct TurnsResponse {
    #[serde(default)]
    turns: Vec<SpeakerTurn>,
}

impl SpeechEngine for HttpSpeechEngine {
    fn transcribe(&self, audio: &Path) -> Result<Transcription, EngineError> {
        let audio_path = audio.to_string_lossy();
        self.post_json(
            "/v1/transcribe",
            &TranscribeRequest {
                audio_path: &audio_path,
                batch_size: self.batch_size,
            },
        )
    }

    fn align(
        &self,
        segments: &[Segment],
        language: &str,
        audio: &Path,
    ) -> Result<Vec<Segment>, EngineError> {
        let audio_path = audio.to_string_lossy();
        let response: SegmentsResponse = self.post_json(
            "/v1/align",
            &AlignRequest {
                audio_path: &audio_path,
                language,
                segments,
            },
        )?;
        Ok(response.segments)
    }

    fn diarize(&self, audio: &Path) -> Result<Vec<SpeakerTurn>, EngineError> {
        let audio_path = audio.to_string_lossy();
        let response: TurnsResponse = self.post_json(
            "/v1/diarize",
            &DiarizeRequest {
                audio_path: &audio_path,
            },
        )?;
        Ok(response.turns)
    }
}
