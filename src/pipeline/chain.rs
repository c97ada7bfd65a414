//! The per-job processing chain
//!
//! Stage order is fixed: transcribe, align, diarize, assign speakers, filter
//! hallucinations, summarize. The first failing stage aborts the job; there
//! are no partial results.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::engine::{EngineError, SpeakerTurn, SpeechEngine};
use crate::job::{Segment, UNKNOWN_SPEAKER};
use crate::llm::{Summarizer, SummaryError};

/// Engine-backed stages, used to tag failures with where they happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Transcribe,
    Align,
    Diarize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Transcribe => "transcribe",
            Stage::Align => "align",
            Stage::Diarize => "diarize",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("{stage} stage failed: {source}")]
    Stage { stage: Stage, source: EngineError },

    #[error("summarize stage failed: {0}")]
    Summarize(#[from] SummaryError),

    #[error("transcript too large to summarize: {chars} chars exceeds the {limit} char limit")]
    TranscriptTooLarge { chars: usize, limit: usize },
}

/// Everything the chain produces for one job
#[derive(Debug)]
pub struct ChainOutput {
    /// Speaker-attributed segments that survived filtering, in spoken order
    pub segments: Vec<Segment>,

    /// Meeting minutes, empty when nothing was left to summarize
    pub summary: String,
}

pub struct ProcessingChain {
    engine: Arc<dyn SpeechEngine>,
    summarizer: Arc<dyn Summarizer>,
    vad_threshold: f64,
    max_summary_input: usize,
}

impl ProcessingChain {
    pub fn new(
        engine: Arc<dyn SpeechEngine>,
        summarizer: Arc<dyn Summarizer>,
        vad_threshold: f64,
        max_summary_input: usize,
    ) -> Self {
        Self {
            engine,
            summarizer,
            vad_threshold,
            max_summary_input,
        }
    }

    /// Run every stage against the staged recording at `audio`
    pub fn run(&self, audio: &Path) -> Result<ChainOutput, ChainError> {
        let transcription = self
            .engine
            .transcribe(audio)
            .map_err(|source| ChainError::Stage {
                stage: Stage::Transcribe,
                source,
            })?;
        info!(
            "Transcribed {} segments ({})",
            transcription.segments.len(),
            transcription.language
        );

        let aligned = self
            .engine
            .align(&transcription.segments, &transcription.language, audio)
            .map_err(|source| ChainError::Stage {
                stage: Stage::Align,
                source,
            })?;

        let turns = self.engine.diarize(audio).map_err(|source| ChainError::Stage {
            stage: Stage::Diarize,
            source,
        })?;
        debug!("Diarization found {} speaker turns", turns.len());

        let attributed = assign_speakers(aligned, &turns);
        let before = attributed.len();
        let segments = filter_hallucinations(attributed, self.vad_threshold);
        if segments.len() < before {
            debug!(
                "Hallucination filter dropped {} of {} segments",
                before - segments.len(),
                before
            );
        }

        let text = transcript_block(&segments);
        if text.trim().is_empty() {
            warn!("No speech survived filtering, skipping summary");
            return Ok(ChainOutput {
                segments,
                summary: String::new(),
            });
        }

        let chars = text.chars().count();
        if chars > self.max_summary_input {
            return Err(ChainError::TranscriptTooLarge {
                chars,
                limit: self.max_summary_input,
            });
        }

        let summary = self.summarizer.summarize(&text)?;
        info!("Summary generated ({} chars)", summary.chars().count());

        Ok(ChainOutput { segments, summary })
    }
}

/// Give each segment the speaker whose turn overlaps it the most.
///
/// Segments no turn overlaps keep `SPEAKER_UNKNOWN`.
fn assign_speakers(segments: Vec<Segment>, turns: &[SpeakerTurn]) -> Vec<Segment> {
    segments
        .into_iter()
        .map(|mut segment| {
            segment.speaker = dominant_speaker(&segment, turns)
                .unwrap_or_else(|| UNKNOWN_SPEAKER.to_string());
            segment
        })
        .collect()
}

fn dominant_speaker(segment: &Segment, turns: &[SpeakerTurn]) -> Option<String> {
    let mut best: Option<(&str, f64)> = None;
    for turn in turns {
        let overlap = overlap_secs(segment.start, segment.end, turn.start, turn.end);
        if overlap <= 0.0 {
            continue;
        }
        match best {
            Some((_, current)) if current >= overlap => {}
            _ => best = Some((&turn.speaker, overlap)),
        }
    }
    best.map(|(speaker, _)| speaker.to_string())
}

fn overlap_secs(a_start: f64, a_end: f64, b_start: f64, b_end: f64) -> f64 {
    a_end.min(b_end) - a_start.max(b_start)
}

/// Drop segments shorter than `threshold` seconds.
///
/// Catches the sub-perceptual blips speech engines hallucinate over silence.
/// Segments carrying the -1.0 sentinel always fall below the threshold.
fn filter_hallucinations(segments: Vec<Segment>, threshold: f64) -> Vec<Segment> {
    segments
        .into_iter()
        .filter(|segment| segment.duration() >= threshold)
        .collect()
}

/// The text handed to the summarizer: one utterance per line
fn transcript_block(segments: &[Segment]) -> String {
    let mut block = String::new();
    for segment in segments {
        block.push_str(segment.text.as_deref().unwrap_or_default());
        block.push('\n');
    }
    block
}
