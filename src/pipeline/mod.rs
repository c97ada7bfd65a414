//! Transcription processing pipeline
//!
//! Chains the speech engine stages, speaker assignment, hallucination
//! filtering, and summarization into one per-job pass.

mod chain;

pub use chain::{ChainError, ChainOutput, ProcessingChain, Stage};
