//! scrivener - meeting transcription relay service
//!
//! Consumes transcription jobs from a broker or over HTTP, stages the
//! recording from object storage, runs it through external speech and
//! summarization engines, and publishes the transcript with its minutes.

pub mod broker;
pub mod cli;
pub mod config;
pub mod engine;
pub mod job;
pub mod llm;
pub mod media;
pub mod pipeline;
pub mod relay;
pub mod service;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "scrivener";
