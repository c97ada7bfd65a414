use std::sync::Arc;

use anyhow::Result;
use thiserror::Error;

use crate::config::SummarizerSettings;
use crate::llm::openai::ChatCompletionsClient;

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("summarizer request failed: {0}")]
    Request(String),

    #[error("summarizer returned an invalid response: {0}")]
    InvalidResponse(String),
}

/// Writes meeting minutes from a transcript.
///
/// Called from the worker context; implementations may block.
pub trait Summarizer: Send + Sync {
    fn summarize(&self, transcript: &str) -> Result<String, SummaryError>;
}

/// Build a summarizer from runtime settings.
pub fn build_summarizer(settings: &SummarizerSettings) -> Result<Arc<dyn Summarizer>> {
    Ok(Arc::new(ChatCompletionsClient::from_settings(settings)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarizer_requires_an_endpoint() {
        let mut settings = SummarizerSettings::default();
        settings.endpoint = String::new();

        let err = match build_summarizer(&settings) {
            Ok(_) => panic!("expected summarizer creation to fail"),
            Err(e) => e.to_string(),
        };
        assert!(err.contains("endpoint"));
    }
}
