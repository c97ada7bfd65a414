use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::SummarizerSettings;
use crate::llm::client::{Summarizer, SummaryError};
use crate::llm::prompts::summary_instruction;

const SUMMARY_TEMPERATURE: f32 = 0.0;

pub struct ChatCompletionsClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    max_tokens: u32,
}

impl ChatCompletionsClient {
    pub fn from_settings(settings: &SummarizerSettings) -> Result<Self> {
        if settings.endpoint.trim().is_empty() {
            anyhow::bail!(
                "Summarizer endpoint is not configured. Set summarizer.endpoint in the config file."
            );
        }

        let api_key = match settings.api_key.trim() {
            "" => None,
            key => Some(key.to_string()),
        };

        Ok(Self {
            http: reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(settings.timeout_secs))
                .build()
                .context("Failed to build summarizer HTTP client")?,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            model: settings.model.trim().to_string(),
            api_key,
            max_tokens: settings.max_tokens,
        })
    }
}

impl Summarizer for ChatCompletionsClient {
    fn summarize(&self, transcript: &str) -> Result<String, SummaryError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: summary_instruction(),
                },
                ChatMessage {
                    role: "user",
                    content: transcript,
                },
            ],
            temperature: SUMMARY_TEMPERATURE,
            max_tokens: self.max_tokens,
        };

        let mut request = self
            .http
            .post(format!("{}/chat/completions", self.endpoint))
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .map_err(|e| SummaryError::Request(e.to_string()))?
            .error_for_status()
            .map_err(|e| SummaryError::Request(e.to_string()))?;

        let payload: ChatResponse = response
            .json()
            .map_err(|e| SummaryError::InvalidResponse(e.to_string()))?;

        payload
            .choices
            .iter()
            .map(|choice| choice.message.content.trim())
            .find(|content| !content.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                SummaryError::InvalidResponse("response did not contain summary text".to_string())
            })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}
