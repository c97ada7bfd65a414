//! LLM module for scrivener
//!
//! Turns filtered transcripts into meeting minutes through an
//! OpenAI-compatible chat completions API.

mod client;
mod openai;
mod prompts;

pub use client::{build_summarizer, Summarizer, SummaryError};
pub use openai::ChatCompletionsClient;
pub use prompts::summary_instruction;
