//! Application settings management

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerSettings,

    /// Message broker settings
    #[serde(default)]
    pub broker: BrokerSettings,

    /// Object storage settings (where meeting recordings live)
    #[serde(default)]
    pub storage: StorageSettings,

    /// Speech engine settings (transcription, alignment, diarization)
    #[serde(default)]
    pub engine: EngineSettings,

    /// Summarizer settings
    #[serde(default)]
    pub summarizer: SummarizerSettings,

    /// Processing pipeline settings
    #[serde(default)]
    pub pipeline: PipelineSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Address the HTTP endpoint binds to
    #[serde(default = "default_listen")]
    pub listen: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerSettings {
    /// Broker driver (memory, kafka)
    #[serde(default = "default_broker_driver")]
    pub driver: String,

    /// Bootstrap servers for the kafka driver
    #[serde(default = "default_bootstrap_servers")]
    pub bootstrap_servers: String,

    /// Consumer group id
    #[serde(default = "default_group_id")]
    pub group_id: String,

    /// Topic carrying transcription job requests
    #[serde(default = "default_inbound_topic")]
    pub inbound_topic: String,

    /// Topic carrying finished job results
    #[serde(default = "default_outbound_topic")]
    pub outbound_topic: String,

    /// How long a single poll blocks waiting for a message, in milliseconds
    #[serde(default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,

    /// Minimum interval between scheduled producer flushes, in milliseconds
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,

    /// Max time between polls before the broker evicts the consumer,
    /// in milliseconds. Jobs can take many minutes, so this is generous.
    #[serde(default = "default_max_poll_interval_ms")]
    pub max_poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Storage driver (fs, http)
    #[serde(default = "default_storage_driver")]
    pub driver: String,

    /// Base URL for the http driver (empty = must be configured)
    #[serde(default)]
    pub endpoint: String,

    /// Bucket holding meeting recordings
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Root directory for the fs driver
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,

    /// Download timeout in seconds
    #[serde(default = "default_storage_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Base URL of the speech engine sidecar
    #[serde(default = "default_engine_endpoint")]
    pub endpoint: String,

    /// Inference batch size passed to the engine
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Per-call timeout in seconds. Long meetings transcribe slowly.
    #[serde(default = "default_engine_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerSettings {
    /// Base URL of an OpenAI-compatible chat completions API
    #[serde(default = "default_summarizer_endpoint")]
    pub endpoint: String,

    /// Model name
    #[serde(default = "default_summarizer_model")]
    pub model: String,

    /// API key (empty = no authentication)
    #[serde(default)]
    pub api_key: String,

    /// Largest transcript, in characters, the summarizer accepts
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,

    /// Completion token budget for the summary
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Per-call timeout in seconds
    #[serde(default = "default_summarizer_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Segments shorter than this many seconds are treated as hallucinations
    #[serde(default = "default_vad_threshold")]
    pub vad_threshold: f64,

    /// Directory where per-job scratch areas are created
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,
}

// Default value functions

fn default_data_dir() -> PathBuf {
    ProjectDirs::from("com", "scrivener", "scrivener")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.local/share/scrivener"))
}

fn default_listen() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_broker_driver() -> String {
    "memory".to_string()
}

fn default_bootstrap_servers() -> String {
    "localhost:9092".to_string()
}

fn default_group_id() -> String {
    "scrivener".to_string()
}

fn default_inbound_topic() -> String {
    "transcribe-request".to_string()
}

fn default_outbound_topic() -> String {
    "transcribe-response".to_string()
}

fn default_poll_timeout_ms() -> u64 {
    1000
}

fn default_flush_interval_ms() -> u64 {
    2000
}

fn default_max_poll_interval_ms() -> u64 {
    1_800_000
}

fn default_storage_driver() -> String {
    "fs".to_string()
}

fn default_bucket() -> String {
    "recordings".to_string()
}

fn default_storage_root() -> PathBuf {
    let mut dir = default_data_dir();
    dir.push("objects");
    dir
}

fn default_storage_timeout() -> u64 {
    300
}

fn default_engine_endpoint() -> String {
    "http://127.0.0.1:9000".to_string()
}

fn default_batch_size() -> u32 {
    16
}

fn default_engine_timeout() -> u64 {
    1800
}

fn default_summarizer_endpoint() -> String {
    "http://127.0.0.1:8001/v1".to_string()
}

fn default_summarizer_model() -> String {
    "skt/A.X-4.0-Light".to_string()
}

fn default_max_input_chars() -> usize {
    32_000
}

fn default_max_tokens() -> u32 {
    512
}

fn default_summarizer_timeout() -> u64 {
    120
}

fn default_vad_threshold() -> f64 {
    0.1
}

fn default_scratch_dir() -> PathBuf {
    let mut dir = default_data_dir();
    dir.push("scratch");
    dir
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            driver: default_broker_driver(),
            bootstrap_servers: default_bootstrap_servers(),
            group_id: default_group_id(),
            inbound_topic: default_inbound_topic(),
            outbound_topic: default_outbound_topic(),
            poll_timeout_ms: default_poll_timeout_ms(),
            flush_interval_ms: default_flush_interval_ms(),
            max_poll_interval_ms: default_max_poll_interval_ms(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            driver: default_storage_driver(),
            endpoint: String::new(),
            bucket: default_bucket(),
            root: default_storage_root(),
            timeout_secs: default_storage_timeout(),
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            endpoint: default_engine_endpoint(),
            batch_size: default_batch_size(),
            timeout_secs: default_engine_timeout(),
        }
    }
}

impl Default for SummarizerSettings {
    fn default() -> Self {
        Self {
            endpoint: default_summarizer_endpoint(),
            model: default_summarizer_model(),
            api_key: String::new(),
            max_input_chars: default_max_input_chars(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_summarizer_timeout(),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            vad_threshold: default_vad_threshold(),
            scratch_dir: default_scratch_dir(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            broker: BrokerSettings::default(),
            storage: StorageSettings::default(),
            engine: EngineSettings::default(),
            summarizer: SummarizerSettings::default(),
            pipeline: PipelineSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            tracing::info!("No config file found, using defaults");
            let mut settings = Self::default();
            settings.apply_env_overrides();
            return Ok(settings);
        }

        Self::load_from(&config_path)
    }

    /// Load settings from an explicit configuration file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        settings.apply_env_overrides();

        Ok(settings)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if self.summarizer.api_key.trim().is_empty() {
            if let Ok(key) = std::env::var("SCRIVENER_SUMMARIZER_API_KEY") {
                if !key.trim().is_empty() {
                    self.summarizer.api_key = key;
                }
            }
        }

        if let Ok(servers) = std::env::var("SCRIVENER_BOOTSTRAP_SERVERS") {
            if !servers.trim().is_empty() {
                self.broker.bootstrap_servers = servers;
            }
        }
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("com", "scrivener", "scrivener")
            .context("Could not determine config directory")?;

        let config_dir = dirs.config_dir();
        Ok(config_dir.join("config.toml"))
    }

    /// Write default configuration to a file
    pub fn write_default(path: &Path) -> Result<()> {
        let settings = Self::default();
        let content = toml::to_string_pretty(&settings)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Ensure all required directories exist
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.pipeline.scratch_dir)?;
        if self.storage.driver == "fs" {
            std::fs::create_dir_all(&self.storage.root)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_relay_cadence() {
        let settings = Settings::default();
        assert_eq!(settings.broker.poll_timeout_ms, 1000);
        assert_eq!(settings.broker.flush_interval_ms, 2000);
        assert_eq!(settings.broker.max_poll_interval_ms, 1_800_000);
        assert_eq!(settings.pipeline.vad_threshold, 0.1);
    }

    #[test]
    fn defaults_to_transcribe_topics() {
        let settings = Settings::default();
        assert_eq!(settings.broker.inbound_topic, "transcribe-request");
        assert_eq!(settings.broker.outbound_topic, "transcribe-response");
        assert_eq!(settings.broker.driver, "memory");
    }

    #[test]
    fn partial_config_fills_in_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [broker]
            driver = "kafka"
            bootstrap_servers = "broker-1:9092"

            [summarizer]
            model = "gpt-4o-mini"
            "#,
        )
        .unwrap();

        assert_eq!(settings.broker.driver, "kafka");
        assert_eq!(settings.broker.bootstrap_servers, "broker-1:9092");
        assert_eq!(settings.broker.group_id, "scrivener");
        assert_eq!(settings.summarizer.model, "gpt-4o-mini");
        assert_eq!(settings.summarizer.max_input_chars, 32_000);
        assert_eq!(settings.engine.batch_size, 16);
    }
}
