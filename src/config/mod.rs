//! Configuration module for scrivener
//!
//! Handles loading and managing application settings from TOML files.

mod settings;

pub use settings::{
    BrokerSettings, EngineSettings, PipelineSettings, ServerSettings, Settings, StorageSettings,
    SummarizerSettings,
};
