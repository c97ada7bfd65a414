//! Object storage access and per-job media staging

mod fs;
mod http;
mod stager;

pub use fs::FsObjectStore;
pub use http::HttpObjectStore;
pub use stager::{MediaStager, ScratchArea, StagedMedia};

use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::config::StorageSettings;

/// Failures while bringing a recording into local scratch space
#[derive(Debug, Error)]
pub enum StagingError {
    #[error("object '{key}' not found in bucket '{bucket}'")]
    Missing { bucket: String, key: String },

    #[error("access to object '{key}' denied")]
    Denied { key: String },

    #[error("failed to transfer object '{key}': {reason}")]
    Transfer { key: String, reason: String },

    #[error("scratch area error: {0}")]
    Scratch(#[from] std::io::Error),
}

/// Read access to the bucket holding meeting recordings.
///
/// Implementations are called from the worker context and may block.
pub trait ObjectStore: Send + Sync {
    /// Fetch the object at `key` into the local file `dest`,
    /// creating or truncating it.
    fn fetch(&self, key: &str, dest: &Path) -> Result<(), StagingError>;
}

/// Build the object store selected by configuration
pub fn build_store(settings: &StorageSettings) -> anyhow::Result<Arc<dyn ObjectStore>> {
    match settings.driver.as_str() {
        "fs" => Ok(Arc::new(FsObjectStore::new(settings.root.clone()))),
        "http" => Ok(Arc::new(HttpObjectStore::from_settings(settings)?)),
        other => anyhow::bail!("Unknown storage driver '{}'. Available drivers: fs, http", other),
    }
}
