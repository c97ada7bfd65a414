//! HTTP-backed object store
//!
//! Streams objects from an S3-compatible gateway or any static file server
//! laid out as `{endpoint}/{bucket}/{key}`.

use std::fs::File;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::StatusCode;

use crate::config::StorageSettings;

use super::{ObjectStore, StagingError};

#[derive(Debug)]
pub struct HttpObjectStore {
    http: reqwest::blocking::Client,
    endpoint: String,
    bucket: String,
}

impl HttpObjectStore {
    pub fn from_settings(settings: &StorageSettings) -> Result<Self> {
        if settings.endpoint.trim().is_empty() {
            anyhow::bail!(
                "Storage endpoint is not configured. Set storage.endpoint in the config file."
            );
        }

        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("Failed to build storage HTTP client")?;

        Ok(Self {
            http,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            bucket: settings.bucket.clone(),
        })
    }
}

impl ObjectStore for HttpObjectStore {
    fn fetch(&self, key: &str, dest: &Path) -> Result<(), StagingError> {
        let url = format!("{}/{}/{}", self.endpoint, self.bucket, key);

        let response = self.http.get(&url).send().map_err(|e| StagingError::Transfer {
            key: key.to_string(),
            reason: e.to_string(),
        })?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(StagingError::Missing {
                bucket: self.bucket.clone(),
                key: key.to_string(),
            }),
            StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED => Err(StagingError::Denied {
                key: key.to_string(),
            }),
            status if !status.is_success() => Err(StagingError::Transfer {
                key: key.to_string(),
                reason: format!("unexpected status {status}"),
            }),
            _ => {
                let mut file = File::create(dest)?;
                let mut body = response;
                std::io::copy(&mut body, &mut file).map_err(|e| StagingError::Transfer {
                    key: key.to_string(),
                    reason: e.to_string(),
                })?;
                Ok(())
            }
        }
    }
}
