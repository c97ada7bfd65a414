//! Filesystem-backed object store
//!
//! Treats a local directory as the bucket. Used for development and tests,
//! and for deployments where recordings arrive over a shared mount.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{ObjectStore, StagingError};

pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

impl ObjectStore for FsObjectStore {
    fn fetch(&self, key: &str, dest: &Path) -> Result<(), StagingError> {
        let source = self.root.join(key);

        if !source.is_file() {
            return Err(StagingError::Missing {
                bucket: self.root.display().to_string(),
                key: key.to_string(),
            });
        }

        std::fs::copy(&source, dest).map_err(|e| match e.kind() {
            ErrorKind::PermissionDenied => StagingError::Denied {
                key: key.to_string(),
            },
            _ => StagingError::Transfer {
                key: key.to_string(),
                reason: e.to_string(),
            },
        })?;

        Ok(())
    }
}
