//! Per-job scratch areas and media staging
//!
//! Every job gets its own scratch directory, removed when the job's
//! [`StagedMedia`] is dropped. Cleanup therefore happens on success and on
//! every failure path alike, including mid-pipeline errors.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::job::JobDescriptor;

use super::{ObjectStore, StagingError};

/// A job-private scratch directory, removed on drop
#[derive(Debug)]
pub struct ScratchArea {
    path: PathBuf,
}

impl ScratchArea {
    /// Create `base/<job_id>`, including any missing parents
    pub fn create(base: &Path, job_id: Uuid) -> std::io::Result<Self> {
        let path = base.join(job_id.to_string());
        std::fs::create_dir_all(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchArea {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove scratch area {}: {}", self.path.display(), e);
            }
        }
    }
}

/// A recording staged into scratch space, ready for the pipeline.
///
/// Owns the scratch area; keep it alive for as long as the audio is needed.
#[derive(Debug)]
pub struct StagedMedia {
    scratch: ScratchArea,
    audio_path: PathBuf,
}

impl StagedMedia {
    /// Local path of the staged recording
    pub fn audio_path(&self) -> &Path {
        &self.audio_path
    }

    /// The scratch directory holding the recording
    pub fn scratch_path(&self) -> &Path {
        self.scratch.path()
    }
}

/// Brings recordings from object storage into per-job scratch areas
pub struct MediaStager {
    store: Arc<dyn ObjectStore>,
    scratch_base: PathBuf,
}

impl MediaStager {
    pub fn new(store: Arc<dyn ObjectStore>, scratch_base: PathBuf) -> Self {
        Self { store, scratch_base }
    }

    /// Download the job's recording into a fresh scratch area.
    ///
    /// The scratch area is removed again if the fetch fails.
    pub fn stage(&self, job: &JobDescriptor) -> Result<StagedMedia, StagingError> {
        let scratch = ScratchArea::create(&self.scratch_base, job.job_id)?;

        let file_name = object_file_name(&job.source_ref).ok_or_else(|| StagingError::Transfer {
            key: job.source_ref.clone(),
            reason: "source ref does not name a file".to_string(),
        })?;

        let audio_path = scratch.path().join(file_name);
        self.store.fetch(&job.source_ref, &audio_path)?;

        debug!(
            "Staged '{}' for job {} at {}",
            job.source_ref,
            job.job_id,
            audio_path.display()
        );

        Ok(StagedMedia { scratch, audio_path })
    }
}

/// Final path component of an object key, `None` for keys that name
/// a directory or are empty
fn object_file_name(key: &str) -> Option<&str> {
    if key.ends_with('/') {
        return None;
    }
    Path::new(key).file_name().and_then(|name| name.to_str())
}
