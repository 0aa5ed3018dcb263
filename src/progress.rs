//! Durable per-job progress records.
//!
//! One named JSON record per job id, fully overwritten on every update and
//! readable by an independent poller at any time, including after the job
//! finished or failed. Writes and deletes are best-effort: progress is
//! observability, not correctness, so a store failure is logged and
//! swallowed rather than allowed to abort a pipeline.
//!
//! The store is rooted at a configured endpoint directory with a `progress/`
//! container that is lazily ensured at construction (a pre-existing
//! container is not an error). Records are written atomically via a
//! temporary file and rename so a concurrent reader never observes a
//! partial record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Fixed stage vocabulary for progress records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStage {
    Structuring,
    Perspectives,
    Testspec,
    Converting,
    Completed,
    Failed,
}

impl std::fmt::Display for ProgressStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Structuring => "structuring",
            Self::Perspectives => "perspectives",
            Self::Testspec => "testspec",
            Self::Converting => "converting",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// Current status of one job. Overwritten in place on every update; no
/// history is retained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub stage: ProgressStage,
    pub message: String,
    pub progress: u8,
    pub timestamp: DateTime<Utc>,
}

/// Container directory name under the store endpoint.
const CONTAINER: &str = "progress";

/// Keyed status store, one record per job id.
pub struct ProgressTracker {
    container: PathBuf,
}

impl ProgressTracker {
    /// Open the tracker rooted at `endpoint`.
    ///
    /// The `progress/` container is ensured to exist; failure to ensure it
    /// is swallowed (creation is idempotent and a later write will surface
    /// its own failure as a logged, non-fatal event).
    #[must_use]
    pub fn new(endpoint: &Path) -> Self {
        let container = endpoint.join(CONTAINER);
        if let Err(e) = std::fs::create_dir_all(&container) {
            warn!(container = %container.display(), error = %e, "Failed to ensure progress container");
        }
        Self { container }
    }

    /// Open the tracker using the configured endpoint from the environment.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Misconfiguration` when no endpoint is
    /// configured; a missing endpoint is fatal at construction time, not at
    /// first use.
    pub fn from_env() -> Result<Self, crate::error::GatewayError> {
        Ok(Self::new(&crate::config::progress_endpoint()?))
    }

    fn record_path(&self, job_id: &str) -> PathBuf {
        self.container.join(format!("{job_id}.json"))
    }

    /// Best-effort overwrite of the job's record. An update with a new id
    /// creates the record; there is no separate create operation. Store
    /// failures are logged and swallowed so the pipeline never aborts over
    /// a progress write.
    pub fn update(&self, job_id: &str, stage: ProgressStage, message: &str, progress: u8) {
        let record = ProgressRecord {
            stage,
            message: message.to_string(),
            progress,
            timestamp: Utc::now(),
        };
        match self.write_atomic(job_id, &record) {
            Ok(()) => debug!(job_id, %stage, progress, "Progress updated"),
            Err(e) => warn!(job_id, %stage, error = %e, "Progress update failed; continuing"),
        }
    }

    fn write_atomic(&self, job_id: &str, record: &ProgressRecord) -> std::io::Result<()> {
        let json = serde_json::to_string(record)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.container)?;
        tmp.write_all(json.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.record_path(job_id))
            .map_err(|e| e.error)?;
        Ok(())
    }

    /// Read the job's current record.
    ///
    /// Any failure (absent record, unreadable store, malformed content)
    /// collapses to `None`; the caller cannot distinguish a transient read
    /// error from a genuinely absent record. That conflation is an accepted
    /// trade-off: polling clients only need "nothing to show yet".
    #[must_use]
    pub fn get(&self, job_id: &str) -> Option<ProgressRecord> {
        let bytes = std::fs::read(self.record_path(job_id)).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    /// Best-effort removal of the job's record. Failures are swallowed.
    pub fn delete(&self, job_id: &str) {
        if let Err(e) = std::fs::remove_file(self.record_path(job_id)) {
            debug!(job_id, error = %e, "Progress delete was a no-op or failed");
        }
    }
}
