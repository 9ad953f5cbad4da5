use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::PipelineError;

/// What the reconciler found at the download path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReconcileOutcome {
    /// Nothing (or nothing usable as a directory) was there.
    Absent,
    /// An empty directory was left in place.
    Empty,
    /// A non-empty directory was deleted.
    Removed,
}

/// Make sure a download starts from an empty folder so the export and the
/// upload only see documents from this run.
///
/// A non-empty directory at `path` is removed recursively; anything else is
/// left alone.
pub fn reconcile_download_folder(path: &Path) -> Result<ReconcileOutcome, PipelineError> {
    info!(path = %path.display(), "Checking for existing download folder");
    let to_err = |source| PipelineError::Reconcile {
        path: path.to_path_buf(),
        source,
    };

    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!(path = %path.display(), "No download folder found");
            return Ok(ReconcileOutcome::Absent);
        }
        Err(e) => return Err(to_err(e)),
    };

    if !metadata.is_dir() {
        warn!(
            path = %path.display(),
            "Download path exists but is not a directory, leaving it alone"
        );
        return Ok(ReconcileOutcome::Absent);
    }

    let mut entries = fs::read_dir(path).map_err(to_err)?;
    if entries.next().is_none() {
        debug!(path = %path.display(), "Download folder is already empty");
        return Ok(ReconcileOutcome::Empty);
    }

    fs::remove_dir_all(path).map_err(to_err)?;
    info!(path = %path.display(), "Deleted existing non-empty download folder");
    Ok(ReconcileOutcome::Removed)
}
