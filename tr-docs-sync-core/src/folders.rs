//! Mirror the local directory structure into remote storage.

use std::path::Path;

use serde::Serialize;
use tracing::{error, info};

use crate::contract::RemoteStorage;
use crate::error::PipelineError;
use crate::tree::{local_directories, relative_to, remote_path_for};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderSyncReport {
    /// True when the remote base folder already existed and creation was skipped.
    pub skipped: bool,
    /// Remote folders that were (re)created, in creation order.
    pub created: Vec<String>,
}

/// Create the remote folder tree for `local_root` under `remote_base`.
///
/// When the remote base folder already exists the whole step is skipped
/// unless `force` is set. Subfolders missing below an existing base folder
/// are therefore only created with `force`.
pub async fn synchronise_folders<S>(
    storage: &S,
    local_root: &Path,
    remote_base: &str,
    force: bool,
) -> Result<FolderSyncReport, PipelineError>
where
    S: RemoteStorage + ?Sized,
{
    let base = remote_path_for(remote_base, Path::new(""));

    if !force && storage.folder_exists(&base).await? {
        info!(remote = %base, "Remote folder already exists, skipping folder creation");
        return Ok(FolderSyncReport {
            skipped: true,
            created: Vec::new(),
        });
    }

    info!(remote = %base, force, "Creating upload target folders");
    let mut created = Vec::new();

    storage.make_dirs(&base).await.map_err(|e| {
        error!(remote = %base, error = %e, "Failed to create remote base folder");
        e
    })?;
    created.push(base.clone());

    for dir in local_directories(local_root)? {
        let relative = relative_to(local_root, &dir)?;
        let remote = remote_path_for(&base, &relative);
        info!(dir = %relative.display(), remote = %remote, "Creating remote folder");
        storage.make_dirs(&remote).await.map_err(|e| {
            error!(remote = %remote, error = %e, "Failed to create remote folder");
            e
        })?;
        created.push(remote);
    }

    info!(count = created.len(), "Folder creation successful");
    Ok(FolderSyncReport {
        skipped: false,
        created,
    })
}
