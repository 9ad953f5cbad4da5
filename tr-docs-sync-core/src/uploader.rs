use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{error, info, warn};

use crate::contract::RemoteStorage;
use crate::error::{PipelineError, RemoteError};
use crate::tree::{local_files, relative_to, remote_path_for};

/// One file that made it to remote storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedFile {
    pub local_path: PathBuf,
    pub remote_path: String,
    pub bytes: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UploadReport {
    pub files: Vec<UploadedFile>,
}

impl UploadReport {
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.bytes).sum()
    }
}

/// WebDAV answers 409 when the parent collection of a PUT does not exist.
/// Folder creation is skipped once the remote base exists, so new local
/// subfolders only appear remotely with a forced folder sync.
pub fn missing_folder_hint(error: &RemoteError) -> Option<&'static str> {
    match error {
        RemoteError::Status { status: 409, .. } => Some(
            "Remote parent folder is missing; rerun with --force-nc-folder-create",
        ),
        _ => None,
    }
}

/// Upload every file below `local_root` to the matching path under
/// `remote_base`, overwriting what is there.
///
/// Files go up one at a time; the first failure aborts the run.
pub async fn upload_tree<S>(
    storage: &S,
    local_root: &Path,
    remote_base: &str,
) -> Result<UploadReport, PipelineError>
where
    S: RemoteStorage + ?Sized,
{
    info!(
        local = %local_root.display(),
        remote = %remote_base,
        "Uploading files and folders"
    );

    let mut report = UploadReport::default();
    for file in local_files(local_root)? {
        let relative = relative_to(local_root, &file)?;
        let remote_path = remote_path_for(remote_base, &relative);
        info!(file = %relative.display(), remote = %remote_path, "Uploading file");

        let bytes = match storage.upload_file(&remote_path, &file).await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(file = %file.display(), remote = %remote_path, error = %e, "Upload failed");
                if let Some(hint) = missing_folder_hint(&e) {
                    warn!(remote = %remote_path, "{hint}");
                }
                return Err(e.into());
            }
        };
        report.files.push(UploadedFile {
            local_path: file,
            remote_path,
            bytes,
        });
    }

    info!(
        files = report.files.len(),
        bytes = report.total_bytes(),
        "Upload successful"
    );
    Ok(report)
}
