use serde::Serialize;

/// Toggles parsed from the command line. Everything defaults to off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageFlags {
    pub skip_deletion: bool,
    pub skip_download: bool,
    pub skip_csv: bool,
    pub skip_upload: bool,
    pub force_folder_create: bool,
    /// Abort when the download or export tool exits non-zero.
    pub fail_fast: bool,
}

/// Which stages a run executes, derived once from [`StageFlags`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StagePlan {
    pub reconcile: bool,
    pub download: bool,
    pub export: bool,
    pub sync_folders: bool,
    pub upload: bool,
    pub force_folder_create: bool,
    pub fail_fast: bool,
}

impl StagePlan {
    pub fn from_flags(flags: &StageFlags) -> Self {
        Self {
            reconcile: !flags.skip_deletion,
            download: !flags.skip_download,
            // Only export when this run touched the download folder.
            export: !flags.skip_csv && (!flags.skip_download || !flags.skip_deletion),
            sync_folders: !flags.skip_upload,
            upload: !flags.skip_upload,
            force_folder_create: flags.force_folder_create,
            fail_fast: flags.fail_fast,
        }
    }

    pub fn needs_remote(&self) -> bool {
        self.sync_folders || self.upload
    }
}

impl From<StageFlags> for StagePlan {
    fn from(flags: StageFlags) -> Self {
        StagePlan::from_flags(&flags)
    }
}
