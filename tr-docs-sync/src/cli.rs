//! This module implements the CLI interface for tr-docs-sync: flag parsing,
//! settings loading, wiring of the real collaborators and the async entrypoint.
//!
//! All stage logic (reconcile, download, export, folder sync, upload) lives in
//! the [`tr-docs-sync-core`] crate. This module is strictly CLI glue.
//!
//! ## Flags
//! - Every stage can be skipped; the short aliases (`--nodl`,
//!   `--skipdel`, `--nocsv`, `--noupload`, `--ffc`) are accepted too.
//! - `--fail-fast` aborts when `pytr` exits non-zero.
//! - `--env-file` points at the dotenv settings file (default `.env`).
//!
//! ## How To Use
//! - For command-line users: run the installed `tr-docs-sync` binary with `--help`.
//! - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
//!
//! [`tr-docs-sync-core`]: ../../tr-docs-sync-core/

use crate::load_config::load_config;
use crate::nextcloud::NextcloudClient;
use crate::prompt::ConsolePrompt;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tr_docs_sync_core::synchronise::{synchronise, StageFlags, StagePlan, SynchroniseContext};
use tr_docs_sync_core::tool::SystemToolRunner;

/// CLI for tr-docs-sync: fetch Trade Republic documents, build the Portfolio
/// Performance CSV and mirror everything to Nextcloud.
#[derive(Parser, Debug, Default)]
#[clap(
    name = "tr-docs-sync",
    version,
    about = "Download Trade Republic docs, generate CSV for importing into Portfolio Performance and upload docs to Nextcloud"
)]
pub struct Cli {
    /// Skip document download from Trade Republic
    #[clap(long = "skip-doc-download", visible_alias = "nodl")]
    pub skip_download: bool,

    /// Skip deletion of existing local download folder
    #[clap(long = "skip-dl-folder-deletion", visible_alias = "skipdel")]
    pub skip_deletion: bool,

    /// Skip generation of CSV for import into Portfolio Performance
    #[clap(long = "skip-csv-generation", visible_alias = "nocsv")]
    pub skip_csv: bool,

    /// Skip folder creation in and upload of files to Nextcloud
    #[clap(long = "skip-nextcloud-upload", visible_alias = "noupload")]
    pub skip_upload: bool,

    /// Force folder creation in Nextcloud (needed when new local subfolders
    /// appeared since the remote base folder was first created)
    #[clap(long = "force-nc-folder-create", visible_alias = "ffc")]
    pub force_folder_create: bool,

    /// Abort the run when pytr exits with a non-zero status
    #[clap(long)]
    pub fail_fast: bool,

    /// Settings file in dotenv format (defaults to ./.env when present)
    #[clap(long, value_name = "PATH")]
    pub env_file: Option<PathBuf>,
}

impl Cli {
    pub fn stage_flags(&self) -> StageFlags {
        StageFlags {
            skip_deletion: self.skip_deletion,
            skip_download: self.skip_download,
            skip_csv: self.skip_csv,
            skip_upload: self.skip_upload,
            force_folder_create: self.force_folder_create,
            fail_fast: self.fail_fast,
        }
    }
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    let settings = load_config(cli.env_file.as_deref())?;
    settings.trace_loaded();

    let plan = StagePlan::from_flags(&cli.stage_flags());
    tracing::info!(?plan, "Stage plan resolved");

    let storage = match (&settings.nextcloud, plan.needs_remote()) {
        (Some(nc), true) => {
            Some(NextcloudClient::new(nc).context("Failed to construct Nextcloud client")?)
        }
        (None, true) => anyhow::bail!(
            "Upload is enabled but the NC_* settings are missing; \
             set them or pass --skip-nextcloud-upload"
        ),
        (_, false) => None,
    };

    let runner = SystemToolRunner;
    let prompt = ConsolePrompt::default();
    let ctx = SynchroniseContext {
        settings: &settings,
        runner: &runner,
        prompt: &prompt,
        storage: storage.as_ref(),
        today: chrono::Local::now().date_naive(),
    };

    match synchronise(&plan, ctx).await {
        Ok(report) => {
            tracing::info!(
                download = ?report.download.as_ref().map(|o| o.status_text()),
                export = ?report.export.as_ref().map(|o| o.tool.status_text()),
                folders_created = report.folders.as_ref().map_or(0, |f| f.created.len()),
                files_uploaded = report.upload.as_ref().map_or(0, |u| u.files.len()),
                "Run complete"
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "Run failed");
            Err(anyhow::Error::new(e))
        }
    }
}
