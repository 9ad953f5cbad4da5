//! High-level pipeline: reconcile → download → export → folders → upload.
//!
//! This module strings the stages together for one run. Every stage is
//! optional (see [`StagePlan`]) and they always run in the same order, one at
//! a time, over the same local download folder.
//!
//! # Responsibilities
//! - Runs the planned stages in order and collects a [`PipelineReport`]
//! - Keeps external tool failures non-fatal unless the plan asks for fail-fast
//! - Aborts on filesystem and remote storage errors, with no retries and no
//!   record of partial progress; rerunning relies on uploads overwriting
//!
//! # Callable From
//! - The CLI crate, with the real process runner, console prompt and
//!   Nextcloud client
//! - Integration tests, with `mockall` doubles for every collaborator
//!
//! # Navigation
//! - Main entrypoint: [`synchronise`]
//! - Inputs: [`SynchroniseContext`], [`StagePlan`]

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::Settings;
use crate::contract::{CodePrompt, RemoteStorage, ToolOutcome, ToolRunner};
use crate::download::download_documents;
use crate::error::PipelineError;
use crate::export::{export_transactions, ExportOutcome};
use crate::folders::{synchronise_folders, FolderSyncReport};
use crate::reconcile::{reconcile_download_folder, ReconcileOutcome};
pub use crate::stages::{StageFlags, StagePlan};
use crate::uploader::{upload_tree, UploadReport};

/// Collaborators and inputs for one run.
pub struct SynchroniseContext<'a, R: ?Sized, P: ?Sized, S: ?Sized> {
    pub settings: &'a Settings,
    pub runner: &'a R,
    pub prompt: &'a P,
    /// Required only when the plan syncs folders or uploads.
    pub storage: Option<&'a S>,
    /// Date stamped into the CSV file name.
    pub today: NaiveDate,
}

/// What each stage did; `None` for stages that did not run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    pub reconcile: Option<ReconcileOutcome>,
    pub download: Option<ToolOutcome>,
    pub export: Option<ExportOutcome>,
    pub folders: Option<FolderSyncReport>,
    pub upload: Option<UploadReport>,
}

pub async fn synchronise<R, P, S>(
    plan: &StagePlan,
    ctx: SynchroniseContext<'_, R, P, S>,
) -> Result<PipelineReport, PipelineError>
where
    R: ToolRunner + ?Sized,
    P: CodePrompt + ?Sized,
    S: RemoteStorage + ?Sized,
{
    info!(?plan, "[SYNC] Starting pipeline");
    let tr = &ctx.settings.trade_republic;
    let download_path = tr.download_path.as_path();

    // Fail before touching anything if the remote stages cannot run.
    let remote = if plan.needs_remote() {
        let storage = ctx.storage.ok_or(PipelineError::RemoteNotConfigured)?;
        let nextcloud = ctx
            .settings
            .nextcloud
            .as_ref()
            .ok_or(PipelineError::RemoteNotConfigured)?;
        Some((storage, nextcloud.document_folder.as_str()))
    } else {
        None
    };

    let mut report = PipelineReport::default();

    if plan.reconcile {
        report.reconcile = Some(reconcile_download_folder(download_path)?);
    } else {
        info!("[SYNC] Skipping download folder deletion");
    }

    if plan.download {
        let outcome =
            download_documents(tr, &ctx.settings.pytr_command, ctx.runner, ctx.prompt).await?;
        check_tool("download", &outcome, plan.fail_fast)?;
        report.download = Some(outcome);
    } else {
        info!("[SYNC] Skipping document download");
    }

    if plan.export {
        let outcome =
            export_transactions(download_path, &ctx.settings.pytr_command, ctx.today, ctx.runner)
                .await?;
        check_tool("export", &outcome.tool, plan.fail_fast)?;
        report.export = Some(outcome);
    } else {
        info!("[SYNC] Skipping CSV generation");
    }

    match remote {
        Some((storage, remote_base)) => {
            if plan.sync_folders {
                report.folders = Some(
                    synchronise_folders(
                        storage,
                        download_path,
                        remote_base,
                        plan.force_folder_create,
                    )
                    .await?,
                );
            }
            if plan.upload {
                report.upload = Some(upload_tree(storage, download_path, remote_base).await?);
            }
        }
        None => info!("[SYNC] Skipping folder creation and upload"),
    }

    match serde_json::to_string_pretty(&report) {
        Ok(json) => debug!(json = %json, "[SYNC][DEBUG] Pipeline report as JSON"),
        Err(e) => error!(error = ?e, "[SYNC][DEBUG] Failed to serialize pipeline report"),
    }
    info!("[SYNC] Pipeline finished");
    Ok(report)
}

fn check_tool(
    stage: &'static str,
    outcome: &ToolOutcome,
    fail_fast: bool,
) -> Result<(), PipelineError> {
    if outcome.success() {
        return Ok(());
    }
    if fail_fast {
        error!(
            stage,
            status = %outcome.status_text(),
            "[SYNC][ERROR] Tool failed, aborting (fail-fast)"
        );
        return Err(PipelineError::ToolFailed {
            stage,
            status: outcome.status_text(),
        });
    }
    warn!(stage, "[SYNC] Continuing with what is on disk");
    Ok(())
}
