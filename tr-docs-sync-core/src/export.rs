use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::contract::{ToolInvocation, ToolOutcome, ToolRunner};
use crate::download::report_outcome;
use crate::error::PipelineError;

/// Event log written by the download step.
pub const EVENTS_FILE_NAME: &str = "all_events.json";

/// Result of the CSV export step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportOutcome {
    pub csv_path: PathBuf,
    pub tool: ToolOutcome,
}

/// `<YYYYMMDD>_pp_import.csv`
pub fn csv_file_name(date: NaiveDate) -> String {
    format!("{}_pp_import.csv", date.format("%Y%m%d"))
}

/// Input event log and output CSV for a run on `date`.
pub fn export_paths(download_path: &Path, date: NaiveDate) -> (PathBuf, PathBuf) {
    (
        download_path.join(EVENTS_FILE_NAME),
        download_path.join(csv_file_name(date)),
    )
}

/// `pytr export_transactions <events> <csv>`
pub fn export_invocation(download_path: &Path, program: &str, date: NaiveDate) -> ToolInvocation {
    let (events, csv) = export_paths(download_path, date);
    ToolInvocation::new(
        program,
        vec![
            "export_transactions".to_string(),
            events.to_string_lossy().into_owned(),
            csv.to_string_lossy().into_owned(),
        ],
    )
}

/// Turn the downloaded event log into a Portfolio Performance import file.
///
/// Whether the event log exists is the tool's problem; its exit status is
/// reported as-is and the output file is not checked afterwards.
pub async fn export_transactions<R>(
    download_path: &Path,
    program: &str,
    date: NaiveDate,
    runner: &R,
) -> Result<ExportOutcome, PipelineError>
where
    R: ToolRunner + ?Sized,
{
    let invocation = export_invocation(download_path, program, date);
    let (_, csv_path) = export_paths(download_path, date);
    info!(command = %invocation.redacted(), csv = %csv_path.display(), "Generating CSV export");

    let mut running = runner.spawn(&invocation).await?;
    let tool = running.wait().await?;
    report_outcome("CSV generation", &tool);

    Ok(ExportOutcome { csv_path, tool })
}
