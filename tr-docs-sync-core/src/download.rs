use tracing::{error, info, warn};

use crate::config::TradeRepublicSettings;
use crate::contract::{CodePrompt, ToolInvocation, ToolOutcome, ToolRunner};
use crate::error::PipelineError;

/// `pytr dl_docs -n <phone> -p <pin> --last_days <days> <path>`
pub fn download_invocation(settings: &TradeRepublicSettings, program: &str) -> ToolInvocation {
    ToolInvocation::new(
        program,
        vec![
            "dl_docs".to_string(),
            "-n".to_string(),
            settings.phone_number.clone(),
            "-p".to_string(),
            settings.pin.clone(),
            "--last_days".to_string(),
            settings.days_to_download.clone(),
            settings.download_path.to_string_lossy().into_owned(),
        ],
    )
    .with_secret(settings.pin.clone())
}

/// Download all documents with the external tool.
///
/// The tool logs in and then waits for the verification code sent to the
/// operator's phone, so the code is asked for only after the process is up.
/// A non-zero exit is logged and returned, not turned into an error; callers
/// decide whether a partial download is acceptable.
pub async fn download_documents<R, P>(
    settings: &TradeRepublicSettings,
    program: &str,
    runner: &R,
    prompt: &P,
) -> Result<ToolOutcome, PipelineError>
where
    R: ToolRunner + ?Sized,
    P: CodePrompt + ?Sized,
{
    let invocation = download_invocation(settings, program);
    info!(
        command = %invocation.redacted(),
        path = %settings.download_path.display(),
        "Starting document download"
    );

    let mut running = runner.spawn(&invocation).await?;
    let code = prompt.read_code().await?;
    running.send_line(code.trim()).await?;
    let outcome = running.wait().await?;

    report_outcome("Document download", &outcome);
    Ok(outcome)
}

pub(crate) fn report_outcome(what: &str, outcome: &ToolOutcome) {
    if !outcome.stdout.trim().is_empty() {
        info!(
            program = %outcome.program,
            output = %outcome.stdout.trim_end(),
            "{what} output"
        );
    }
    if !outcome.stderr.trim().is_empty() {
        warn!(
            program = %outcome.program,
            stderr = %outcome.stderr.trim_end(),
            "{what} wrote to stderr"
        );
    }
    if outcome.success() {
        info!(exit_code = ?outcome.exit_code, "{what} process exited successfully");
    } else {
        error!(
            exit_code = ?outcome.exit_code,
            "{what} process exited with {}",
            outcome.status_text()
        );
    }
}
