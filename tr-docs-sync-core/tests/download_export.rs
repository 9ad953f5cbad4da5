use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use mockall::Sequence;

use tr_docs_sync_core::config::TradeRepublicSettings;
use tr_docs_sync_core::contract::{
    MockCodePrompt, MockRunningTool, MockToolRunner, RunningTool, ToolInvocation, ToolOutcome,
};
use tr_docs_sync_core::download::{download_documents, download_invocation};
use tr_docs_sync_core::error::{PipelineError, PromptError, ToolError};
use tr_docs_sync_core::export::export_transactions;

fn tr_settings() -> TradeRepublicSettings {
    TradeRepublicSettings {
        phone_number: "+4917055501".to_string(),
        pin: "9876".to_string(),
        days_to_download: "0".to_string(),
        download_path: PathBuf::from("downloads"),
    }
}

fn finished(exit_code: Option<i32>) -> ToolOutcome {
    ToolOutcome {
        program: "pytr".to_string(),
        exit_code,
        stdout: "Logged in\n".to_string(),
        stderr: String::new(),
    }
}

#[test]
fn download_invocation_forwards_credentials_window_and_path() {
    let inv = download_invocation(&tr_settings(), "pytr");
    assert_eq!(inv.program, "pytr");
    assert_eq!(
        inv.args,
        vec![
            "dl_docs",
            "-n",
            "+4917055501",
            "-p",
            "9876",
            "--last_days",
            "0",
            "downloads"
        ]
    );
    let logged = inv.redacted();
    assert!(!logged.contains("9876"), "pin leaked into {logged}");
    assert!(logged.contains("--last_days 0"));
}

#[tokio::test]
async fn code_is_requested_after_spawn_and_sent_before_wait() {
    let order = Arc::new(Mutex::new(Vec::<&'static str>::new()));

    let mut tool = MockRunningTool::new();
    let log = order.clone();
    tool.expect_send_line()
        .withf(|line: &str| line == "424242")
        .times(1)
        .returning(move |_: &str| {
            log.lock().unwrap().push("send_line");
            Ok(())
        });
    let log = order.clone();
    tool.expect_wait().times(1).returning(move || {
        log.lock().unwrap().push("wait");
        Ok(finished(Some(0)))
    });
    let tool: Box<dyn RunningTool> = Box::new(tool);

    let mut runner = MockToolRunner::new();
    let log = order.clone();
    runner
        .expect_spawn()
        .withf(|inv: &ToolInvocation| inv.program == "/usr/local/bin/pytr")
        .times(1)
        .return_once(move |_: &ToolInvocation| {
            log.lock().unwrap().push("spawn");
            Ok(tool)
        });

    let mut prompt = MockCodePrompt::new();
    let log = order.clone();
    prompt.expect_read_code().times(1).returning(move || {
        log.lock().unwrap().push("prompt");
        Ok("  424242 \n".to_string())
    });

    let outcome = download_documents(&tr_settings(), "/usr/local/bin/pytr", &runner, &prompt)
        .await
        .expect("download should report an outcome");

    assert!(outcome.success());
    assert_eq!(
        *order.lock().unwrap(),
        vec!["spawn", "prompt", "send_line", "wait"]
    );
}

#[tokio::test]
async fn non_zero_exit_is_reported_not_raised() {
    let mut seq = Sequence::new();
    let mut tool = MockRunningTool::new();
    tool.expect_send_line()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_: &str| Ok(()));
    tool.expect_wait()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| Ok(finished(Some(1))));
    let tool: Box<dyn RunningTool> = Box::new(tool);

    let mut runner = MockToolRunner::new();
    runner
        .expect_spawn()
        .return_once(move |_: &ToolInvocation| Ok(tool));
    let mut prompt = MockCodePrompt::new();
    prompt
        .expect_read_code()
        .returning(|| Ok("000000".to_string()));

    let outcome = download_documents(&tr_settings(), "pytr", &runner, &prompt)
        .await
        .expect("non-zero exit is not an error");
    assert_eq!(outcome.exit_code, Some(1));
    assert_eq!(outcome.status_text(), "status 1");
}

#[tokio::test]
async fn spawn_failure_is_fatal_and_skips_the_prompt() {
    let mut runner = MockToolRunner::new();
    runner.expect_spawn().return_once(|inv: &ToolInvocation| {
        Err(ToolError::Spawn {
            program: inv.program.clone(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        })
    });
    let mut prompt = MockCodePrompt::new();
    prompt.expect_read_code().never();

    let err = download_documents(&tr_settings(), "pytr", &runner, &prompt)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Tool(ToolError::Spawn { .. })));
}

#[tokio::test]
async fn closed_console_aborts_the_download() {
    let mut tool = MockRunningTool::new();
    tool.expect_send_line().never();
    tool.expect_wait().never();
    let tool: Box<dyn RunningTool> = Box::new(tool);

    let mut runner = MockToolRunner::new();
    runner
        .expect_spawn()
        .return_once(move |_: &ToolInvocation| Ok(tool));
    let mut prompt = MockCodePrompt::new();
    prompt.expect_read_code().returning(|| Err(PromptError::Eof));

    let err = download_documents(&tr_settings(), "pytr", &runner, &prompt)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Prompt(PromptError::Eof)));
}

#[tokio::test]
async fn export_writes_dated_csv_next_to_event_log() {
    let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
    let root = Path::new("downloads");

    let mut tool = MockRunningTool::new();
    tool.expect_send_line().never();
    tool.expect_wait().returning(|| Ok(finished(None)));
    let tool: Box<dyn RunningTool> = Box::new(tool);

    let mut runner = MockToolRunner::new();
    let events = root.join("all_events.json").to_string_lossy().into_owned();
    let csv = root.join("20240229_pp_import.csv").to_string_lossy().into_owned();
    runner
        .expect_spawn()
        .withf(move |inv: &ToolInvocation| {
            inv.args == vec!["export_transactions".to_string(), events.clone(), csv.clone()]
        })
        .times(1)
        .return_once(move |_: &ToolInvocation| Ok(tool));

    let outcome = export_transactions(root, "pytr", date, &runner)
        .await
        .expect("export should report an outcome");

    assert_eq!(outcome.csv_path, root.join("20240229_pp_import.csv"));
    assert_eq!(outcome.tool.exit_code, None);
    assert!(!outcome.tool.success());
}
