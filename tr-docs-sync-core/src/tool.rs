//! Real [`ToolRunner`] backed by `tokio::process`.

use std::io::ErrorKind;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::contract::{RunningTool, ToolInvocation, ToolOutcome, ToolRunner};
use crate::error::ToolError;

/// Runs tools as child processes of the current process.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemToolRunner;

#[async_trait]
impl ToolRunner for SystemToolRunner {
    async fn spawn(
        &self,
        invocation: &ToolInvocation,
    ) -> Result<Box<dyn RunningTool>, ToolError> {
        debug!(command = %invocation.redacted(), "Spawning external tool");
        let child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ToolError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;
        debug!(pid = ?child.id(), program = %invocation.program, "External tool started");
        Ok(Box::new(ChildTool {
            program: invocation.program.clone(),
            child: Some(child),
            input_sent: false,
        }))
    }
}

struct ChildTool {
    program: String,
    child: Option<Child>,
    input_sent: bool,
}

#[async_trait]
impl RunningTool for ChildTool {
    async fn send_line(&mut self, line: &str) -> Result<(), ToolError> {
        let program = self.program.clone();
        let stdin = match self.child.as_mut().and_then(|c| c.stdin.take()) {
            Some(stdin) if !self.input_sent => stdin,
            _ => return Err(ToolError::InputClosed { program }),
        };
        self.input_sent = true;

        let mut stdin = stdin;
        let payload = format!("{line}\n");
        let written = async {
            stdin.write_all(payload.as_bytes()).await?;
            stdin.flush().await
        }
        .await;

        match written {
            Ok(()) => Ok(()),
            // The tool may have exited before reading; its exit status tells the story.
            Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                warn!(program = %program, "Tool closed its input before the line was written");
                Ok(())
            }
            Err(source) => Err(ToolError::Input { program, source }),
        }
    }

    async fn wait(&mut self) -> Result<ToolOutcome, ToolError> {
        let child = self.child.take().ok_or_else(|| ToolError::AlreadyFinished {
            program: self.program.clone(),
        })?;
        let output = child
            .wait_with_output()
            .await
            .map_err(|source| ToolError::Wait {
                program: self.program.clone(),
                source,
            })?;
        Ok(ToolOutcome {
            program: self.program.clone(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
