#![allow(unused)]

//! # contract: seams between the pipeline and the outside world
//!
//! The pipeline never touches a process, the console or the network
//! directly. It talks to these traits instead:
//!
//! - [`ToolRunner`] / [`RunningTool`]: start an external tool with piped
//!   streams, optionally send it exactly one line of input, then wait for it.
//! - [`CodePrompt`]: ask the operator for the one-time verification code.
//! - [`RemoteStorage`]: the three remote operations the sync stages need
//!   (existence check, recursive folder creation, streaming upload).
//!
//! ## Mocking & Testing
//! - Every trait is annotated for `mockall` so tests can script a whole run
//!   without a real `pytr`, a terminal or a Nextcloud server.

use std::path::Path;

use async_trait::async_trait;
use mockall::{automock, predicate::*};
use serde::Serialize;

use crate::error::{PromptError, RemoteError, ToolError};

/// A fully resolved command line for an external tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: String,
    pub args: Vec<String>,
    /// Argument values that must never show up in logs (PINs and the like).
    pub secrets: Vec<String>,
}

impl ToolInvocation {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            secrets: Vec::new(),
        }
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secrets.push(secret.into());
        self
    }

    /// Command line suitable for logging, with secrets masked.
    pub fn redacted(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            if self.secrets.iter().any(|s| s == arg) {
                line.push_str("***");
            } else {
                line.push_str(arg);
            }
        }
        line
    }
}

/// What an external tool left behind once it exited.
///
/// `Debug` shows only the size of the captured output; the output itself is
/// logged once when the tool finishes.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct ToolOutcome {
    pub program: String,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    #[serde(skip_serializing)]
    pub stdout: String,
    #[serde(skip_serializing)]
    pub stderr: String,
}

impl std::fmt::Debug for ToolOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolOutcome")
            .field("program", &self.program)
            .field("exit_code", &self.exit_code)
            .field("stdout_bytes", &self.stdout.len())
            .field("stderr_bytes", &self.stderr.len())
            .finish()
    }
}

impl ToolOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn status_text(&self) -> String {
        match self.exit_code {
            Some(code) => format!("status {code}"),
            None => "no status (terminated by signal)".to_string(),
        }
    }
}

/// Starts external tools.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Spawn the tool with stdin, stdout and stderr piped.
    async fn spawn(&self, invocation: &ToolInvocation)
        -> Result<Box<dyn RunningTool>, ToolError>;
}

/// A started tool process.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RunningTool: Send {
    /// Write `line` plus a newline to the tool's stdin and close it.
    /// May be called at most once.
    async fn send_line(&mut self, line: &str) -> Result<(), ToolError>;

    /// Close stdin if still open and wait for the tool, collecting its output.
    async fn wait(&mut self) -> Result<ToolOutcome, ToolError>;
}

/// Source of the one-time verification code typed by the operator.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait CodePrompt: Send + Sync {
    async fn read_code(&self) -> Result<String, PromptError>;
}

/// Remote file storage the local tree is mirrored into.
///
/// Paths are `/`-separated and relative to the storage user's root.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RemoteStorage: Send + Sync {
    /// Authoritative check that a folder exists at exactly `remote_path`.
    async fn folder_exists(&self, remote_path: &str) -> Result<bool, RemoteError>;

    /// Create `remote_path` and any missing parents. Existing folders are fine.
    async fn make_dirs(&self, remote_path: &str) -> Result<(), RemoteError>;

    /// Stream `local_path` to `remote_path`, replacing whatever is there.
    /// Returns the number of bytes sent.
    async fn upload_file(&self, remote_path: &str, local_path: &Path) -> Result<u64, RemoteError>;
}
