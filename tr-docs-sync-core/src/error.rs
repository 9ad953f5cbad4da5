//! Error types shared by the pipeline stages and their collaborators.

use std::path::PathBuf;

use thiserror::Error;

/// Problems found while assembling [`crate::config::Settings`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// One or more required keys are absent or empty.
    #[error("missing required settings: {}", .0.join(", "))]
    MissingKeys(Vec<String>),

    /// Some, but not all, of the Nextcloud keys are set.
    #[error("incomplete Nextcloud settings, missing: {}", .0.join(", "))]
    IncompleteNextcloud(Vec<String>),

    /// Required keys are missing and the Nextcloud group is incomplete.
    #[error(
        "missing required settings: {}; incomplete Nextcloud settings, missing: {}",
        .missing.join(", "),
        .nextcloud.join(", ")
    )]
    MissingAndIncomplete {
        missing: Vec<String>,
        nextcloud: Vec<String>,
    },
}

/// Failures while driving an external tool process.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write input to {program}: {source}")]
    Input {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("input to {program} was already sent")]
    InputClosed { program: String },

    #[error("failed to wait for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} was already awaited")]
    AlreadyFinished { program: String },
}

/// Failures while asking the operator for the verification code.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("failed to read verification code: {0}")]
    Io(#[from] std::io::Error),

    #[error("input closed before a verification code was entered")]
    Eof,
}

/// Failures reported by a [`crate::contract::RemoteStorage`] implementation.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("invalid remote URL: {0}")]
    InvalidUrl(String),

    #[error("request to {path} failed: {message}")]
    Request { path: String, message: String },

    #[error("{method} {path} returned status {status}")]
    Status {
        method: String,
        path: String,
        status: u16,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Everything that can abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to clear download folder {}: {source}", .path.display())]
    Reconcile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk {}: {source}", .path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("{} is not below {}", .path.display(), .root.display())]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("upload requested but no Nextcloud settings are configured")]
    RemoteNotConfigured,

    #[error("{stage} tool exited with {status}")]
    ToolFailed { stage: &'static str, status: String },

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}
