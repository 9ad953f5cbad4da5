//! Console implementation of [`CodePrompt`]: asks the operator for the
//! two-factor code Trade Republic sends while `pytr dl_docs` is logging in.

use async_trait::async_trait;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tr_docs_sync_core::contract::CodePrompt;
use tr_docs_sync_core::error::PromptError;

pub const CODE_PROMPT: &str = "Enter verification code: ";

/// Reads one line from stdin after printing [`CODE_PROMPT`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsolePrompt;

#[async_trait]
impl CodePrompt for ConsolePrompt {
    async fn read_code(&self) -> Result<String, PromptError> {
        let mut stdout = io::stdout();
        stdout.write_all(CODE_PROMPT.as_bytes()).await?;
        stdout.flush().await?;

        let mut line = String::new();
        let read = BufReader::new(io::stdin()).read_line(&mut line).await?;
        if read == 0 {
            tracing::warn!("stdin closed before a verification code was entered");
            return Err(PromptError::Eof);
        }

        let code = line.trim().to_string();
        tracing::info!(code_len = code.len(), "Verification code entered");
        Ok(code)
    }
}
