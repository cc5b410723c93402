//! Interactive line and secret input.

use std::io::{self, BufRead, IsTerminal, Write};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PromptError {
    /// A hidden prompt was requested but stdin is not a terminal.
    #[error("{0}")]
    MaskUnsupported(String),

    #[error("Failed to read input: {0}")]
    Io(#[from] io::Error),
}

#[async_trait]
pub trait Prompter: Send + Sync {
    /// Ask for one line of input. With `hide` set, typed characters are not echoed.
    async fn prompt(&self, label: &str, hide: bool) -> Result<String, PromptError>;
}

/// Prompts on the controlling terminal: label on stderr, answer from stdin.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    fn read_plain(label: &str) -> Result<String, PromptError> {
        let mut stderr = io::stderr();
        write!(stderr, "{}: ", label)?;
        stderr.flush()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn read_hidden(label: &str) -> Result<String, PromptError> {
        if !io::stdin().is_terminal() {
            return Err(PromptError::MaskUnsupported(format!(
                "CLI needs to prompt for {} but stdin is not a tty.",
                label
            )));
        }
        Ok(rpassword::prompt_password(format!("{}: ", label))?)
    }
}

#[async_trait]
impl Prompter for TerminalPrompter {
    async fn prompt(&self, label: &str, hide: bool) -> Result<String, PromptError> {
        let label = label.to_string();
        tokio::task::spawn_blocking(move || {
            if hide {
                TerminalPrompter::read_hidden(&label)
            } else {
                TerminalPrompter::read_plain(&label)
            }
        })
        .await
        .map_err(|e| PromptError::Io(io::Error::other(e)))?
    }
}
