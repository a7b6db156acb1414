//! Shell command execution
//!
//! Every component that reaches outside the process (status query, remote
//! shell, SQL client) goes through [`CommandRunner`], so the whole crate can
//! be driven by a scripted runner in tests.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::error::{OmError, Result};

/// Exit status and combined stdout/stderr of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub status: i32,
    pub output: String,
}

impl CommandOutput {
    pub fn new(status: i32, output: impl Into<String>) -> Self {
        Self {
            status,
            output: output.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.status == 0
    }

    /// Converts a non-zero exit into [`OmError::CommandFailed`].
    pub fn into_result(self, command: &str) -> Result<String> {
        if self.success() {
            Ok(self.output)
        } else {
            Err(OmError::CommandFailed {
                command: command.to_string(),
                status: self.status,
                output: self.output,
            })
        }
    }
}

/// Quotes `text` as a single shell word.
pub fn shell_quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "'\\''"))
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs a full shell command line and waits for it to finish.
    async fn run(&self, command: &str) -> Result<CommandOutput>;
}

/// Runs commands through `sh -c` with stderr redirected into stdout, so the
/// captured text keeps the order in which the command wrote it.
#[derive(Debug, Clone)]
pub struct ShellCommandRunner {
    shell: String,
}

impl Default for ShellCommandRunner {
    fn default() -> Self {
        Self::new("/bin/sh")
    }
}

impl ShellCommandRunner {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

#[async_trait]
impl CommandRunner for ShellCommandRunner {
    async fn run(&self, command: &str) -> Result<CommandOutput> {
        debug!(command = %command, "Running shell command");

        let script = format!("exec 2>&1\n{}", command);
        let output = Command::new(&self.shell)
            .args(["-c", &script])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| OmError::CommandSpawn(format!("{}: {}", command, e)))?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        // Only the shell itself can still write here, e.g. a syntax error.
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        // Trailing newline is dropped the same way a shell substitution would.
        while text.ends_with('\n') {
            text.pop();
        }

        let status = output.status.code().unwrap_or(-1);
        debug!(command = %command, status, "Shell command finished");

        Ok(CommandOutput::new(status, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_zero_status_becomes_command_failed() {
        let err = CommandOutput::new(2, "boom")
            .into_result("false")
            .unwrap_err();
        match err {
            OmError::CommandFailed {
                command,
                status,
                output,
            } => {
                assert_eq!(command, "false");
                assert_eq!(status, 2);
                assert_eq!(output, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_shell_runner_captures_output_and_status() {
        let runner = ShellCommandRunner::default();

        let ok = runner.run("echo hello").await.unwrap();
        assert!(ok.success());
        assert_eq!(ok.output, "hello");

        let failed = runner.run("echo oops 1>&2; exit 3").await.unwrap();
        assert_eq!(failed.status, 3);
        assert_eq!(failed.output, "oops");
    }

    #[tokio::test]
    async fn test_shell_runner_keeps_stream_order() {
        let runner = ShellCommandRunner::default();
        let out = runner.run("echo first; echo second 1>&2; echo third").await.unwrap();
        assert_eq!(out.output, "first\nsecond\nthird");
    }

    #[tokio::test]
    async fn test_shell_quote_survives_the_shell() {
        let runner = ShellCommandRunner::default();
        let word = "John Doe's; $HOME `id`";
        let out = runner
            .run(&format!("printf '%s' {}", shell_quote(word)))
            .await
            .unwrap();
        assert_eq!(out.output, word);
    }
}
