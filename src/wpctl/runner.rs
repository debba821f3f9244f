use std::{process::Stdio, time::Duration};

use itertools::Itertools;
use log::debug;
use tokio::process::Command;

use crate::error::ReadError;

/// Captured result of a finished external command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` if the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs an external program to completion and captures its output.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, ReadError>;
}

/// Runs commands as child processes, killing them if they outlive the timeout.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    timeout: Duration,
}

impl ProcessRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl CommandRunner for ProcessRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, ReadError> {
        let command = command_line(program, args);
        debug!("Running `{command}`");

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ReadError::ExecutionFailed {
                command: command.clone(),
                source,
            })?;

        // Dropping the future on timeout drops the child, which kills it
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ReadError::Timeout {
                command: command.clone(),
                timeout: self.timeout,
            })?
            .map_err(|source| ReadError::ExecutionFailed {
                command: command.clone(),
                source,
            })?;

        debug!("`{command}` exited with {}", output.status);
        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Render a program and its arguments for logs and error messages.
pub fn command_line(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell(script: &str) -> Vec<String> {
        vec!["-c".to_owned(), script.to_owned()]
    }

    #[tokio::test]
    async fn captures_output_and_exit_code() {
        let runner = ProcessRunner::new(Duration::from_secs(5));
        let output = runner
            .run("sh", &shell("echo out; echo err >&2; exit 3"))
            .await
            .unwrap();
        assert_eq!(output.code, Some(3));
        assert!(!output.success());
        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr, "err\n");
    }

    #[tokio::test]
    async fn missing_program_fails_to_execute() {
        let runner = ProcessRunner::new(Duration::from_secs(5));
        let err = runner
            .run("/nonexistent/audiocontrol-test-program", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ReadError::ExecutionFailed { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn slow_program_times_out() {
        let runner = ProcessRunner::new(Duration::from_millis(100));
        let err = runner.run("sh", &shell("sleep 10")).await.unwrap_err();
        assert!(
            matches!(err, ReadError::Timeout { timeout, .. } if timeout == Duration::from_millis(100)),
            "{err:?}"
        );
    }

    #[test]
    fn command_line_joins_arguments() {
        assert_eq!(
            command_line("wpctl", &["set-volume".to_owned(), "42".to_owned(), "0.50".to_owned()]),
            "wpctl set-volume 42 0.50"
        );
        assert_eq!(command_line("wpctl", &[]), "wpctl");
    }
}
