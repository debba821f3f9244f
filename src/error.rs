use std::{io, time::Duration};

use thiserror::Error;

/// Errors from invoking the external audio control utility.
///
/// An empty device list is not an error: [`ReadError`] is only produced when the utility could
/// not tell us anything at all, or told us that it failed.
#[derive(Error, Debug)]
pub enum ReadError {
    #[error("failed to run `{command}`: {source}")]
    ExecutionFailed {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("`{command}` failed with {}: {stderr}", describe_exit(.code))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("`{command}` did not finish within {timeout:?}")]
    Timeout { command: String, timeout: Duration },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "a signal".to_owned(),
    }
}
