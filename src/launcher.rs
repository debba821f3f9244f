use std::{
    env,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
    process::Stdio,
};

use itertools::Itertools;
use log::{debug, info};
use thiserror::Error;
use tokio::process::Command;

/// Wraps a TUI program so it opens in (or focuses) its own terminal window.
const TUI_WRAPPER: &str = "omarchy-launch-or-focus-tui";

/// An external mixer offered for controls this applet does not have.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launcher {
    pub label: &'static str,
    pub command: Vec<String>,
    /// Whether the program was found. Unavailable launchers are shown but cannot be started.
    pub available: bool,
}

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("{0} is not installed")]
    Unavailable(&'static str),
    #[error("No launcher named {0:?}")]
    Unknown(String),
    #[error("Failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

impl Launcher {
    /// Start the program without waiting for it to exit.
    pub fn launch(&self) -> Result<(), LaunchError> {
        if !self.available {
            return Err(LaunchError::Unavailable(self.label));
        }
        let Some((program, args)) = self.command.split_first() else {
            return Err(LaunchError::Unavailable(self.label));
        };
        let command = self.command.iter().join(" ");
        info!("Launching `{command}`");
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                command: command.clone(),
                source,
            })?;
        debug!("`{command}` started with pid {:?}", child.id());
        Ok(())
    }
}

/// The advanced mixers, in display order, checked against `PATH`.
pub fn advanced_controls() -> Vec<Launcher> {
    advanced_controls_with(|program| find_executable(program).is_some())
}

pub fn advanced_controls_with(is_installed: impl Fn(&str) -> bool) -> Vec<Launcher> {
    let wiremix = if is_installed(TUI_WRAPPER) {
        vec![TUI_WRAPPER.to_owned(), "wiremix".to_owned()]
    } else {
        vec!["wiremix".to_owned()]
    };
    vec![
        Launcher {
            label: "wiremix",
            command: wiremix,
            available: is_installed("wiremix"),
        },
        Launcher {
            label: "PulseAudio Volume Control",
            command: vec!["pavucontrol".to_owned()],
            available: is_installed("pavucontrol"),
        },
    ]
}

/// Look a launcher up by its label or program name, ignoring case.
pub fn find_launcher<'a>(launchers: &'a [Launcher], name: &str) -> Result<&'a Launcher, LaunchError> {
    launchers
        .iter()
        .find(|launcher| {
            launcher.label.eq_ignore_ascii_case(name)
                || launcher
                    .command
                    .last()
                    .is_some_and(|program| program.eq_ignore_ascii_case(name))
        })
        .ok_or_else(|| LaunchError::Unknown(name.to_owned()))
}

/// Search `PATH` for an executable file called `program`.
pub fn find_executable(program: &str) -> Option<PathBuf> {
    let path = env::var_os("PATH")?;
    env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

fn is_executable(path: &Path) -> bool {
    path.metadata()
        .map(|metadata| metadata.is_file() && metadata.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}
