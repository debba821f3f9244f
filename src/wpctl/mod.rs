mod runner;
mod status;

use log::{debug, warn};

use crate::{device::DeviceRecord, error::ReadError, settings::Settings};

pub use runner::{command_line, CommandOutput, CommandRunner, ProcessRunner};
pub use status::{parse_status, Section, StatusLine, MAX_DEVICES};

const DEFAULT_PROGRAM: &str = "wpctl";

/// Reads and controls audio sinks through the `wpctl` utility.
///
/// Every call spawns a fresh process. Nothing is cached between calls, so each
/// [`Wpctl::list_devices`] result is an independent snapshot owned by the caller.
#[derive(Debug, Clone)]
pub struct Wpctl<R = ProcessRunner> {
    program: String,
    leading_args: Vec<String>,
    max_devices: usize,
    runner: R,
}

impl Wpctl<ProcessRunner> {
    pub fn from_settings(settings: &Settings) -> Result<Self, crate::settings::SettingsError> {
        let command = settings.wpctl_command()?;
        Ok(Self::with_runner(
            command,
            settings.max_devices,
            ProcessRunner::new(settings.command_timeout),
        ))
    }
}

impl<R: CommandRunner> Wpctl<R> {
    /// `command` is the program followed by any arguments to put before each subcommand.
    pub fn with_runner(command: Vec<String>, max_devices: usize, runner: R) -> Self {
        let mut command = command.into_iter();
        let program = command
            .next()
            .unwrap_or_else(|| DEFAULT_PROGRAM.to_owned());
        Self {
            program,
            leading_args: command.collect(),
            max_devices,
            runner,
        }
    }

    /// Runs `<program> <args...>` and returns the command line along with its output.
    async fn run(&self, args: &[String]) -> Result<(String, CommandOutput), ReadError> {
        let args: Vec<String> = self.leading_args.iter().chain(args).cloned().collect();
        let output = self.runner.run(&self.program, &args).await?;
        Ok((command_line(&self.program, &args), output))
    }

    /// Like [`Wpctl::run`], but fails if the program reports an error.
    async fn invoke(&self, args: &[String]) -> Result<CommandOutput, ReadError> {
        let (command, output) = self.run(args).await?;
        if !output.success() {
            return Err(command_failed(command, output));
        }
        Ok(output)
    }

    /// List the audio sinks in the order the status report shows them.
    ///
    /// An empty list means no output devices were found, which is not an error. A failing exit
    /// status is only an error when the command printed no report at all.
    pub async fn list_devices(&self) -> Result<Vec<DeviceRecord>, ReadError> {
        let (command, output) = self.run(&["status".to_owned()]).await?;
        if !output.success() {
            if output.stdout.trim().is_empty() {
                return Err(command_failed(command, output));
            }
            warn!(
                "`{command}` exited unsuccessfully, reading its report anyway: {}",
                output.stderr.trim()
            );
        }
        let devices = parse_status(&output.stdout, self.max_devices);
        debug!("Found {} output devices", devices.len());
        Ok(devices)
    }

    /// Set the volume of a device. `level` is a fraction and is passed on without clamping.
    pub async fn set_volume(&self, device_id: u32, level: f64) -> Result<(), ReadError> {
        self.invoke(&[
            "set-volume".to_owned(),
            device_id.to_string(),
            format!("{level:.2}"),
        ])
        .await?;
        Ok(())
    }

    /// Make a device the default sink.
    pub async fn set_default_device(&self, device_id: u32) -> Result<(), ReadError> {
        self.invoke(&["set-default".to_owned(), device_id.to_string()])
            .await?;
        Ok(())
    }
}

fn command_failed(command: String, output: CommandOutput) -> ReadError {
    warn!("`{command}` exited unsuccessfully: {}", output.stderr.trim());
    ReadError::CommandFailed {
        command,
        code: output.code,
        stderr: output.stderr.trim().to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, io, time::Duration};

    use super::*;

    enum Reply {
        Output(CommandOutput),
        CannotLaunch,
    }

    /// Answers every command with the same reply and records what was run.
    struct FakeRunner {
        reply: Reply,
        calls: RefCell<Vec<String>>,
    }

    impl FakeRunner {
        fn replying(code: i32, stdout: &str, stderr: &str) -> Self {
            Self {
                reply: Reply::Output(CommandOutput {
                    code: Some(code),
                    stdout: stdout.to_owned(),
                    stderr: stderr.to_owned(),
                }),
                calls: RefCell::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Reply::CannotLaunch,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl CommandRunner for FakeRunner {
        async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, ReadError> {
            let command = command_line(program, args);
            self.calls.borrow_mut().push(command.clone());
            match &self.reply {
                Reply::Output(output) => Ok(output.clone()),
                Reply::CannotLaunch => Err(ReadError::ExecutionFailed {
                    command,
                    source: io::Error::from(io::ErrorKind::NotFound),
                }),
            }
        }
    }

    fn wpctl(runner: FakeRunner) -> Wpctl<FakeRunner> {
        Wpctl::with_runner(vec!["wpctl".to_owned()], MAX_DEVICES, runner)
    }

    const STATUS: &str = "\
Audio
 ├─ Sinks:
 │  *    3. Speakers                            [vol: 0.80]
 │
 ├─ Sources:
 │      12. Microphone                          [vol: 0.50]
";

    #[tokio::test]
    async fn list_devices_reads_sinks() {
        let wpctl = wpctl(FakeRunner::replying(0, STATUS, ""));
        let devices = wpctl.list_devices().await.unwrap();
        assert_eq!(devices, vec![DeviceRecord::new(3, "Speakers", true, 0.80, false)]);
        assert_eq!(*wpctl.runner.calls.borrow(), vec!["wpctl status"]);
    }

    #[tokio::test]
    async fn empty_status_is_not_an_error() {
        let wpctl = wpctl(FakeRunner::replying(0, "", ""));
        assert!(wpctl.list_devices().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn launch_failure_is_distinct_from_no_devices() {
        let wpctl = wpctl(FakeRunner::failing());
        let err = wpctl.list_devices().await.unwrap_err();
        assert!(matches!(err, ReadError::ExecutionFailed { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn failing_status_is_reported() {
        let wpctl = wpctl(FakeRunner::replying(1, "", "Could not connect to PipeWire\n"));
        let err = wpctl.list_devices().await.unwrap_err();
        match err {
            ReadError::CommandFailed {
                command,
                code,
                stderr,
            } => {
                assert_eq!(command, "wpctl status");
                assert_eq!(code, Some(1));
                assert_eq!(stderr, "Could not connect to PipeWire");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn failing_status_with_report_is_still_read() {
        let wpctl = wpctl(FakeRunner::replying(1, STATUS, "warning: partial registry\n"));
        let devices = wpctl.list_devices().await.unwrap();
        assert_eq!(devices, vec![DeviceRecord::new(3, "Speakers", true, 0.80, false)]);
    }

    #[tokio::test]
    async fn control_commands_format_arguments() {
        let wpctl = Wpctl::with_runner(
            vec!["flatpak-spawn".to_owned(), "--host".to_owned(), "wpctl".to_owned()],
            MAX_DEVICES,
            FakeRunner::replying(0, "", ""),
        );
        wpctl.set_volume(42, 0.456).await.unwrap();
        wpctl.set_volume(7, 1.5).await.unwrap();
        wpctl.set_default_device(7).await.unwrap();
        assert_eq!(
            *wpctl.runner.calls.borrow(),
            vec![
                "flatpak-spawn --host wpctl set-volume 42 0.46",
                "flatpak-spawn --host wpctl set-volume 7 1.50",
                "flatpak-spawn --host wpctl set-default 7",
            ]
        );
    }

    #[tokio::test]
    async fn control_command_failure_is_surfaced() {
        let wpctl = wpctl(FakeRunner::replying(255, "", "Object '99' not found\n"));
        let err = wpctl.set_default_device(99).await.unwrap_err();
        assert!(
            matches!(err, ReadError::CommandFailed { code: Some(255), .. }),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn reads_from_a_real_process() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake-wpctl.sh");
        std::fs::write(
            &script,
            format!("if [ \"$1\" = status ]; then cat <<'EOF'\n{STATUS}EOF\nelse exit 4; fi\n"),
        )
        .unwrap();

        let wpctl = Wpctl::with_runner(
            vec!["sh".to_owned(), script.to_string_lossy().into_owned()],
            MAX_DEVICES,
            ProcessRunner::new(Duration::from_secs(5)),
        );
        let devices = wpctl.list_devices().await.unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].id, 3);

        let err = wpctl.set_volume(3, 0.5).await.unwrap_err();
        assert!(
            matches!(err, ReadError::CommandFailed { code: Some(4), .. }),
            "{err:?}"
        );
    }
}
