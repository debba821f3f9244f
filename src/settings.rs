use std::{borrow::Cow, str::FromStr, time::Duration};

use thiserror::Error;

use crate::wpctl::MAX_DEVICES;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Command line used to run wpctl, split with shell quoting rules.
    pub wpctl: Cow<'static, str>,
    pub command_timeout: Duration,
    pub max_devices: usize,
    /// Percentage points moved by the volume up/down shortcuts.
    pub volume_step: f64,
}

pub const DEFAULT_SETTINGS: Settings = Settings {
    wpctl: Cow::Borrowed("wpctl"),
    command_timeout: Duration::from_secs(5),
    max_devices: MAX_DEVICES,
    volume_step: 5.0,
};

impl Default for Settings {
    fn default() -> Self {
        DEFAULT_SETTINGS
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Invalid value for {0}: {1:?}")]
    InvalidValue(&'static str, String),
    #[error("Could not split wpctl command {0:?}: {1}")]
    InvalidCommand(String, String),
    #[error("The wpctl command is empty")]
    EmptyCommand,
}

impl Settings {
    /// Default settings overridden by `AUDIOCONTROL_*` environment variables.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let mut settings = Self::default();
        if let Some(wpctl) = lookup("AUDIOCONTROL_WPCTL") {
            settings.wpctl = Cow::Owned(wpctl);
        }
        if let Some(millis) = parse_var::<u64>(&lookup, "AUDIOCONTROL_TIMEOUT_MS")? {
            settings.command_timeout = Duration::from_millis(millis);
        }
        if let Some(max_devices) = parse_var(&lookup, "AUDIOCONTROL_MAX_DEVICES")? {
            settings.max_devices = max_devices;
        }
        if let Some(volume_step) = parse_var::<f64>(&lookup, "AUDIOCONTROL_VOLUME_STEP")? {
            if !volume_step.is_finite() || volume_step <= 0.0 {
                return Err(SettingsError::InvalidValue(
                    "AUDIOCONTROL_VOLUME_STEP",
                    volume_step.to_string(),
                ));
            }
            settings.volume_step = volume_step;
        }
        Ok(settings)
    }

    /// The wpctl command split into program and leading arguments.
    pub fn wpctl_command(&self) -> Result<Vec<String>, SettingsError> {
        let command = shell_words::split(&self.wpctl)
            .map_err(|err| SettingsError::InvalidCommand(self.wpctl.to_string(), err.to_string()))?;
        if command.is_empty() {
            return Err(SettingsError::EmptyCommand);
        }
        Ok(command)
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, SettingsError> {
    lookup(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| SettingsError::InvalidValue(key, value.clone()))
        })
        .transpose()
}
