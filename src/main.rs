use std::time::Duration;

use anyhow::{bail, Context, Result};
use audiocontrol::{
    device::{self, DeviceRecord},
    launcher::{self, advanced_controls},
    panel::{PanelAction, PanelState, Shortcut},
    settings::Settings,
    wpctl::Wpctl,
    APP_VERSION, AUDIOCONTROL_APP_ID,
};
use clap::{ArgAction, Parser, Subcommand};
use log::{debug, info};

#[derive(Debug, Parser)]
#[command(name = "audiocontrol", version, about = "View and switch audio output devices")]
struct Cli {
    /// More logging, may be repeated
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
    /// Command used to run wpctl (overrides AUDIOCONTROL_WPCTL)
    #[arg(long, global = true)]
    wpctl: Option<String>,
    /// Timeout for each wpctl call (overrides AUDIOCONTROL_TIMEOUT_MS)
    #[arg(long, global = true, value_name = "MS")]
    timeout_ms: Option<u64>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List output devices (the default)
    List {
        #[arg(long)]
        json: bool,
    },
    /// Show the active output device and its volume
    Status,
    /// Set the volume of a device, as a fraction (0.5 is 50 %)
    SetVolume {
        /// Device id or part of its name
        device: String,
        level: f64,
    },
    /// Make a device the default output
    SetDefault {
        /// Device id or part of its name
        device: String,
    },
    /// Press a panel shortcut: q, `, -, = or 0-9
    Key { key: String },
    /// List the advanced mixers that can be launched
    Launchers,
    /// Start an advanced mixer
    Launch { name: String },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match (cli.quiet, cli.verbose) {
        (true, _) => log::LevelFilter::Error,
        (false, 0) => log::LevelFilter::Info,
        (false, 1) => log::LevelFilter::Debug,
        (false, _) => log::LevelFilter::Trace,
    };
    colog::default_builder().filter_level(level).init();

    match dotenvy::dotenv() {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(err) if err.not_found() => {}
        Err(err) => return Err(err).context("Failed to load .env file"),
    }
    debug!("{AUDIOCONTROL_APP_ID} {APP_VERSION}");

    let mut settings = Settings::from_env().context("Invalid settings in environment")?;
    if let Some(wpctl) = cli.wpctl {
        settings.wpctl = wpctl.into();
    }
    if let Some(millis) = cli.timeout_ms {
        settings.command_timeout = Duration::from_millis(millis);
    }
    let wpctl = Wpctl::from_settings(&settings).context("Invalid wpctl command")?;

    match cli.command.unwrap_or(Command::List { json: false }) {
        Command::List { json } => {
            let devices = wpctl
                .list_devices()
                .await
                .context("Failed to read audio devices")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&devices)?);
            } else {
                print_devices(&devices);
            }
        }
        Command::Status => {
            let devices = wpctl
                .list_devices()
                .await
                .context("Failed to read audio devices")?;
            let panel = PanelState::from_devices(devices, settings.volume_step);
            match panel.active_device() {
                Some(device) => println!(
                    "{} ({}): {:.0}%{}",
                    device.name,
                    device.id,
                    panel.slider,
                    if device.muted { " muted" } else { "" }
                ),
                None => println!("No active output device"),
            }
        }
        Command::SetVolume { device, level } => {
            let id = resolve_device(&wpctl, &device).await?;
            wpctl
                .set_volume(id, level)
                .await
                .context("Failed to set volume")?;
            info!("Set volume of device {id} to {level:.2}");
        }
        Command::SetDefault { device } => {
            let id = resolve_device(&wpctl, &device).await?;
            wpctl
                .set_default_device(id)
                .await
                .context("Failed to set default device")?;
            info!("Device {id} is now the default output");
        }
        Command::Key { key } => {
            let Some(shortcut) = Shortcut::from_key_name(&key) else {
                bail!("Unknown shortcut {key:?}");
            };
            let devices = wpctl
                .list_devices()
                .await
                .context("Failed to read audio devices")?;
            let panel = PanelState::from_devices(devices, settings.volume_step);
            match panel.handle_key(shortcut) {
                Some(action @ PanelAction::SetVolume { id, level }) => {
                    wpctl
                        .set_volume(id, level)
                        .await
                        .context("Failed to set volume")?;
                    let panel = panel.apply(action);
                    println!("{:.0}%", panel.slider);
                }
                Some(PanelAction::Quit) => debug!("Quit requested"),
                None => debug!("Shortcut {shortcut:?} had no effect"),
            }
        }
        Command::Launchers => {
            for launcher in advanced_controls() {
                let state = if launcher.available {
                    ""
                } else {
                    " (not installed)"
                };
                println!("{}{state}", launcher.label);
            }
        }
        Command::Launch { name } => {
            let launchers = advanced_controls();
            launcher::find_launcher(&launchers, &name)?.launch()?;
        }
    }

    Ok(())
}

/// Accept a numeric id as is, otherwise look the name up among the current sinks.
async fn resolve_device(wpctl: &Wpctl, query: &str) -> Result<u32> {
    if let Ok(id) = query.parse() {
        return Ok(id);
    }
    let devices = wpctl
        .list_devices()
        .await
        .context("Failed to read audio devices")?;
    match device::find_by_name(&devices, query) {
        Some(device) => {
            debug!("Resolved {query:?} to {} ({})", device.name, device.id);
            Ok(device.id)
        }
        None => bail!("No output device matches {query:?}"),
    }
}

fn print_devices(devices: &[DeviceRecord]) {
    if devices.is_empty() {
        println!("No output devices detected");
        return;
    }
    for device in devices {
        println!(
            "{} {:>4}. {}  [{:.0}%{}]  {}",
            if device.is_active { "*" } else { " " },
            device.id,
            device.name,
            device.volume_percent(),
            if device.muted { " muted" } else { "" },
            device.icon.icon_name(),
        );
    }
}
