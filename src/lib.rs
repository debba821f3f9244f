pub mod device;
pub mod error;
pub mod launcher;
pub mod panel;
pub mod settings;
pub mod wpctl;

pub const AUDIOCONTROL_APP_ID: &str = "ca.hongyan.audiocontrol";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
