//! State behind the panel's output list and volume slider.
//!
//! The state is a plain value: it is built from a device snapshot, and every change produces a
//! new state instead of writing to anything shared.

use crate::device::DeviceRecord;

/// Slider position shown when no device is active.
pub const DEFAULT_SLIDER_PERCENT: f64 = 50.0;

const SLIDER_MIN: f64 = 0.0;
const SLIDER_MAX: f64 = 100.0;

#[derive(Debug, Clone, PartialEq)]
pub struct PanelState {
    pub devices: Vec<DeviceRecord>,
    pub active_id: Option<u32>,
    /// Volume slider position in percent.
    pub slider: f64,
    pub volume_step: f64,
}

/// Keyboard shortcuts understood by the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Quit,
    Silence,
    VolumeDown,
    VolumeUp,
    /// Jump to a multiple of ten percent. `0` means 100 %.
    Preset(u8),
}

impl Shortcut {
    /// Accepts either the character or its keysym name, e.g. `-` or `minus`.
    pub fn from_key_name(key: &str) -> Option<Self> {
        match key {
            "q" => Some(Shortcut::Quit),
            "`" | "grave" => Some(Shortcut::Silence),
            "-" | "minus" => Some(Shortcut::VolumeDown),
            "=" | "equal" => Some(Shortcut::VolumeUp),
            _ => {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(digit @ '0'..='9'), None) => digit
                        .to_digit(10)
                        .map(|digit| Shortcut::Preset(digit as u8)),
                    _ => None,
                }
            }
        }
    }
}

/// Something the presentation layer should carry out in response to input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanelAction {
    Quit,
    SetVolume { id: u32, level: f64 },
}

impl PanelState {
    pub fn from_devices(devices: Vec<DeviceRecord>, volume_step: f64) -> Self {
        let active = devices.iter().filter(|device| device.is_active).last();
        let active_id = active.map(|device| device.id);
        let slider = active
            .map(|device| slider_position(device.volume))
            .unwrap_or(DEFAULT_SLIDER_PERCENT);
        Self {
            devices,
            active_id,
            slider,
            volume_step,
        }
    }

    pub fn active_device(&self) -> Option<&DeviceRecord> {
        let id = self.active_id?;
        self.devices.iter().find(|device| device.id == id)
    }

    /// Map a shortcut to an action. Volume shortcuts need an active device, and do nothing if
    /// the slider would not move.
    pub fn handle_key(&self, shortcut: Shortcut) -> Option<PanelAction> {
        let target = match shortcut {
            Shortcut::Quit => return Some(PanelAction::Quit),
            Shortcut::Silence => SLIDER_MIN,
            Shortcut::VolumeDown => self.slider - self.volume_step,
            Shortcut::VolumeUp => self.slider + self.volume_step,
            Shortcut::Preset(0) => SLIDER_MAX,
            Shortcut::Preset(n) => f64::from(n) * 10.0,
        }
        .clamp(SLIDER_MIN, SLIDER_MAX);
        let id = self.active_id?;

        (target != self.slider).then_some(PanelAction::SetVolume {
            id,
            level: target / 100.0,
        })
    }

    pub fn apply(mut self, action: PanelAction) -> Self {
        if let PanelAction::SetVolume { id, level } = action {
            if let Some(device) = self.devices.iter_mut().find(|device| device.id == id) {
                device.volume = level;
            }
            if self.active_id == Some(id) {
                self.slider = slider_position(level);
            }
        }
        self
    }

    /// Mark `id` as the default sink. Unknown ids leave the state untouched.
    pub fn select(mut self, id: u32) -> Self {
        let Some(volume) = self
            .devices
            .iter()
            .find(|device| device.id == id)
            .map(|device| device.volume)
        else {
            return self;
        };
        for device in &mut self.devices {
            device.is_active = device.id == id;
        }
        self.active_id = Some(id);
        self.slider = slider_position(volume);
        self
    }
}

/// Boosted gain above 100 % pins the slider to its end.
fn slider_position(volume: f64) -> f64 {
    (volume * 100.0).clamp(SLIDER_MIN, SLIDER_MAX)
}
