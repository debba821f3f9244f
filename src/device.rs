use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use serde::{Deserialize, Serialize};

/// Longest device name we keep, in bytes. Longer names are cut at the nearest char boundary.
pub const MAX_NAME_LEN: usize = 255;

/// One audio sink as reported by the status command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// The id used to address the device in control commands.
    pub id: u32,
    pub name: String,
    /// Whether this is the current default sink.
    pub is_active: bool,
    /// Volume as a fraction. Usually in `0.0..=1.0`, but boosted gain may exceed it.
    pub volume: f64,
    pub muted: bool,
    pub icon: IconCategory,
}

impl DeviceRecord {
    pub fn new(id: u32, name: &str, is_active: bool, volume: f64, muted: bool) -> Self {
        let name = truncate_name(name);
        let icon = classify(&name);
        Self {
            id,
            name,
            is_active,
            volume,
            muted,
            icon,
        }
    }

    pub fn volume_percent(&self) -> f64 {
        self.volume * 100.0
    }
}

fn truncate_name(name: &str) -> String {
    if name.len() <= MAX_NAME_LEN {
        return name.to_owned();
    }
    let mut end = MAX_NAME_LEN;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name[..end].to_owned()
}

/// A rough guess at what kind of output a device is, used to pick its icon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IconCategory {
    Headphones,
    Display,
    Bluetooth,
    #[default]
    Speakers,
}

impl IconCategory {
    /// The freedesktop symbolic icon for this category.
    pub fn icon_name(self) -> &'static str {
        match self {
            IconCategory::Headphones => "audio-headphones-symbolic",
            IconCategory::Display => "video-display-symbolic",
            IconCategory::Bluetooth => "bluetooth-active-symbolic",
            IconCategory::Speakers => "audio-speakers-symbolic",
        }
    }
}

/// Classify a device by keywords in its name. The first matching rule wins, so "Bluetooth
/// Headphones" are headphones.
pub fn classify(name: &str) -> IconCategory {
    let name = name.to_lowercase();
    if name.contains("headphone") {
        IconCategory::Headphones
    } else if ["hdmi", "tv", "display"]
        .iter()
        .any(|keyword| name.contains(keyword))
    {
        IconCategory::Display
    } else if name.contains("bluetooth") {
        IconCategory::Bluetooth
    } else {
        IconCategory::Speakers
    }
}

/// Find the device whose name best matches `query`.
pub fn find_by_name<'a>(devices: &'a [DeviceRecord], query: &str) -> Option<&'a DeviceRecord> {
    let fuzzy_matcher = SkimMatcherV2::default().smart_case();
    devices
        .iter()
        .filter_map(|device| {
            fuzzy_matcher
                .fuzzy_match(&device.name, query)
                .map(|score| (score, device))
        })
        // Ties go to the device listed first
        .rev()
        .max_by_key(|(score, _)| *score)
        .map(|(_, device)| device)
}
