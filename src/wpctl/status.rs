//! Parsing for the tree-drawn report printed by `wpctl status`.
//!
//! The report looks roughly like this:
//!
//! ```text
//! Audio
//!  ├─ Devices:
//!  │      46. Navi 10 HDMI Audio                  [alsa]
//!  │
//!  ├─ Sinks:
//!  │  *   42. Built-in Speakers                   [vol: 0.65]
//!  │      64. Navi 10 HDMI Audio Digital Stereo   [vol: 0.40 MUTED]
//!  │
//!  ├─ Sources:
//!  │  *   43. Built-in Microphone                 [vol: 1.00]
//! ```
//!
//! Only the first sink section is read. Everything after the next section header is ignored.

use std::sync::LazyLock;

use log::{trace, warn};
use regex::Regex;

use crate::device::DeviceRecord;

/// Default cap on the number of devices read from one report.
pub const MAX_DEVICES: usize = 32;

static DEVICE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*│\s*(\*)?\s*(\d+)\.\s+(.+?)\s+\[vol:\s*([\d.]+)(\s+MUTED)?")
        .expect("device line pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Sinks,
    Sources,
    Filters,
    Streams,
}

impl Section {
    fn marker(self) -> &'static str {
        match self {
            Section::Sinks => "Sinks:",
            Section::Sources => "Sources:",
            Section::Filters => "Filters:",
            Section::Streams => "Streams:",
        }
    }
}

/// What a single line of the report means on its own.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusLine {
    SectionHeader(Section),
    Device(DeviceRecord),
    Ignored,
}

impl StatusLine {
    /// Section markers are checked before the device grammar, so a line carrying a marker is
    /// always a header.
    pub fn parse(line: &str) -> Self {
        let header = [
            Section::Sinks,
            Section::Sources,
            Section::Filters,
            Section::Streams,
        ]
        .into_iter()
        .find(|section| line.contains(section.marker()));
        if let Some(section) = header {
            return StatusLine::SectionHeader(section);
        }

        parse_device(line)
            .map(StatusLine::Device)
            .unwrap_or(StatusLine::Ignored)
    }
}

fn parse_device(line: &str) -> Option<DeviceRecord> {
    let captures = DEVICE_LINE.captures(line)?;
    let id = captures[2].parse().ok()?;
    let volume = captures[4].parse().ok()?;
    Some(DeviceRecord::new(
        id,
        &captures[3],
        captures.get(1).is_some(),
        volume,
        captures.get(5).is_some(),
    ))
}

/// Collect the sinks listed in a status report, in the order they appear, stopping after
/// `max_devices` records.
pub fn parse_status(text: &str, max_devices: usize) -> Vec<DeviceRecord> {
    let mut devices = Vec::new();
    let mut in_sinks = false;

    for line in text.lines() {
        match StatusLine::parse(line) {
            StatusLine::SectionHeader(Section::Sinks) => in_sinks = true,
            StatusLine::SectionHeader(_) if in_sinks => break,
            StatusLine::Device(device) if in_sinks => {
                if devices.len() >= max_devices {
                    warn!("Status report lists more than {max_devices} sinks, ignoring the rest");
                    break;
                }
                devices.push(device);
            }
            _ if in_sinks => trace!("Skipping line in sink section: {line:?}"),
            _ => {}
        }
    }

    devices
}
