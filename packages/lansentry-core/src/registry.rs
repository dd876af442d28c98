//! Device registry: the configured device list and attribute normalization.
//!
//! Raw config entries may omit almost everything; `normalize` back-fills
//! defaults once at startup so the rest of the crate never has to reason
//! about missing display attributes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Icon used when a device entry does not configure one.
pub const DEFAULT_ICON: &str = "question";

/// Color used for unconfigured color fields.
pub const DEFAULT_COLOR: &str = "#ffffff";

/// Whether a device came from the registry or was synthesized from a scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    #[default]
    Known,
    Unknown,
}

/// A device entry as written in the configuration file.
///
/// Every field except the identity pair is optional; see [`normalize`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawDevice {
    pub mac_address: Option<String>,
    pub ip_address: Option<String>,
    pub name: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub color_state_online: Option<String>,
    pub color_state_offline: Option<String>,
    pub show_offline: Option<bool>,
    pub show_in_new_row: Option<bool>,
}

/// A fully populated device record.
///
/// `last_seen` is written only by the presence engine; `online` is always
/// recomputed from `last_seen`, never authored directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub mac_address: Option<String>,
    pub ip_address: Option<String>,
    pub name: String,
    pub icon: String,
    pub color: String,
    pub color_state_online: String,
    pub color_state_offline: String,
    pub has_online: bool,
    pub has_offline: bool,
    pub show_offline: bool,
    pub show_in_new_row: bool,
    pub kind: DeviceKind,
    pub vendor: Option<String>,
    pub last_seen: Option<DateTime<Utc>>,
    pub online: bool,
}

impl Device {
    /// Synthesize a device for a hardware address that matched no registry
    /// entry. Exists only within a single reconciliation cycle. Scan-only
    /// devices are shown while online and disappear once they go quiet.
    pub fn unknown(mac_address: &str, vendor: Option<String>) -> Self {
        let mac = mac_address.to_uppercase();
        Device {
            name: mac.clone(),
            mac_address: Some(mac),
            ip_address: None,
            icon: DEFAULT_ICON.to_string(),
            color: DEFAULT_COLOR.to_string(),
            color_state_online: DEFAULT_COLOR.to_string(),
            color_state_offline: DEFAULT_COLOR.to_string(),
            has_online: false,
            has_offline: false,
            show_offline: false,
            show_in_new_row: false,
            kind: DeviceKind::Unknown,
            vendor,
            last_seen: None,
            online: false,
        }
    }

    /// Key under which this device's last sighting is persisted.
    /// Hardware address wins over network address; a device with neither
    /// has no durable identity and is not persisted.
    pub fn storage_key(&self) -> Option<String> {
        self.mac_address
            .as_deref()
            .or(self.ip_address.as_deref())
            .map(|id| format!("{id}.lastseen"))
    }
}

/// Back-fill missing attributes on the configured device list.
///
/// Hardware addresses are canonicalized to uppercase, the display name
/// falls back to the MAC, then the IP, then `"Unknown"`, and the derived
/// `has_online`/`has_offline` flags record whether explicit state colors
/// were configured. Pure and idempotent.
pub fn normalize(raw_devices: &[RawDevice]) -> Vec<Device> {
    raw_devices
        .iter()
        .map(|raw| {
            let mac_address = raw.mac_address.as_deref().map(str::to_uppercase);
            let name = raw
                .name
                .clone()
                .or_else(|| mac_address.clone())
                .or_else(|| raw.ip_address.clone())
                .unwrap_or_else(|| "Unknown".to_string());

            Device {
                mac_address,
                ip_address: raw.ip_address.clone(),
                name,
                icon: raw.icon.clone().unwrap_or_else(|| DEFAULT_ICON.to_string()),
                color: raw
                    .color
                    .clone()
                    .unwrap_or_else(|| DEFAULT_COLOR.to_string()),
                has_online: raw.color_state_online.is_some(),
                has_offline: raw.color_state_offline.is_some(),
                color_state_online: raw
                    .color_state_online
                    .clone()
                    .unwrap_or_else(|| DEFAULT_COLOR.to_string()),
                color_state_offline: raw
                    .color_state_offline
                    .clone()
                    .unwrap_or_else(|| DEFAULT_COLOR.to_string()),
                show_offline: raw.show_offline.unwrap_or(true),
                show_in_new_row: raw.show_in_new_row.unwrap_or(false),
                kind: DeviceKind::Known,
                vendor: None,
                last_seen: None,
                online: false,
            }
        })
        .collect()
}
