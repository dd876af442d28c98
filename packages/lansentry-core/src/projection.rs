//! Presentation projection: read-only transform of the reconciled device
//! list into display-ready rows. Rendering itself lives in the CLI; this
//! module only decides what each row shows.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::Config;
use crate::registry::Device;

/// One display-ready device entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedDevice {
    pub name: String,
    /// Populated when `show_ip` is set and the device has an address.
    pub ip_address: Option<String>,
    pub icon: String,
    pub online: bool,
    /// Color for the device symbol, when any coloring option resolves one.
    pub symbol_color: Option<String>,
    /// Color for the device label.
    pub label_color: Option<String>,
    /// Humanized "last seen" text, e.g. "4 minutes ago".
    pub last_seen: Option<String>,
    pub vendor: Option<String>,
}

/// The full projected view. `groups` holds one row group per display row;
/// without `show_device_columns` everything lands in a single group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedView {
    pub columns: bool,
    pub groups: Vec<Vec<ProjectedDevice>>,
}

/// Project the reconciled state into renderable rows.
///
/// Devices are filtered to `online || show_offline`, colors are resolved
/// per the `colored` / `colored_state` / `colored_symbol_only` options,
/// and devices flagged `show_in_new_row` start a new group when the
/// column layout is enabled.
pub fn project(devices: &[Device], config: &Config, now: DateTime<Utc>) -> ProjectedView {
    let mut groups: Vec<Vec<ProjectedDevice>> = vec![Vec::new()];

    for device in devices {
        if !(device.online || device.show_offline) {
            continue;
        }

        if config.show_device_columns && device.show_in_new_row {
            if !groups.last().is_some_and(Vec::is_empty) {
                groups.push(Vec::new());
            }
        }

        groups
            .last_mut()
            .expect("groups is never empty")
            .push(project_device(device, config, now));
    }

    ProjectedView {
        columns: config.show_device_columns,
        groups,
    }
}

fn project_device(device: &Device, config: &Config, now: DateTime<Utc>) -> ProjectedDevice {
    let mut symbol_color = config.colored.then(|| device.color.clone());
    if config.colored_state {
        if device.online {
            if device.has_online {
                symbol_color = Some(device.color_state_online.clone());
            }
        } else if device.has_offline {
            symbol_color = Some(device.color_state_offline.clone());
        }
    }

    let label_color = (config.colored
        && !config.colored_symbol_only
        && device.last_seen.is_some())
    .then(|| device.color.clone());

    let show_last_seen = config.show_last_seen
        && (!config.show_last_seen_when_offline || !device.online);
    let last_seen = show_last_seen
        .then(|| device.last_seen.map(|seen| relative_time(seen, now)))
        .flatten();

    ProjectedDevice {
        name: device.name.clone(),
        ip_address: config
            .show_ip
            .then(|| device.ip_address.clone())
            .flatten(),
        icon: device.icon.clone(),
        online: device.online,
        symbol_color,
        label_color,
        last_seen,
        vendor: device.vendor.clone(),
    }
}

/// Humanize a sighting timestamp relative to `now`, moment.js style.
pub fn relative_time(seen: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - seen).num_seconds().max(0);
    let minutes = (secs + 30) / 60;
    let hours = (minutes + 30) / 60;
    let days = (hours + 12) / 24;

    if secs < 45 {
        "a few seconds ago".to_string()
    } else if secs < 90 {
        "a minute ago".to_string()
    } else if minutes < 45 {
        format!("{minutes} minutes ago")
    } else if minutes < 90 {
        "an hour ago".to_string()
    } else if hours < 22 {
        format!("{hours} hours ago")
    } else if hours < 36 {
        "a day ago".to_string()
    } else if days < 26 {
        format!("{days} days ago")
    } else if days < 45 {
        "a month ago".to_string()
    } else if days < 320 {
        format!("{} months ago", (days + 15) / 30)
    } else {
        let years = (days + 182) / 365;
        if years <= 1 {
            "a year ago".to_string()
        } else {
            format!("{years} years ago")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{RawDevice, normalize};
    use chrono::Duration;

    fn device(name: &str, online: bool) -> Device {
        let mut d = normalize(&[RawDevice {
            name: Some(name.to_string()),
            mac_address: Some("AA:BB:CC:11:22:33".to_string()),
            ip_address: Some("192.168.1.5".to_string()),
            color: Some("#336699".to_string()),
            ..RawDevice::default()
        }])
        .remove(0);
        d.online = online;
        if online {
            d.last_seen = Some(Utc::now());
        }
        d
    }

    #[test]
    fn test_filters_offline_devices_without_show_offline() {
        let mut hidden = device("Guest", false);
        hidden.show_offline = false;
        let visible = device("Phone", true);

        let view = project(&[hidden, visible], &Config::default(), Utc::now());
        assert_eq!(view.groups.len(), 1);
        assert_eq!(view.groups[0].len(), 1);
        assert_eq!(view.groups[0][0].name, "Phone");
    }

    #[test]
    fn test_offline_unknown_devices_are_hidden() {
        let unknown = Device::unknown("FF:FF:FF:00:00:01", None);
        let view = project(&[unknown], &Config::default(), Utc::now());
        assert!(view.groups[0].is_empty());
    }

    #[test]
    fn test_ip_detail_follows_show_ip() {
        let devices = [device("Phone", true)];

        let with_ip = project(&devices, &Config::default(), Utc::now());
        assert_eq!(
            with_ip.groups[0][0].ip_address.as_deref(),
            Some("192.168.1.5")
        );

        let config = Config {
            show_ip: false,
            ..Config::default()
        };
        let without_ip = project(&devices, &config, Utc::now());
        assert_eq!(without_ip.groups[0][0].ip_address, None);
    }

    #[test]
    fn test_color_resolution() {
        let plain = project(&[device("Phone", true)], &Config::default(), Utc::now());
        assert_eq!(plain.groups[0][0].symbol_color, None);
        assert_eq!(plain.groups[0][0].label_color, None);

        let colored = Config {
            colored: true,
            ..Config::default()
        };
        let view = project(&[device("Phone", true)], &colored, Utc::now());
        assert_eq!(view.groups[0][0].symbol_color.as_deref(), Some("#336699"));
        assert_eq!(view.groups[0][0].label_color.as_deref(), Some("#336699"));

        let symbol_only = Config {
            colored: true,
            colored_symbol_only: true,
            ..Config::default()
        };
        let view = project(&[device("Phone", true)], &symbol_only, Utc::now());
        assert_eq!(view.groups[0][0].symbol_color.as_deref(), Some("#336699"));
        assert_eq!(view.groups[0][0].label_color, None);
    }

    #[test]
    fn test_state_color_needs_explicit_configuration() {
        let config = Config {
            colored_state: true,
            ..Config::default()
        };

        // No explicit state colors configured: nothing resolves.
        let view = project(&[device("Phone", true)], &config, Utc::now());
        assert_eq!(view.groups[0][0].symbol_color, None);

        let mut d = device("Phone", true);
        d.has_online = true;
        d.color_state_online = "#00ff00".to_string();
        let view = project(&[d.clone()], &config, Utc::now());
        assert_eq!(view.groups[0][0].symbol_color.as_deref(), Some("#00ff00"));

        d.online = false;
        d.has_offline = true;
        d.color_state_offline = "#ff0000".to_string();
        let view = project(&[d], &config, Utc::now());
        assert_eq!(view.groups[0][0].symbol_color.as_deref(), Some("#ff0000"));
    }

    #[test]
    fn test_last_seen_text_options() {
        let now = Utc::now();
        let mut online = device("Phone", true);
        online.last_seen = Some(now - Duration::seconds(300));
        let mut offline = device("Laptop", false);
        offline.last_seen = Some(now - Duration::seconds(300));

        let config = Config {
            show_last_seen: true,
            ..Config::default()
        };
        let view = project(&[online.clone(), offline.clone()], &config, now);
        assert_eq!(view.groups[0][0].last_seen.as_deref(), Some("5 minutes ago"));
        assert_eq!(view.groups[0][1].last_seen.as_deref(), Some("5 minutes ago"));

        // Restricted to offline devices only.
        let config = Config {
            show_last_seen: true,
            show_last_seen_when_offline: true,
            ..Config::default()
        };
        let view = project(&[online, offline], &config, now);
        assert_eq!(view.groups[0][0].last_seen, None);
        assert_eq!(view.groups[0][1].last_seen.as_deref(), Some("5 minutes ago"));
    }

    #[test]
    fn test_new_row_grouping_in_column_layout() {
        let mut a = device("A", true);
        let mut b = device("B", true);
        b.show_in_new_row = true;
        let c = device("C", true);

        let config = Config {
            show_device_columns: true,
            ..Config::default()
        };
        let view = project(&[a.clone(), b.clone(), c.clone()], &config, Utc::now());
        assert!(view.columns);
        assert_eq!(view.groups.len(), 2);
        assert_eq!(view.groups[0][0].name, "A");
        assert_eq!(view.groups[1][0].name, "B");
        assert_eq!(view.groups[1][1].name, "C");

        // The flag is ignored in the row layout.
        let view = project(&[a.clone(), b.clone(), c.clone()], &Config::default(), Utc::now());
        assert_eq!(view.groups.len(), 1);

        // A leading flagged device does not create an empty first group.
        a.show_in_new_row = true;
        let config = Config {
            show_device_columns: true,
            ..Config::default()
        };
        let view = project(&[a, b, c], &config, Utc::now());
        assert_eq!(view.groups.len(), 2);
        assert!(!view.groups[0].is_empty());
    }

    #[test]
    fn test_relative_time_buckets() {
        let now = Utc::now();
        let at = |secs: i64| relative_time(now - Duration::seconds(secs), now);

        assert_eq!(at(10), "a few seconds ago");
        assert_eq!(at(60), "a minute ago");
        assert_eq!(at(240), "4 minutes ago");
        assert_eq!(at(3600), "an hour ago");
        assert_eq!(at(4 * 3600), "4 hours ago");
        assert_eq!(at(24 * 3600), "a day ago");
        assert_eq!(at(5 * 24 * 3600), "5 days ago");
    }
}
