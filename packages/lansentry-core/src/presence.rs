//! Presence reconciliation.
//!
//! Merges link-layer sweep results, reachability probe results, and the
//! previous cycle's state into a new authoritative device list. The merge
//! precedence for a registered device is: current-cycle sighting, then
//! prior-cycle record, then the raw registry entry. `online` is always
//! recomputed from `last_seen` through the staleness policy.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::registry::{Device, DeviceKind};
use crate::scanner::{self, SweepEntry};

/// Reconciliation tunables, lifted from the running configuration.
#[derive(Debug, Clone, Copy)]
pub struct ReconcileOptions {
    pub show_offline: bool,
    pub show_unknown: bool,
    pub sort: bool,
    pub keep_alive_secs: i64,
}

/// The authoritative state shared between the reconcile pass, the probe
/// apply loop, and the read-only consumers. Guarded by a mutex in the
/// daemon; reconcile and probe application must never interleave.
#[derive(Debug, Clone)]
pub struct PresenceState {
    pub devices: Vec<Device>,
    pub occupied: bool,
}

impl PresenceState {
    /// Start from the normalized registry so probe results arriving before
    /// the first sweep have a device to land on. The occupancy flag starts
    /// `true`; the first vacant cycle then raises a transition.
    pub fn new(registry: &[Device]) -> Self {
        PresenceState {
            devices: registry.to_vec(),
            occupied: true,
        }
    }
}

/// Staleness policy: a device is online iff it was sighted strictly less
/// than `keep_alive_secs` ago. Exactly `keep_alive_secs` elapsed counts as
/// stale. A device never sighted is offline.
pub fn is_online(
    last_seen: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    keep_alive_secs: i64,
) -> bool {
    match last_seen {
        Some(seen) => (now - seen).num_seconds() < keep_alive_secs,
        None => false,
    }
}

/// Merge one cycle's sweep result against the registry and previous state.
///
/// A failed sweep shows up here as an empty `sweep` slice: registered
/// devices then fall through to their prior record and degrade toward
/// staleness instead of disappearing.
pub fn reconcile(
    previous: &[Device],
    sweep: &[SweepEntry],
    registry: &[Device],
    options: &ReconcileOptions,
    now: DateTime<Utc>,
) -> Vec<Device> {
    // Resolve sweep rows into sightings, first occurrence winning on
    // duplicate hardware addresses.
    let mut swept_macs: HashSet<String> = HashSet::new();
    let mut sightings: Vec<Device> = Vec::new();
    for entry in sweep {
        let mac = entry.mac_address.to_uppercase();
        if !swept_macs.insert(mac.clone()) {
            continue;
        }

        let mut device = match registry
            .iter()
            .find(|d| d.mac_address.as_deref() == Some(mac.as_str()))
        {
            Some(known) => known.clone(),
            None if options.show_unknown => {
                Device::unknown(&mac, scanner::vendor_for(&mac))
            }
            None => continue,
        };
        device.ip_address = Some(entry.ip_address.clone());
        device.last_seen = Some(now);
        device.online = true;
        sightings.push(device);
    }

    let mut next = if options.show_offline {
        merge_with_registry(previous, &sightings, registry, options, now)
    } else {
        // Only devices seen this cycle; nothing is carried forward.
        sightings
    };

    if options.sort {
        sort_devices(&mut next);
    }
    next
}

fn merge_with_registry(
    previous: &[Device],
    sightings: &[Device],
    registry: &[Device],
    options: &ReconcileOptions,
    now: DateTime<Utc>,
) -> Vec<Device> {
    let sighted_by_mac: HashMap<&str, &Device> = sightings
        .iter()
        .filter_map(|d| d.mac_address.as_deref().map(|mac| (mac, d)))
        .collect();
    let previous_by_mac: HashMap<&str, &Device> = previous
        .iter()
        .filter_map(|d| d.mac_address.as_deref().map(|mac| (mac, d)))
        .collect();

    let mut next: Vec<Device> = Vec::with_capacity(registry.len());
    for device in registry {
        match device.mac_address.as_deref() {
            Some(mac) => {
                let mut chosen = sighted_by_mac
                    .get(mac)
                    .or_else(|| previous_by_mac.get(mac))
                    .map(|d| (*d).clone())
                    .unwrap_or_else(|| device.clone());
                chosen.online = is_online(chosen.last_seen, now, options.keep_alive_secs);
                next.push(chosen);
            }
            None => {
                // Probe application is the only update path for devices
                // without a hardware address; carry their live record.
                let carried = previous
                    .iter()
                    .find(|p| p.mac_address.is_none() && p.ip_address == device.ip_address)
                    .cloned()
                    .unwrap_or_else(|| device.clone());
                next.push(carried);
            }
        }
    }

    // Scan-only devices follow the registry, in sweep order.
    next.extend(
        sightings
            .iter()
            .filter(|d| d.kind == DeviceKind::Unknown)
            .cloned(),
    );
    next
}

/// Apply a single reachability probe result to the live state.
///
/// Probes are issued by network address, so the target is matched by IP.
/// `online` is recomputed even when the probe failed, letting an old
/// sighting go stale. Returns whether a device was updated.
pub fn apply_probe_result(
    state: &mut [Device],
    ip_address: &str,
    is_alive: bool,
    now: DateTime<Utc>,
    keep_alive_secs: i64,
) -> bool {
    let Some(device) = state
        .iter_mut()
        .find(|d| d.ip_address.as_deref() == Some(ip_address))
    else {
        return false;
    };

    if is_alive {
        device.last_seen = Some(now);
    }
    device.online = is_online(device.last_seen, now, keep_alive_secs);
    true
}

/// Registered devices group ahead of scan-only devices and sort by
/// name then hardware address; scan-only devices sort by their bare name
/// (the hardware address). Comparison is case-folded so "alice" and "Bob"
/// order the way a reader expects.
fn sort_key(device: &Device) -> (u8, String) {
    match device.kind {
        DeviceKind::Known => (
            0,
            format!(
                "{}{}",
                device.name,
                device.mac_address.as_deref().unwrap_or_default()
            )
            .to_lowercase(),
        ),
        DeviceKind::Unknown => (1, device.name.to_lowercase()),
    }
}

fn sort_devices(devices: &mut [Device]) {
    // sort_by is stable, so equal keys keep their relative order.
    devices.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
}
