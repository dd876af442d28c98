//! Last-seen persistence: a small JSON key/value store so device sightings
//! survive restarts when `save_last_seen` is enabled.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::registry::Device;

const STORE_FILE: &str = "last-seen.json";

/// JSON-backed `<identity>.lastseen -> timestamp` store.
///
/// Reads never fail: a missing or corrupt file falls back to an empty
/// store. Writes go through [`LastSeenStore::flush`] and are surfaced to
/// the caller since a failed write silently loses durability.
#[derive(Debug)]
pub struct LastSeenStore {
    path: PathBuf,
    data: HashMap<String, DateTime<Utc>>,
}

impl LastSeenStore {
    /// Open the store at the platform data directory,
    /// e.g. `~/.local/share/lansentry/last-seen.json`.
    pub fn open_default() -> Result<LastSeenStore> {
        let data_dir = dirs::data_local_dir()
            .or_else(dirs::data_dir)
            .context("could not find a data directory")?;

        let app_dir = data_dir.join("lansentry");
        std::fs::create_dir_all(&app_dir)
            .with_context(|| format!("failed to create data directory {}", app_dir.display()))?;

        Ok(Self::open(app_dir.join(STORE_FILE)))
    }

    /// Open the store at an explicit path, loading whatever is there.
    pub fn open(path: PathBuf) -> LastSeenStore {
        let data = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!(
                        "ignoring unreadable last-seen store {}: {e}",
                        path.display()
                    );
                    HashMap::new()
                }
            },
            // First run, or unreadable: start empty either way.
            Err(_) => HashMap::new(),
        };

        LastSeenStore { path, data }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<DateTime<Utc>> {
        self.data.get(key).copied()
    }

    pub fn set(&mut self, key: &str, value: DateTime<Utc>) {
        self.data.insert(key.to_string(), value);
    }

    /// Write the store to disk.
    pub fn flush(&self) -> Result<()> {
        let content =
            serde_json::to_string_pretty(&self.data).context("failed to serialize last-seen store")?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("failed to write last-seen store {}", self.path.display()))?;

        tracing::debug!("saved {} last-seen entries", self.data.len());
        Ok(())
    }

    /// Record the sightings of every device that has one, then flush.
    pub fn save_devices(&mut self, devices: &[Device]) -> Result<()> {
        for device in devices {
            if let (Some(key), Some(seen)) = (device.storage_key(), device.last_seen) {
                self.set(&key, seen);
            }
        }
        self.flush()
    }

    /// Restore stored sightings onto devices that have none yet.
    pub fn restore_devices(&self, devices: &mut [Device]) {
        for device in devices.iter_mut() {
            if device.last_seen.is_some() {
                continue;
            }
            if let Some(seen) = device.storage_key().and_then(|key| self.get(&key)) {
                device.last_seen = Some(seen);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{RawDevice, normalize};

    fn store_in(dir: &tempfile::TempDir) -> LastSeenStore {
        LastSeenStore::open(dir.path().join(STORE_FILE))
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let seen = Utc::now();

        let mut store = store_in(&dir);
        store.set("AA:BB:CC:11:22:33.lastseen", seen);
        store.flush().unwrap();

        let reopened = store_in(&dir);
        assert_eq!(reopened.get("AA:BB:CC:11:22:33.lastseen"), Some(seen));
        assert_eq!(reopened.get("missing"), None);
    }

    #[test]
    fn test_corrupt_file_falls_back_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(STORE_FILE);
        std::fs::write(&path, "{not json").unwrap();

        let store = LastSeenStore::open(path);
        assert_eq!(store.get("anything"), None);
    }

    #[test]
    fn test_save_and_restore_devices() {
        let dir = tempfile::tempdir().unwrap();
        let seen = Utc::now();

        let mut devices = normalize(&[
            RawDevice {
                mac_address: Some("AA:BB:CC:11:22:33".to_string()),
                ..RawDevice::default()
            },
            RawDevice {
                ip_address: Some("192.168.1.40".to_string()),
                ..RawDevice::default()
            },
        ]);
        devices[0].last_seen = Some(seen);

        let mut store = store_in(&dir);
        store.save_devices(&devices).unwrap();

        let mut restored = normalize(&[
            RawDevice {
                mac_address: Some("AA:BB:CC:11:22:33".to_string()),
                ..RawDevice::default()
            },
            RawDevice {
                ip_address: Some("192.168.1.40".to_string()),
                ..RawDevice::default()
            },
        ]);
        store_in(&dir).restore_devices(&mut restored);

        assert_eq!(restored[0].last_seen, Some(seen));
        // Never sighted, nothing stored.
        assert_eq!(restored[1].last_seen, None);
    }

    #[test]
    fn test_restore_keeps_fresher_in_memory_sighting() {
        let dir = tempfile::tempdir().unwrap();
        let stored = Utc::now();

        let mut store = store_in(&dir);
        store.set("AA:BB:CC:11:22:33.lastseen", stored);

        let fresher = stored + chrono::Duration::seconds(30);
        let mut devices = normalize(&[RawDevice {
            mac_address: Some("AA:BB:CC:11:22:33".to_string()),
            ..RawDevice::default()
        }]);
        devices[0].last_seen = Some(fresher);

        store.restore_devices(&mut devices);
        assert_eq!(devices[0].last_seen, Some(fresher));
    }
}
