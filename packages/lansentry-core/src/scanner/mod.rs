//! Network scanning.
//!
//! Two independent discovery mechanisms, both shelling out to system
//! tools:
//! - a link-layer sweep (`arp-scan`) enumerating hardware addresses on
//!   the local segment, and
//! - per-device reachability probes (system `ping`).
//!
//! Both degrade instead of failing the cycle: a broken sweep yields an
//! error the caller logs and treats as empty, a probe timeout is simply
//! "unreachable".

mod arp;
mod ping;

use std::process::Command;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use arp::{parse_sweep_output, sweep_link_layer};
pub use ping::probe_reachability;

/// Scanner errors. All of them are transient from the engine's point of
/// view; the reconcile loop carries on with an empty result.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("scan tool could not be run: {0}")]
    ToolUnavailable(String),

    #[error("arp-scan exited with status {status}: {stderr}")]
    SweepFailed { status: i32, stderr: String },

    #[error("scan task failed: {0}")]
    TaskFailed(String),
}

/// One row of a link-layer sweep: a hardware address and the network
/// address it answered from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepEntry {
    pub mac_address: String,
    pub ip_address: String,
}

/// One completed reachability probe, posted to the apply loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub ip_address: String,
    pub is_alive: bool,
}

/// Best-effort vendor name for a hardware address, from the IEEE OUI
/// registry. Useful for labeling devices we only know by their MAC.
pub fn vendor_for(mac_address: &str) -> Option<String> {
    let mut hex: String = mac_address
        .chars()
        .filter(|c| c.is_ascii_hexdigit())
        .collect::<String>()
        .to_uppercase();
    if hex.len() < 6 {
        return None;
    }
    hex.truncate(12);
    while hex.len() < 12 {
        hex.push('0');
    }

    let canonical = hex
        .as_bytes()
        .chunks(2)
        .map(|pair| String::from_utf8_lossy(pair).into_owned())
        .collect::<Vec<_>>()
        .join(":");

    oui_data::lookup(&canonical).map(|record| record.organization().to_string())
}

/// Create a Command that hides the console window on Windows.
pub(crate) fn hidden_command(program: &str) -> Command {
    #[allow(unused_mut)]
    let mut cmd = Command::new(program);
    #[cfg(target_os = "windows")]
    {
        use std::os::windows::process::CommandExt;
        const CREATE_NO_WINDOW: u32 = 0x08000000;
        cmd.creation_flags(CREATE_NO_WINDOW);
    }
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_for_rejects_short_input() {
        assert_eq!(vendor_for("AA:BB"), None);
        assert_eq!(vendor_for(""), None);
    }

    #[test]
    fn test_vendor_for_accepts_common_separators() {
        // Same OUI, three notations: all resolve to the same answer.
        let colon = vendor_for("00:50:56:12:34:56");
        let dash = vendor_for("00-50-56-12-34-56");
        let dotted = vendor_for("0050.5612.3456");
        assert_eq!(colon, dash);
        assert_eq!(colon, dotted);
    }
}
