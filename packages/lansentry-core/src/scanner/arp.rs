//! Link-layer sweep via the arp-scan command line tool.

use super::{ScanError, SweepEntry, hidden_command};

/// Sweep the local segment for hardware addresses.
///
/// Runs `arp-scan -q <network>`, where `network` is a CIDR block or `-l`
/// for the whole localnet. Requires the tool to be installed and allowed
/// to open raw sockets (setuid, CAP_NET_RAW, or sudo). Any failure is an
/// error for the caller to log; the reconcile cycle treats it as "nothing
/// visible right now".
pub async fn sweep_link_layer(network: &str) -> Result<Vec<SweepEntry>, ScanError> {
    let network = network.to_string();
    tokio::task::spawn_blocking(move || run_arp_scan(&network))
        .await
        .map_err(|e| ScanError::TaskFailed(e.to_string()))?
}

fn run_arp_scan(network: &str) -> Result<Vec<SweepEntry>, ScanError> {
    let output = hidden_command("arp-scan")
        .args(["-q", network])
        .output()
        .map_err(|e| ScanError::ToolUnavailable(format!("arp-scan: {e}")))?;

    if !output.status.success() {
        return Err(ScanError::SweepFailed {
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(parse_sweep_output(&String::from_utf8_lossy(&output.stdout)))
}

/// Parse arp-scan's result table.
///
/// The first two lines are the interface banner; result rows are
/// tab-separated with the IP in the first cell and the MAC in the second.
/// Hardware addresses are canonicalized to uppercase here; deduplication
/// is the reconcile engine's job.
pub fn parse_sweep_output(output: &str) -> Vec<SweepEntry> {
    let mut entries = Vec::new();

    for row in output.lines().skip(2) {
        let cells: Vec<&str> = row.split('\t').filter(|c| !c.is_empty()).collect();
        let (Some(ip), Some(mac)) = (cells.first(), cells.get(1)) else {
            continue;
        };
        if ip.parse::<std::net::IpAddr>().is_err() {
            continue;
        }
        if mac.len() != 17 || !mac.contains(':') {
            continue;
        }

        entries.push(SweepEntry {
            mac_address: mac.to_uppercase(),
            ip_address: ip.to_string(),
        });
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Interface: eth0, type: EN10MB, MAC: b8:27:eb:11:22:33, IPv4: 192.168.1.2
Starting arp-scan 1.9.7 with 256 hosts (https://github.com/royhills/arp-scan)
192.168.1.1\t9c:c7:a6:aa:bb:01\tAVM Audiovisuelles Marketing
192.168.1.5\taa:bb:cc:11:22:33\t(Unknown)
192.168.1.9\tff:ff:ff:00:00:01\t(Unknown)
";

    #[test]
    fn test_parse_sweep_output() {
        let entries = parse_sweep_output(SAMPLE);

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].ip_address, "192.168.1.1");
        assert_eq!(entries[0].mac_address, "9C:C7:A6:AA:BB:01");
        assert_eq!(entries[1].mac_address, "AA:BB:CC:11:22:33");
    }

    #[test]
    fn test_parse_skips_banner_and_junk_rows() {
        let output = "\
Interface: eth0, type: EN10MB, MAC: b8:27:eb:11:22:33, IPv4: 192.168.1.2
Starting arp-scan 1.9.7 with 256 hosts (https://github.com/royhills/arp-scan)
not-an-ip\taa:bb:cc:11:22:33
192.168.1.7\tnot-a-mac
192.168.1.8\taa:bb:cc:11:22:44\tVendor Inc

3 packets received by filter, 0 packets dropped by kernel
";
        let entries = parse_sweep_output(output);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].ip_address, "192.168.1.8");
    }

    #[test]
    fn test_parse_empty_output() {
        assert!(parse_sweep_output("").is_empty());
    }
}
