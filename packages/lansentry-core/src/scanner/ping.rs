//! Reachability probes using the system ping command.

use super::hidden_command;

/// Probe a single network address for liveness.
///
/// One echo request with a two second deadline. Any failure, including a
/// missing ping binary or a timeout, reads as unreachable; probes carry
/// no error channel.
pub async fn probe_reachability(ip_address: &str) -> bool {
    let ip_owned = ip_address.to_string();

    let result = tokio::task::spawn_blocking(move || {
        #[cfg(target_os = "windows")]
        let output = hidden_command("ping")
            .args(["-n", "1", "-w", "2000", &ip_owned])
            .output();

        #[cfg(any(target_os = "linux", target_os = "macos"))]
        let output = hidden_command("ping")
            .args(["-c", "1", "-W", "2", &ip_owned])
            .output();

        #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
        let output: std::io::Result<std::process::Output> = Err(std::io::Error::other(
            "unsupported platform",
        ));

        match output {
            Ok(output) => {
                #[cfg(target_os = "windows")]
                {
                    // Windows ping exits 0 on "destination unreachable".
                    let stdout = String::from_utf8_lossy(&output.stdout).to_lowercase();
                    output.status.success()
                        && stdout.contains("reply from")
                        && !stdout.contains("destination host unreachable")
                }

                #[cfg(not(target_os = "windows"))]
                {
                    output.status.success()
                }
            }
            Err(e) => {
                tracing::debug!("probe of {ip_owned} could not run ping: {e}");
                false
            }
        }
    })
    .await;

    result.unwrap_or(false)
}
