//! Lansentry core library.
//!
//! Tracks presence of known and unknown devices on the local network:
//! - Link-layer sweeps (arp-scan) and reachability probes (ping)
//! - Presence reconciliation with a keep-alive staleness policy
//! - Resident occupancy transitions
//! - Display projection and last-seen persistence
//!
//! # Example
//!
//! ```no_run
//! use lansentry_core::{config::Config, presence, registry, scanner};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(None)?;
//!     let registry = registry::normalize(&config.devices);
//!
//!     let sweep = scanner::sweep_link_layer(&config.network).await?;
//!     let options = presence::ReconcileOptions {
//!         show_offline: config.show_offline,
//!         show_unknown: config.show_unknown,
//!         sort: config.sort,
//!         keep_alive_secs: config.keep_alive,
//!     };
//!     let state = presence::reconcile(&[], &sweep, &registry, &options, chrono::Utc::now());
//!     println!("{} devices visible", state.iter().filter(|d| d.online).count());
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod occupancy;
pub mod presence;
pub mod projection;
pub mod registry;
pub mod scanner;
pub mod store;

// Re-export commonly used types
pub use config::{Command, CommandOutcome, Config};
pub use occupancy::{OccupancyOutcome, OccupancyTransition};
pub use presence::{PresenceState, ReconcileOptions};
pub use projection::{ProjectedDevice, ProjectedView};
pub use registry::{Device, DeviceKind, RawDevice};
pub use scanner::{ProbeOutcome, ScanError, SweepEntry};
pub use store::LastSeenStore;
