//! Lansentry - LAN device presence watcher
//!
//! This binary watches the local network for configured devices:
//! - Sweep the segment for hardware addresses with arp-scan
//! - Probe configured IP addresses with ping
//! - Reconcile sightings into an online/offline device list
//! - Raise occupied/vacant events for configured residents

mod daemon;
mod render;

use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use lansentry_core::{
    config::{self, Config},
    presence::{self, PresenceState, ReconcileOptions},
    projection, registry, scanner,
    store::LastSeenStore,
};

#[derive(Parser)]
#[command(name = "lansentry")]
#[command(version)]
#[command(about = "LAN device presence watcher for headless Linux hosts")]
#[command(long_about = "
Lansentry tracks which devices are present on the local network by
sweeping for hardware addresses (arp-scan) and pinging configured IP
addresses, then classifies each configured device online or offline
against a keep-alive window.

Quick start:
  1. Describe your devices:  ~/.config/lansentry/config.toml
  2. Run a one-shot scan:    lansentry scan
  3. Start the watcher:      lansentry watch

arp-scan needs raw socket privileges; run via sudo or grant the binary
CAP_NET_RAW. For systemd integration run 'lansentry watch' as a service.
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for scripting
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a single scan cycle and print the device table
    Scan,

    /// Watch the network on a fixed interval
    Watch {
        /// Seconds between scan cycles (overrides the config file)
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Show configuration paths and settings
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    // Initialize logging
    let log_level = if cli.verbose || config.debug {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("lansentry={log_level},lansentry_core={log_level}").into()
            }),
        )
        .with_target(false)
        .init();

    if !config::validate_network_spec(&config.network) {
        tracing::warn!(
            "network spec '{}' is not a CIDR block or '-l'; arp-scan may reject it",
            config.network
        );
    }

    match cli.command {
        Commands::Scan => cmd_scan(&cli, config).await,
        Commands::Watch { interval } => {
            let mut config = config;
            if let Some(interval) = interval {
                config.update_interval = interval;
            }
            daemon::run_watch(config).await
        }
        Commands::Config => cmd_config(&cli, &config),
    }
}

/// One-shot cycle: sweep, probe every configured address, reconcile, print.
async fn cmd_scan(cli: &Cli, config: Config) -> Result<()> {
    let registry = registry::normalize(&config.devices);

    let mut state = PresenceState::new(&registry);
    let store = if config.save_last_seen {
        let store = LastSeenStore::open_default()?;
        store.restore_devices(&mut state.devices);
        Some(store)
    } else {
        None
    };

    let sweep = match scanner::sweep_link_layer(&config.network).await {
        Ok(sweep) => sweep,
        Err(e) => {
            tracing::warn!("link-layer sweep failed: {e}");
            Vec::new()
        }
    };

    // Probe all configured addresses concurrently.
    let probes = futures::future::join_all(
        registry
            .iter()
            .filter_map(|d| d.ip_address.clone())
            .map(|ip| async move {
                let is_alive = scanner::probe_reachability(&ip).await;
                scanner::ProbeOutcome {
                    ip_address: ip,
                    is_alive,
                }
            }),
    )
    .await;

    let now = Utc::now();
    let options = ReconcileOptions {
        show_offline: config.show_offline,
        show_unknown: config.show_unknown,
        sort: config.sort,
        keep_alive_secs: config.keep_alive,
    };
    let mut devices = presence::reconcile(&state.devices, &sweep, &registry, &options, now);
    for probe in &probes {
        presence::apply_probe_result(
            &mut devices,
            &probe.ip_address,
            probe.is_alive,
            now,
            config.keep_alive,
        );
    }

    if let Some(mut store) = store {
        if let Err(e) = store.save_devices(&devices) {
            tracing::warn!("failed to persist last-seen data: {e}");
        }
    }

    let view = projection::project(&devices, &config, now);
    match cli.format {
        OutputFormat::Text => {
            let online = devices.iter().filter(|d| d.online).count();
            println!("{} devices, {} online", devices.len(), online);
            println!();
            render::print_view(&view);
        }
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "devices": devices,
                    "view": view,
                })
            );
        }
    }

    Ok(())
}

fn cmd_config(cli: &Cli, config: &Config) -> Result<()> {
    let config_path = cli
        .config
        .clone()
        .or_else(config::default_config_path)
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "-".to_string());
    let store_path = LastSeenStore::open_default()
        .map(|s| s.path().display().to_string())
        .unwrap_or_else(|_| "-".to_string());

    match cli.format {
        OutputFormat::Text => {
            println!("Configuration");
            println!("=============");
            println!();
            println!("Config file:     {config_path}");
            println!("Last-seen store: {store_path}");
            println!("Network spec:    {}", config.network);
            println!("Devices:         {}", config.devices.len());
            println!("Residents:       {}", config.residents.join(", "));
            println!();
            println!("{}", config.summary());
            println!();
            println!("Example config.toml:");
            println!();
            println!("{EXAMPLE_CONFIG}");
        }
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "config_file": config_path,
                    "store_file": store_path,
                    "network": config.network,
                    "device_count": config.devices.len(),
                    "residents": config.residents,
                    "show_ip": config.show_ip,
                    "show_offline": config.show_offline,
                    "update_interval": config.update_interval,
                    "keep_alive": config.keep_alive,
                })
            );
        }
    }

    Ok(())
}

const EXAMPLE_CONFIG: &str = r#"network = "192.168.1.0/24"
update_interval = 20
keep_alive = 180
residents = ["Phone"]

[[devices]]
mac_address = "aa:bb:cc:11:22:33"
name = "Phone"
icon = "mobile"

[[devices]]
ip_address = "192.168.1.40"
name = "Printer"
show_offline = false"#;
