//! Runtime configuration: TOML file loading with full defaults, plus the
//! command surface external integrations use to flip settings at runtime.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::registry::RawDevice;

/// Scan the entire local network segment (arp-scan's localnet flag).
pub const ENTIRE_LOCALNET: &str = "-l";

/// Module configuration, loaded once at startup. Mutable afterwards only
/// through [`apply_command`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Device registry seed.
    pub devices: Vec<RawDevice>,
    /// Scan target: a CIDR like `192.168.0.0/24`, or `-l` for the whole
    /// local network.
    pub network: String,
    pub show_ip: bool,
    pub show_unknown: bool,
    pub show_offline: bool,
    pub show_last_seen: bool,
    pub save_last_seen: bool,
    /// Seconds a device stays considered alive after its last sighting.
    pub keep_alive: i64,
    /// Seconds between scan cycles.
    pub update_interval: u64,
    pub sort: bool,
    /// Device names counted toward occupancy.
    pub residents: Vec<String>,
    /// Opaque descriptor forwarded verbatim when the home becomes occupied.
    pub occupied_cmd: Option<serde_json::Value>,
    /// Opaque descriptor forwarded verbatim when the home becomes vacant.
    pub vacant_cmd: Option<serde_json::Value>,
    pub colored: bool,
    pub colored_symbol_only: bool,
    pub colored_state: bool,
    pub show_last_seen_when_offline: bool,
    pub show_device_columns: bool,
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            devices: Vec::new(),
            network: ENTIRE_LOCALNET.to_string(),
            show_ip: true,
            show_unknown: true,
            show_offline: true,
            show_last_seen: false,
            save_last_seen: false,
            keep_alive: 180,
            update_interval: 20,
            sort: true,
            residents: Vec::new(),
            occupied_cmd: None,
            vacant_cmd: None,
            colored: false,
            colored_symbol_only: false,
            colored_state: false,
            show_last_seen_when_offline: false,
            show_device_columns: false,
            debug: false,
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from the default location when
    /// none is given. A missing default file yields pure defaults; an
    /// explicitly named file must exist. A file that fails to parse is an
    /// error: the registry seed lives here and silently dropping it would
    /// make every configured device vanish.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match default_config_path() {
                Some(p) => (p, false),
                None => return Ok(Config::default()),
            },
        };

        if !path.exists() {
            if required {
                anyhow::bail!("config file not found: {}", path.display());
            }
            tracing::debug!("no config file at {}, using defaults", path.display());
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;

        tracing::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Text snapshot of the runtime-adjustable settings.
    pub fn summary(&self) -> String {
        format!(
            "show_ip = {}\nshow_offline = {}\nupdate_interval = {}",
            self.show_ip, self.show_offline, self.update_interval
        )
    }
}

/// `~/.config/lansentry/config.toml` (platform equivalent).
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
        .map(|p| p.join("lansentry").join("config.toml"))
}

/// Check the scan target is something arp-scan will accept: the localnet
/// flag or a parseable CIDR block.
pub fn validate_network_spec(network: &str) -> bool {
    network == ENTIRE_LOCALNET || network.parse::<ipnetwork::IpNetwork>().is_ok()
}

/// Runtime command surface. A closed set: external integrations construct
/// a variant and the daemon dispatches it, no string-keyed registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ShowIp(bool),
    ShowOffline(bool),
    /// Negative values are rejected and leave the config untouched.
    SetUpdateInterval(i64),
    GetConfig,
}

impl Command {
    /// Parse a control line, e.g. `showip on`, `hideoffline`,
    /// `interval 60`, `config`.
    pub fn parse(line: &str) -> Option<Command> {
        let mut words = line.split_whitespace();
        let command = match (words.next()?, words.next()) {
            ("showip", None) => Command::ShowIp(true),
            ("hideip", None) => Command::ShowIp(false),
            ("showoffline", None) => Command::ShowOffline(true),
            ("hideoffline", None) => Command::ShowOffline(false),
            ("interval", Some(value)) => Command::SetUpdateInterval(value.parse().ok()?),
            ("config", None) => Command::GetConfig,
            _ => return None,
        };
        words.next().is_none().then_some(command)
    }
}

/// What a dispatched command produced: a reply for the integration that
/// sent it, and whether the daemon should scan immediately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub reply: String,
    pub rescan: bool,
}

/// Apply a command to the running configuration. Invalid input is a no-op
/// that keeps the prior configuration.
pub fn apply_command(config: &mut Config, command: &Command) -> CommandOutcome {
    match command {
        Command::ShowIp(show) => {
            config.show_ip = *show;
            CommandOutcome {
                reply: if *show { "Showing IPs" } else { "Hiding IPs" }.to_string(),
                rescan: true,
            }
        }
        Command::ShowOffline(show) => {
            config.show_offline = *show;
            CommandOutcome {
                reply: if *show {
                    "Showing offline devices"
                } else {
                    "Hiding offline devices"
                }
                .to_string(),
                rescan: true,
            }
        }
        Command::SetUpdateInterval(seconds) => {
            if *seconds < 0 {
                return CommandOutcome {
                    reply: format!(
                        "Ignoring invalid update interval {seconds}; keeping {}",
                        config.update_interval
                    ),
                    rescan: false,
                };
            }
            config.update_interval = *seconds as u64;
            CommandOutcome {
                reply: format!("Setting update interval to {seconds}"),
                rescan: true,
            }
        }
        Command::GetConfig => CommandOutcome {
            reply: config.summary(),
            rescan: false,
        },
    }
}
