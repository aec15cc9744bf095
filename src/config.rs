use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::process::DEFAULT_CAPTURE_LIMIT;

/// Settings read from `$XDG_CONFIG_HOME/netman/config.toml`.
///
/// The file is optional and never written back.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_wifi_interface")]
    pub wifi_interface: String,

    #[serde(default = "default_capture_limit")]
    pub capture_limit: usize,

    #[serde(default = "default_scan_timeout")]
    pub scan_timeout_secs: u64,

    #[serde(default = "default_bluetooth_scan")]
    pub bluetooth_scan_secs: u64,

    #[serde(default)]
    pub log_file: Option<PathBuf>,

    #[serde(default)]
    pub tools: Tools,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Tools {
    #[serde(default = "default_iwctl")]
    pub iwctl: String,

    #[serde(default = "default_bluetoothctl")]
    pub bluetoothctl: String,

    #[serde(default = "default_rfkill")]
    pub rfkill: String,

    #[serde(default = "default_dialog")]
    pub dialog: String,
}

impl Default for Tools {
    fn default() -> Self {
        Self {
            iwctl: default_iwctl(),
            bluetoothctl: default_bluetoothctl(),
            rfkill: default_rfkill(),
            dialog: default_dialog(),
        }
    }
}

fn default_wifi_interface() -> String {
    "wlan0".to_string()
}

fn default_capture_limit() -> usize {
    DEFAULT_CAPTURE_LIMIT
}

fn default_scan_timeout() -> u64 {
    15
}

fn default_bluetooth_scan() -> u64 {
    10
}

fn default_iwctl() -> String {
    "iwctl".to_string()
}

fn default_bluetoothctl() -> String {
    "bluetoothctl".to_string()
}

fn default_rfkill() -> String {
    "rfkill".to_string()
}

fn default_dialog() -> String {
    "dialog".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wifi_interface: default_wifi_interface(),
            capture_limit: default_capture_limit(),
            scan_timeout_secs: default_scan_timeout(),
            bluetooth_scan_secs: default_bluetooth_scan(),
            log_file: None,
            tools: Tools::default(),
        }
    }
}

impl Config {
    pub fn new() -> Result<Self> {
        match dirs::config_dir() {
            Some(dir) => Self::load(&dir.join("netman").join("config.toml")),
            None => Ok(Self::default()),
        }
    }

    /// Reads `path`, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Can not read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        anyhow::ensure!(config.capture_limit > 0, "capture_limit must be at least 1");
        Ok(config)
    }

    pub fn scan_timeout(&self) -> Duration {
        Duration::from_secs(self.scan_timeout_secs)
    }

    /// bluetoothctl scans for a fixed window, the process gets a few
    /// seconds on top of it before it is killed.
    pub fn bluetooth_scan_timeout(&self) -> Duration {
        Duration::from_secs(self.bluetooth_scan_secs.saturating_add(5))
    }
}
