//! Server configuration: TOML file, then environment overrides.
//!
//! Priority: environment variables > config file > defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use warden_keeper::KeeperConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSection,

    /// How the approval UI gets opened
    #[serde(default)]
    pub surface: SurfaceSection,

    #[serde(default)]
    pub keeper: KeeperConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    /// Where `keyring.json` lives
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Newline-delimited JSON endpoint
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            listen_addr: default_listen_addr(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SurfaceSection {
    /// Program plus leading arguments; the approval URL is appended.
    /// Empty means routes are only logged.
    #[serde(default)]
    pub command: Vec<String>,

    /// Prefix joined to routes such as `/unlock`
    #[serde(default)]
    pub base_url: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("/data")
}

fn default_listen_addr() -> String {
    "127.0.0.1:7447".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ServerConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: ServerConfig =
            toml::from_str(&contents).with_context(|| "Failed to parse TOML config")?;
        Ok(config)
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `WARDEN_DATA_DIR`
    /// - `WARDEN_LISTEN_ADDR`
    /// - `WARDEN_LOG_LEVEL`
    /// - `WARDEN_SURFACE_COMMAND` (whitespace separated)
    /// - `WARDEN_APPROVAL_TIMEOUT` (seconds, 0 disables)
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("WARDEN_DATA_DIR") {
            self.server.data_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("WARDEN_LISTEN_ADDR") {
            self.server.listen_addr = v;
        }
        if let Ok(v) = std::env::var("WARDEN_LOG_LEVEL") {
            self.server.log_level = v;
        }
        if let Ok(v) = std::env::var("WARDEN_SURFACE_COMMAND") {
            self.surface.command = v.split_whitespace().map(str::to_string).collect();
        }
        if let Ok(v) = std::env::var("WARDEN_APPROVAL_TIMEOUT") {
            if let Ok(secs) = v.parse::<u64>() {
                self.keeper.approvals.timeout_secs = secs;
            }
        }
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.server
            .listen_addr
            .parse()
            .with_context(|| format!("Invalid listen_addr: {}", self.server.listen_addr))
    }

    pub fn keyring_path(&self) -> PathBuf {
        self.server.data_dir.join("keyring.json")
    }

    pub fn validate(&self) -> Result<()> {
        let addr = self.listen_addr()?;

        // Origins are self-declared by clients, so only local peers may connect
        anyhow::ensure!(
            addr.ip().is_loopback(),
            "server.listen_addr must be a loopback address, got {}",
            addr
        );

        anyhow::ensure!(
            !self.server.data_dir.as_os_str().is_empty(),
            "server.data_dir must not be empty"
        );

        self.keeper.validate()?;

        Ok(())
    }
}
