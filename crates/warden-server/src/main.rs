//! Warden Server: keyring keeper daemon
//!
//! Holds one encrypted keyring and serves origin-checked, approval-gated
//! requests to local clients over newline-delimited JSON.
//!
//! # Usage
//!
//! ```bash
//! warden-server --config /path/to/warden.toml
//! warden-server --validate   # Validate config and exit
//! ```

mod config;
mod daemon;

use anyhow::{Context, Result};
use std::path::PathBuf;

fn main() -> Result<()> {
    // Unlocked key material must never reach a core file
    warden_core::memory::disable_core_dumps();

    let args: Vec<String> = std::env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut validate_only = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                i += 1;
                if i < args.len() {
                    config_path = Some(PathBuf::from(&args[i]));
                } else {
                    anyhow::bail!("--config requires a path argument");
                }
            }
            "--validate" => {
                validate_only = true;
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--version" | "-V" => {
                println!("warden-server {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            other => {
                anyhow::bail!("Unknown argument: {}", other);
            }
        }
        i += 1;
    }

    let mut server_config = match &config_path {
        Some(path) => config::ServerConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => config::ServerConfig::default(),
    };

    server_config.apply_env_overrides();

    server_config
        .validate()
        .context("Configuration validation failed")?;

    std::env::set_var("RUST_LOG", &server_config.server.log_level);
    env_logger::init();

    if validate_only {
        println!("Configuration is valid.");
        println!("  Listen:        {}", server_config.server.listen_addr);
        println!("  Keyring:       {}", server_config.keyring_path().display());
        println!("  Chains:        {}", server_config.keeper.chains.len());
        println!(
            "  Approval TTL:  {} secs",
            server_config.keeper.approvals.timeout_secs
        );
        println!(
            "  Sign mode:     {:?}",
            server_config.keeper.approvals.sign
        );
        println!(
            "  Surface:       {}",
            if server_config.surface.command.is_empty() {
                "log only".to_string()
            } else {
                server_config.surface.command.join(" ")
            }
        );
        return Ok(());
    }

    let rt = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;

    let shutdown = rt.block_on(async {
        tokio::select! {
            result = daemon::run(server_config) => result,
            _ = tokio::signal::ctrl_c() => {
                log::info!("Received shutdown signal. Exiting…");
                Ok(())
            }
        }
    });

    if let Err(e) = shutdown {
        log::error!("Server error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

fn print_help() {
    println!(
        r#"Warden Server: keyring keeper daemon

USAGE:
    warden-server [OPTIONS]

OPTIONS:
    -c, --config <PATH>   Config file path (defaults apply when omitted)
    --validate            Validate configuration and exit
    -h, --help            Show this help message
    -V, --version         Show version

ENVIRONMENT VARIABLES (override config file):
    WARDEN_DATA_DIR          Directory holding keyring.json
    WARDEN_LISTEN_ADDR       Loopback address to listen on
    WARDEN_LOG_LEVEL         Log level (error/warn/info/debug/trace)
    WARDEN_SURFACE_COMMAND   Command that opens the approval UI
    WARDEN_APPROVAL_TIMEOUT  Seconds before pending approvals expire (0 = never)

EXAMPLES:
    # Run with config file
    warden-server --config /etc/warden.toml

    # Validate configuration
    warden-server --config warden.toml --validate
"#
    );
}
