//! Opening the approval UI
//!
//! The keeper only names a route; a surface decides what "open" means
//! (spawn a browser window, notify a tray app, or just log).

use std::sync::Mutex;
use tokio::process::Command;

pub const UNLOCK_PATH: &str = "/unlock";

pub fn fee_path(chain_id: &str, nonce: &str) -> String {
    format!("/fee/{}?hash={}", chain_id, nonce)
}

pub fn sign_path(id: &str) -> String {
    format!("/sign/{}", id)
}

/// Whether `s` can sit in a route without changing where it points.
pub fn is_route_segment(s: &str) -> bool {
    !s.is_empty()
        && s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

pub trait ApprovalSurface: Send + Sync {
    /// Fire-and-forget. Must not block on the user.
    fn open(&self, path: &str);
}

/// Only logs the route. For headless runs where the UI polls instead.
#[derive(Debug, Default)]
pub struct LogSurface;

impl ApprovalSurface for LogSurface {
    fn open(&self, path: &str) {
        log::info!("Approval needed at {}", path);
    }
}

/// Runs `program [args..] <base_url><path>` for every open.
#[derive(Debug, Clone)]
pub struct CommandSurface {
    program: String,
    args: Vec<String>,
    base_url: String,
}

impl CommandSurface {
    pub fn new(command: &[String], base_url: impl Into<String>) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
            base_url: base_url.into(),
        })
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl ApprovalSurface for CommandSurface {
    fn open(&self, path: &str) {
        let url = self.url_for(path);
        log::debug!("Opening approval surface: {} {}", self.program, url);

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                log::error!("Cannot open {} outside the runtime: {}", url, e);
                return;
            }
        };

        match Command::new(&self.program).args(&self.args).arg(&url).spawn() {
            Ok(mut child) => {
                let program = self.program.clone();
                // Reap in the background
                runtime.spawn(async move {
                    match child.wait().await {
                        Ok(status) if !status.success() => {
                            log::warn!("Approval surface {} exited with {}", program, status)
                        }
                        Ok(_) => {}
                        Err(e) => log::warn!("Approval surface {} failed: {}", program, e),
                    }
                });
            }
            Err(e) => log::error!("Failed to start {}: {}", self.program, e),
        }
    }
}

/// Remembers every route it was asked to open.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    opened: Mutex<Vec<String>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl ApprovalSurface for RecordingSurface {
    fn open(&self, path: &str) {
        self.opened
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(path.to_string());
    }
}
