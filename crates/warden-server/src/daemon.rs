//! The daemon: one keeper, served as newline-delimited JSON over TCP.
//!
//! Each line is an envelope; each reply is one line carrying the envelope's
//! `seq`. Requests on one connection run concurrently, since a sign request
//! may wait on the user while the UI's approve arrives on another line.

use crate::config::ServerConfig;
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use warden_core::FileKeyStore;
use warden_keeper::{ApprovalSurface, CommandSurface, KeyRingKeeper, LogSurface, Router};

/// Run until the listener fails. Shutdown comes from the caller dropping this future.
pub async fn run(config: ServerConfig) -> Result<()> {
    log::info!("Warden server starting…");
    log::info!("  Listen:     {}", config.server.listen_addr);
    log::info!("  Data dir:   {}", config.server.data_dir.display());
    log::info!("  Chains:     {}", config.keeper.chains.len());
    match config.keeper.approval_timeout() {
        Some(timeout) => log::info!("  Expiry:     {} seconds", timeout.as_secs()),
        None => log::info!("  Expiry:     never"),
    }

    std::fs::create_dir_all(&config.server.data_dir).with_context(|| {
        format!(
            "Failed to create data dir: {}",
            config.server.data_dir.display()
        )
    })?;

    let router = build_router(&config);
    match router.keeper().restore() {
        Ok(state) => log::info!("Keyring is {}", state),
        Err(e) => log::error!("Failed to restore keyring: {}", e),
    }

    let addr = config.listen_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    log::info!("Listening on {}", addr);

    serve(listener, router).await
}

fn build_router(config: &ServerConfig) -> Router {
    let store = Arc::new(FileKeyStore::new(config.keyring_path()));

    let surface: Arc<dyn ApprovalSurface> =
        match CommandSurface::new(&config.surface.command, config.surface.base_url.clone()) {
            Some(surface) => Arc::new(surface),
            None => {
                log::warn!("No surface command configured; approval routes will only be logged");
                Arc::new(LogSurface)
            }
        };

    let keeper = KeyRingKeeper::from_config(&config.keeper, store, surface);
    Router::new(Arc::new(keeper))
}

/// Accept connections forever.
pub async fn serve(listener: TcpListener, router: Router) -> Result<()> {
    loop {
        let (stream, peer) = listener.accept().await.context("Accept failed")?;
        log::debug!("Connection from {}", peer);

        let router = router.clone();
        tokio::spawn(async move {
            if let Err(e) = serve_connection(stream, peer, router).await {
                log::warn!("Connection {} ended with error: {:#}", peer, e);
            }
        });
    }
}

async fn serve_connection(stream: TcpStream, peer: SocketAddr, router: Router) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let writer_task = tokio::spawn(async move {
        while let Some(reply) = rx.recv().await {
            writer.write_all(reply.as_bytes()).await?;
            writer.write_all(b"\n").await?;
        }
        writer.shutdown().await
    });

    let mut lines = BufReader::new(reader).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let router = router.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let reply = router.handle_json(&line).await;
            // Peer may be gone by the time an approval resolves
            let _ = tx.send(reply);
        });
    }

    log::debug!("Connection from {} closed", peer);
    drop(tx);
    writer_task
        .await
        .context("Writer task panicked")?
        .context("Failed to write reply")?;
    Ok(())
}
