// synkd: playback-fleet discovery, liveness and content-resync daemon.

mod config;
mod context;
mod discovery;
mod identity;
mod playlist;
mod publish;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context as _;
use tokio::net::{TcpListener, UdpSocket};
use tokio::sync::{watch, Mutex};
use tracing::{info, warn};

use crate::context::Context;
use crate::publish::Publisher;
use synk_core::PeerTable;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> anyhow::Result<()> {
    for arg in std::env::args().skip(1) {
        if arg == "--version" || arg == "-V" {
            println!("synkd {}", VERSION);
            return Ok(());
        }
    }

    let cfg = config::load()?;
    init_logging(&cfg);

    let identity = identity::resolve(&cfg)?;
    let playlist = playlist::load(&cfg.playlist_path)?;
    info!(
        hostname = %identity.hostname,
        address = %identity.address,
        entries = playlist.len(),
        "starting synkd {}",
        VERSION
    );

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(cfg, identity, playlist))
}

fn init_logging(cfg: &config::Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_env("SYNKD_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cfg.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(
    cfg: config::Config,
    identity: identity::NodeIdentity,
    playlist: synk_core::Playlist,
) -> anyhow::Result<()> {
    // Discovery and publish endpoints are required resources: failure to bind
    // either means this node cannot participate, so startup fails outright.
    let socket = UdpSocket::bind(("0.0.0.0", cfg.discovery_port))
        .await
        .with_context(|| format!("binding discovery port {}", cfg.discovery_port))?;
    socket
        .set_broadcast(true)
        .context("enabling broadcast on discovery socket")?;
    let broadcast_dest: SocketAddr = format!("{}:{}", cfg.broadcast_addr, cfg.discovery_port)
        .parse()
        .with_context(|| format!("broadcast address {:?}", cfg.broadcast_addr))?;
    let subscriber_listener = TcpListener::bind((cfg.publish_bind.as_str(), cfg.publish_port))
        .await
        .with_context(|| {
            format!(
                "binding publish channel {}:{}",
                cfg.publish_bind, cfg.publish_port
            )
        })?;

    let ctx = Arc::new(Context {
        cfg,
        identity,
        playlist,
        table: Mutex::new(PeerTable::new()),
        publisher: Publisher::new(),
        socket,
        broadcast_dest,
    });

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(err) = shutdown_signal().await {
            warn!(%err, "shutdown signal handler failed");
        }
        info!("shutting down");
        let _ = shutdown_tx.send(true);
    });

    tokio::try_join!(
        discovery::listen(ctx.clone(), shutdown_rx.clone()),
        discovery::heartbeat(ctx.clone(), shutdown_rx.clone()),
        discovery::reap(ctx.clone(), shutdown_rx.clone()),
        publish::publish_nodes(ctx.clone(), shutdown_rx.clone()),
        publish::serve(ctx.clone(), subscriber_listener, shutdown_rx),
    )?;
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM (Unix).
async fn shutdown_signal() -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).context("installing SIGTERM handler")?;
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.context("waiting for Ctrl+C")?;
    }
    Ok(())
}
