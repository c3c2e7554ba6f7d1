//! Local subscriber channel: fan published messages out to the co-located
//! player over TCP, one newline-terminated message per line.

use std::sync::Arc;

use anyhow::Context as _;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, watch};
use tracing::{debug, warn};

use crate::context::Context;

/// Buffered messages per subscriber before a slow reader starts losing them.
const PUBLISH_BACKLOG: usize = 64;

/// Handle for writing to the publish channel. Cloneable and safe to use from
/// any loop; each `publish` is delivered as one whole message, never
/// interleaved with another.
#[derive(Clone)]
pub struct Publisher {
    tx: broadcast::Sender<String>,
}

impl Publisher {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(PUBLISH_BACKLOG);
        Self { tx }
    }

    /// Send to all current subscribers. With no subscriber connected the
    /// message is dropped; the channel carries periodic state, not history.
    pub fn publish(&self, msg: &str) {
        let _ = self.tx.send(msg.to_string());
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }
}

impl Default for Publisher {
    fn default() -> Self {
        Self::new()
    }
}

/// Accept subscriber connections and forward published messages to each.
/// Accept errors are fatal; the publish channel is how the player sees the
/// fleet, so a node that cannot serve it cannot meaningfully run.
pub async fn serve(
    ctx: Arc<Context>,
    listener: TcpListener,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    loop {
        let (stream, peer) = tokio::select! {
            res = listener.accept() => res.context("publish channel accept")?,
            _ = shutdown.changed() => return Ok(()),
        };
        debug!(%peer, "subscriber connected");
        let rx = ctx.publisher.subscribe();
        tokio::spawn(forward(stream, rx, shutdown.clone()));
    }
}

async fn forward(
    mut stream: TcpStream,
    mut rx: broadcast::Receiver<String>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            msg = rx.recv() => match msg {
                Ok(msg) => {
                    let line = format!("{}\n", msg);
                    if stream.write_all(line.as_bytes()).await.is_err() {
                        return;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "slow subscriber, dropping messages");
                }
                Err(broadcast::error::RecvError::Closed) => return,
            },
            _ = shutdown.changed() => return,
        }
    }
}

/// ClusterStatePublisher: periodically republish a read snapshot of the peer
/// table as a `nodes:` message.
pub async fn publish_nodes(
    ctx: Arc<Context>,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let mut ticker = tokio::time::interval(ctx.publish_period());
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => return Ok(()),
        }
        let listing = ctx.table.lock().await.listing();
        debug!(%listing, "publishing nodes snapshot");
        ctx.publisher.publish(&format!("nodes: {}", listing));
    }
}
