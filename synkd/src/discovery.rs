//! Discovery: receive heartbeats and sync events, announce ourselves, evict
//! peers that stop announcing.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context as _;
use rand::Rng;
use synk_core::{Message, ResyncScheduler, MAX_DATAGRAM};
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

use crate::context::Context;

/// DiscoveryListener: accept datagrams from any source on the shared socket.
/// Heartbeats update the peer table; sync events are relayed unchanged to the
/// publish channel; everything else is discarded. A socket error is fatal, a
/// node that cannot hear the fleet cannot participate.
pub async fn listen(ctx: Arc<Context>, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
    let mut buf = vec![0u8; MAX_DATAGRAM];
    loop {
        let (n, from) = tokio::select! {
            res = ctx.socket.recv_from(&mut buf) => res.context("discovery socket receive")?,
            _ = shutdown.changed() => return Ok(()),
        };
        match Message::decode(&buf[..n]) {
            Ok(Message::Heartbeat { hostname, address }) => {
                let is_new = ctx
                    .table
                    .lock()
                    .await
                    .upsert(&address, &hostname, Instant::now());
                if is_new {
                    info!("found {} ({})", hostname, address);
                }
            }
            Ok(Message::Sync { file }) => {
                debug!(%file, "relaying sync event");
                ctx.publisher.publish(&Message::Sync { file }.encode());
            }
            Err(err) => trace!(%from, %err, "ignoring datagram"),
        }
    }
}

/// HeartbeatBroadcaster: every heartbeat period, consult the resync scheduler
/// first (a due sync event goes out ahead of the heartbeat), then announce
/// this node to the broadcast domain. A failed send is logged and the loop
/// continues; the next heartbeat is the retry.
pub async fn heartbeat(
    ctx: Arc<Context>,
    shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let scheduler = ResyncScheduler::from_entropy(
        ctx.resync_base_interval(),
        ctx.resync_jitter_max(),
        Instant::now(),
    );
    heartbeat_with(ctx, scheduler, shutdown).await
}

pub(crate) async fn heartbeat_with<R: Rng + Send>(
    ctx: Arc<Context>,
    mut scheduler: ResyncScheduler<R>,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let announce = Message::Heartbeat {
        hostname: ctx.identity.hostname.clone(),
        address: ctx.identity.address.clone(),
    }
    .encode();
    let mut ticker = tokio::time::interval(ctx.heartbeat_period());
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => return Ok(()),
        }
        match scheduler.poll(Instant::now(), &ctx.playlist) {
            Ok(Some(entry)) => {
                let event = Message::Sync {
                    file: entry.file.clone(),
                }
                .encode();
                info!(file = %entry.file, "originating resync");
                // Local player first, then the fleet.
                ctx.publisher.publish(&event);
                if let Err(err) = ctx.socket.send_to(event.as_bytes(), ctx.broadcast_dest).await {
                    warn!(%err, "sync broadcast failed");
                }
            }
            Ok(None) => {}
            Err(err) => return Err(err).context("originating resync"),
        }
        if let Err(err) = ctx
            .socket
            .send_to(announce.as_bytes(), ctx.broadcast_dest)
            .await
        {
            warn!(%err, "heartbeat send failed");
        }
    }
}

/// StaleEntryReaper: sweep the peer table every cleanup period, evicting
/// anything past the liveness window.
pub async fn reap(ctx: Arc<Context>, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
    let max_age = ctx.liveness_window();
    let mut ticker = tokio::time::interval(ctx.cleanup_period());
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => return Ok(()),
        }
        let evicted = ctx.table.lock().await.sweep(Instant::now(), max_age);
        for (address, record) in evicted {
            info!("lost {} ({})", record.hostname, address);
        }
    }
}
