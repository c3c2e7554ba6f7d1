//! Shared daemon context: built once at startup, passed by `Arc` to every loop.

use std::net::SocketAddr;
use std::time::Duration;

use synk_core::{PeerTable, Playlist};
use tokio::net::UdpSocket;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::identity::NodeIdentity;
use crate::publish::Publisher;

/// Everything the five loops share. The peer table is the only mutable piece;
/// its lock is held for single table operations, never across I/O. The UDP
/// socket carries both inbound datagrams and outbound broadcasts.
pub struct Context {
    pub cfg: Config,
    pub identity: NodeIdentity,
    pub playlist: Playlist,
    pub table: Mutex<PeerTable>,
    pub publisher: Publisher,
    pub socket: UdpSocket,
    pub broadcast_dest: SocketAddr,
}

impl Context {
    pub fn heartbeat_period(&self) -> Duration {
        Duration::from_secs(self.cfg.heartbeat_period_s)
    }

    pub fn cleanup_period(&self) -> Duration {
        Duration::from_secs(self.cfg.cleanup_period_s)
    }

    pub fn publish_period(&self) -> Duration {
        Duration::from_secs(self.cfg.publish_period_s)
    }

    pub fn resync_base_interval(&self) -> Duration {
        Duration::from_secs(self.cfg.resync_base_interval_s)
    }

    pub fn resync_jitter_max(&self) -> Duration {
        Duration::from_secs(self.cfg.resync_jitter_max_s)
    }

    /// Max allowed age of a peer's last heartbeat before eviction.
    pub fn liveness_window(&self) -> Duration {
        self.heartbeat_period() * self.cfg.eviction_factor
    }
}
