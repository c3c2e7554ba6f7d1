//! Peer table: last-heard bookkeeping and stale-entry eviction.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// One known peer. The peer's address string is the identity key; the
/// hostname is peer-reported and used only for display.
#[derive(Debug, Clone)]
pub struct PeerRecord {
    pub hostname: String,
    pub last_heard: Instant,
}

/// Mapping from peer address to last-seen metadata. The single shared-mutable
/// structure in the daemon; callers hold the lock only for the duration of a
/// single upsert, sweep, or snapshot copy.
#[derive(Debug, Default)]
pub struct PeerTable {
    peers: HashMap<String, PeerRecord>,
}

impl PeerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a heartbeat from `address`. Creates the entry on first contact,
    /// refreshes `hostname` and `last_heard` in place afterwards. Returns
    /// true when the peer is new.
    pub fn upsert(&mut self, address: &str, hostname: &str, now: Instant) -> bool {
        let is_new = !self.peers.contains_key(address);
        self.peers.insert(
            address.to_string(),
            PeerRecord {
                hostname: hostname.to_string(),
                last_heard: now,
            },
        );
        is_new
    }

    /// Evict every entry whose last heartbeat is older than `max_age`.
    /// Decisions are made over a snapshot of the keys, then applied, so the
    /// live map is never mutated mid-iteration. Returns the evicted entries
    /// so the caller can log them.
    pub fn sweep(&mut self, now: Instant, max_age: Duration) -> Vec<(String, PeerRecord)> {
        let stale: Vec<String> = self
            .peers
            .iter()
            .filter(|(_, rec)| now.duration_since(rec.last_heard) > max_age)
            .map(|(addr, _)| addr.clone())
            .collect();
        stale
            .into_iter()
            .filter_map(|addr| self.peers.remove(&addr).map(|rec| (addr, rec)))
            .collect()
    }

    /// Point-in-time copy of the table, sorted by address.
    pub fn snapshot(&self) -> Vec<(String, PeerRecord)> {
        let mut out: Vec<(String, PeerRecord)> = self
            .peers
            .iter()
            .map(|(addr, rec)| (addr.clone(), rec.clone()))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    /// Human-readable `hostname (address)` listing for the subscriber
    /// snapshot, sorted by address so successive listings are stable.
    pub fn listing(&self) -> String {
        let pairs: Vec<String> = self
            .snapshot()
            .into_iter()
            .map(|(addr, rec)| format!("{} ({})", rec.hostname, addr))
            .collect();
        pairs.join(", ")
    }

    pub fn get(&self, address: &str) -> Option<&PeerRecord> {
        self.peers.get(address)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_creates_then_refreshes() {
        let mut table = PeerTable::new();
        let t0 = Instant::now();
        assert!(table.upsert("10.0.0.5", "host-b", t0));
        let t1 = t0 + Duration::from_secs(3);
        assert!(!table.upsert("10.0.0.5", "host-b-renamed", t1));
        assert_eq!(table.len(), 1);
        let rec = table.get("10.0.0.5").unwrap();
        assert_eq!(rec.hostname, "host-b-renamed");
        assert_eq!(rec.last_heard, t1);
    }

    #[test]
    fn sweep_evicts_only_stale() {
        let mut table = PeerTable::new();
        let start = Instant::now();
        table.upsert("10.0.0.4", "host-a", start);
        table.upsert("10.0.0.5", "host-b", start + Duration::from_secs(20));
        // 5s heartbeat period, factor 5: anything older than 25s goes.
        let now = start + Duration::from_secs(30);
        let evicted = table.sweep(now, Duration::from_secs(25));
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].0, "10.0.0.4");
        assert_eq!(evicted[0].1.hostname, "host-a");
        assert!(table.get("10.0.0.4").is_none());
        assert!(table.get("10.0.0.5").is_some());
    }

    #[test]
    fn sweep_keeps_entry_exactly_at_deadline() {
        let mut table = PeerTable::new();
        let t0 = Instant::now();
        table.upsert("10.0.0.5", "host-b", t0);
        // Age equal to max_age is still inside the liveness window.
        let evicted = table.sweep(t0 + Duration::from_secs(25), Duration::from_secs(25));
        assert!(evicted.is_empty());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn refreshed_peer_survives_sweep() {
        let mut table = PeerTable::new();
        let t0 = Instant::now();
        table.upsert("10.0.0.5", "host-b", t0);
        table.upsert("10.0.0.5", "host-b", t0 + Duration::from_secs(40));
        let evicted = table.sweep(t0 + Duration::from_secs(50), Duration::from_secs(25));
        assert!(evicted.is_empty());
        assert!(table.get("10.0.0.5").is_some());
    }

    #[test]
    fn listing_is_sorted_by_address() {
        let mut table = PeerTable::new();
        let now = Instant::now();
        table.upsert("10.0.0.5", "host-b", now);
        table.upsert("10.0.0.4", "host-a", now);
        assert_eq!(table.listing(), "host-a (10.0.0.4), host-b (10.0.0.5)");
    }

    #[test]
    fn listing_empty_table() {
        assert_eq!(PeerTable::new().listing(), "");
    }
}
