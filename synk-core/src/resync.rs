//! Resync scheduling: jittered timer deciding when this node originates a sync event.
//!
//! Fleet members are not time-synchronized and do not negotiate who syncs.
//! Each node independently rolls `base_interval + jitter`; whichever timer
//! fires first emits the event and every listener converges on its file
//! reference. Fresh jitter is drawn on every firing so independently-running
//! nodes do not settle into synchronized firing.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::playlist::{EmptyPlaylist, Playlist, PlaylistEntry};

/// Per-node resync timer. The random source is owned by the scheduler so a
/// test can seed it and replay decisions deterministically.
pub struct ResyncScheduler<R: Rng> {
    base_interval: Duration,
    jitter_max: Duration,
    last_sync_time: Instant,
    next_delay: Duration,
    rng: R,
}

impl ResyncScheduler<StdRng> {
    /// Production constructor: entropy-seeded random source.
    pub fn from_entropy(base_interval: Duration, jitter_max: Duration, now: Instant) -> Self {
        Self::new(base_interval, jitter_max, now, StdRng::from_entropy())
    }
}

impl<R: Rng> ResyncScheduler<R> {
    pub fn new(base_interval: Duration, jitter_max: Duration, now: Instant, mut rng: R) -> Self {
        let next_delay = draw_jitter(&mut rng, jitter_max);
        Self {
            base_interval,
            jitter_max,
            last_sync_time: now,
            next_delay,
            rng,
        }
    }

    /// Called once per heartbeat cycle. When due, records the firing, redraws
    /// the jitter (exactly once per firing) and picks the playlist entry to
    /// announce; otherwise does nothing this cycle. An empty playlist at the
    /// moment of firing is a configuration error.
    pub fn poll<'p>(
        &mut self,
        now: Instant,
        playlist: &'p Playlist,
    ) -> Result<Option<&'p PlaylistEntry>, EmptyPlaylist> {
        let elapsed = now.duration_since(self.last_sync_time);
        if elapsed < self.base_interval + self.next_delay {
            return Ok(None);
        }
        if playlist.is_empty() {
            return Err(EmptyPlaylist);
        }
        self.last_sync_time = now;
        self.next_delay = draw_jitter(&mut self.rng, self.jitter_max);
        let entry = playlist.choose(&mut self.rng)?;
        Ok(Some(entry))
    }

    pub fn last_sync_time(&self) -> Instant {
        self.last_sync_time
    }

    pub fn next_delay(&self) -> Duration {
        self.next_delay
    }
}

/// Uniform draw from `[0, jitter_max]`, millisecond resolution.
fn draw_jitter<R: Rng>(rng: &mut R, jitter_max: Duration) -> Duration {
    Duration::from_millis(rng.gen_range(0..=jitter_max.as_millis() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playlist::PlaylistEntry;

    const BASE: Duration = Duration::from_secs(300);
    const JITTER: Duration = Duration::from_secs(60);

    fn playlist(files: &[&str]) -> Playlist {
        Playlist::new(
            files
                .iter()
                .map(|f| PlaylistEntry {
                    file: f.to_string(),
                    title: None,
                })
                .collect(),
        )
    }

    fn scheduler(seed: u64, now: Instant) -> ResyncScheduler<StdRng> {
        ResyncScheduler::new(BASE, JITTER, now, StdRng::seed_from_u64(seed))
    }

    #[test]
    fn not_due_before_base_interval() {
        let t0 = Instant::now();
        let mut s = scheduler(1, t0);
        let pl = playlist(&["a.mp4"]);
        // Jitter only adds delay; just under base can never fire.
        let out = s.poll(t0 + BASE - Duration::from_millis(1), &pl).unwrap();
        assert!(out.is_none());
        assert_eq!(s.last_sync_time(), t0);
    }

    #[test]
    fn due_after_base_plus_jitter_max() {
        let t0 = Instant::now();
        let mut s = scheduler(1, t0);
        let pl = playlist(&["a.mp4"]);
        let fire_at = t0 + BASE + JITTER;
        let out = s.poll(fire_at, &pl).unwrap();
        assert_eq!(out.unwrap().file, "a.mp4");
        assert_eq!(s.last_sync_time(), fire_at);
    }

    #[test]
    fn never_fires_twice_within_base_interval() {
        let t0 = Instant::now();
        let mut s = ResyncScheduler::new(BASE, Duration::ZERO, t0, StdRng::seed_from_u64(3));
        let pl = playlist(&["a.mp4"]);
        let first = t0 + BASE;
        assert!(s.poll(first, &pl).unwrap().is_some());
        assert!(s
            .poll(first + BASE - Duration::from_millis(1), &pl)
            .unwrap()
            .is_none());
        assert!(s.poll(first + BASE, &pl).unwrap().is_some());
    }

    #[test]
    fn jitter_redrawn_once_per_firing() {
        let t0 = Instant::now();
        let mut s = scheduler(5, t0);
        let pl = playlist(&["a.mp4"]);
        // Polling without firing must not touch the pending delay.
        let pending = s.next_delay();
        assert!(s.poll(t0 + Duration::from_secs(1), &pl).unwrap().is_none());
        assert_eq!(s.next_delay(), pending);

        let mut delays = std::collections::HashSet::new();
        let mut now = t0;
        for _ in 0..5 {
            now += BASE + JITTER;
            assert!(s.poll(now, &pl).unwrap().is_some());
            assert!(s.next_delay() <= JITTER);
            delays.insert(s.next_delay());
        }
        assert!(delays.len() > 1, "jitter must vary across firings");
    }

    #[test]
    fn empty_playlist_at_firing_is_an_error() {
        let t0 = Instant::now();
        let mut s = scheduler(1, t0);
        let empty = Playlist::default();
        assert!(s.poll(t0 + BASE + JITTER, &empty).is_err());
        // Not due yet: the empty playlist is not consulted at all.
        let mut s = scheduler(1, t0);
        assert!(s.poll(t0 + Duration::from_secs(1), &empty).unwrap().is_none());
    }

    #[test]
    fn seeded_firing_is_reproducible() {
        let t0 = Instant::now();
        let pl = playlist(&["a.mp4", "b.mp4", "c.mp4"]);
        let fire_at = t0 + BASE + JITTER;

        let mut s1 = scheduler(9, t0);
        let mut s2 = scheduler(9, t0);
        let picked1 = s1.poll(fire_at, &pl).unwrap().unwrap().clone();
        let picked2 = s2.poll(fire_at, &pl).unwrap().unwrap().clone();
        assert_eq!(picked1, picked2);
        assert_eq!(s1.last_sync_time(), fire_at);
        assert_eq!(s1.next_delay(), s2.next_delay());
    }
}
