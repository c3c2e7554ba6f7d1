//! Playlist: ordered entries with a file reference; opaque except for random selection.

use rand::Rng;
use serde::Deserialize;

/// One playlist entry. `file` is the reference broadcast in sync events and
/// must be a single token (no whitespace); the loader enforces that.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlaylistEntry {
    pub file: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// Ordered collection of entries.
#[derive(Debug, Clone, Default)]
pub struct Playlist {
    entries: Vec<PlaylistEntry>,
}

/// A resync fired against a playlist with no entries. This is an operator
/// configuration problem, not a protocol condition, and is fatal.
#[derive(Debug, thiserror::Error)]
#[error("playlist has no entries")]
pub struct EmptyPlaylist;

impl Playlist {
    pub fn new(entries: Vec<PlaylistEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pick one entry uniformly at random.
    pub fn choose<R: Rng>(&self, rng: &mut R) -> Result<&PlaylistEntry, EmptyPlaylist> {
        if self.entries.is_empty() {
            return Err(EmptyPlaylist);
        }
        let idx = rng.gen_range(0..self.entries.len());
        Ok(&self.entries[idx])
    }
}
