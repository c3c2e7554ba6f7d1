//! Load the playlist file the resync scheduler picks from.

use std::path::Path;

use anyhow::Context as _;
use serde::Deserialize;
use synk_core::{Playlist, PlaylistEntry};

#[derive(Debug, Deserialize)]
struct PlaylistFile {
    #[serde(default)]
    entries: Vec<PlaylistEntry>,
}

/// Load and validate the playlist. Sync events carry the file reference as a
/// single wire token, so references with whitespace are rejected here rather
/// than producing unparseable datagrams later. An empty playlist is rejected
/// too; a fleet with nothing to sync to is a configuration error.
pub fn load(path: &Path) -> anyhow::Result<Playlist> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading playlist {}", path.display()))?;
    let file: PlaylistFile =
        toml::from_str(&text).with_context(|| format!("parsing playlist {}", path.display()))?;
    for entry in &file.entries {
        if entry.file.is_empty() || entry.file.contains(char::is_whitespace) {
            anyhow::bail!(
                "playlist {}: file reference {:?} must be a single non-empty token",
                path.display(),
                entry.file
            );
        }
    }
    if file.entries.is_empty() {
        anyhow::bail!("playlist {} has no entries", path.display());
    }
    Ok(Playlist::new(file.entries))
}
