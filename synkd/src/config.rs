//! Load config from file and environment.

use anyhow::Context as _;
use serde::Deserialize;
use std::path::PathBuf;

/// Daemon configuration. File: ~/.config/synkd/config.toml or /etc/synkd/config.toml.
/// Env overrides: SYNKD_DISCOVERY_PORT, SYNKD_PUBLISH_PORT, SYNKD_PLAYLIST.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Heartbeat announce interval in seconds (default 5).
    #[serde(default = "default_heartbeat_period_s")]
    pub heartbeat_period_s: u64,
    /// Stale-peer sweep interval in seconds (default 5).
    #[serde(default = "default_cleanup_period_s")]
    pub cleanup_period_s: u64,
    /// Subscriber snapshot interval in seconds (default 5).
    #[serde(default = "default_publish_period_s")]
    pub publish_period_s: u64,
    /// Base interval between self-originated resyncs in seconds (default 300).
    #[serde(default = "default_resync_base_interval_s")]
    pub resync_base_interval_s: u64,
    /// Max random jitter added to the resync interval in seconds (default 60).
    #[serde(default = "default_resync_jitter_max_s")]
    pub resync_jitter_max_s: u64,
    /// Multiplier on the heartbeat period defining the liveness window (default 5).
    #[serde(default = "default_eviction_factor")]
    pub eviction_factor: u32,
    /// Discovery UDP port (default 47100).
    #[serde(default = "default_discovery_port")]
    pub discovery_port: u16,
    /// Broadcast destination for heartbeats (default 255.255.255.255).
    #[serde(default = "default_broadcast_addr")]
    pub broadcast_addr: String,
    /// Publish channel bind address (default 127.0.0.1).
    #[serde(default = "default_publish_bind")]
    pub publish_bind: String,
    /// Publish channel TCP port (default 47101).
    #[serde(default = "default_publish_port")]
    pub publish_port: u16,
    /// Playlist file (default /etc/synkd/playlist.toml).
    #[serde(default = "default_playlist_path")]
    pub playlist_path: PathBuf,
    /// Override the reported hostname (default: ask the OS).
    #[serde(default)]
    pub hostname: Option<String>,
    /// Override the announced address (default: local route address).
    #[serde(default)]
    pub address: Option<String>,
    /// Log filter when RUST_LOG/SYNKD_LOG is unset (default "info").
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_heartbeat_period_s() -> u64 {
    5
}
fn default_cleanup_period_s() -> u64 {
    5
}
fn default_publish_period_s() -> u64 {
    5
}
fn default_resync_base_interval_s() -> u64 {
    300
}
fn default_resync_jitter_max_s() -> u64 {
    60
}
fn default_eviction_factor() -> u32 {
    5
}
fn default_discovery_port() -> u16 {
    47100
}
fn default_broadcast_addr() -> String {
    "255.255.255.255".to_string()
}
fn default_publish_bind() -> String {
    "127.0.0.1".to_string()
}
fn default_publish_port() -> u16 {
    47101
}
fn default_playlist_path() -> PathBuf {
    PathBuf::from("/etc/synkd/playlist.toml")
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            heartbeat_period_s: default_heartbeat_period_s(),
            cleanup_period_s: default_cleanup_period_s(),
            publish_period_s: default_publish_period_s(),
            resync_base_interval_s: default_resync_base_interval_s(),
            resync_jitter_max_s: default_resync_jitter_max_s(),
            eviction_factor: default_eviction_factor(),
            discovery_port: default_discovery_port(),
            broadcast_addr: default_broadcast_addr(),
            publish_bind: default_publish_bind(),
            publish_port: default_publish_port(),
            playlist_path: default_playlist_path(),
            hostname: None,
            address: None,
            log_level: default_log_level(),
        }
    }
}

/// Load config: defaults, then the first config file found (if any), then env
/// vars. A file that exists but does not parse is a startup error.
pub fn load() -> anyhow::Result<Config> {
    let mut c = match first_config_file() {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config {}", path.display()))?;
            toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => Config::default(),
    };
    if let Ok(s) = std::env::var("SYNKD_DISCOVERY_PORT") {
        if let Ok(p) = s.parse::<u16>() {
            c.discovery_port = p;
        }
    }
    if let Ok(s) = std::env::var("SYNKD_PUBLISH_PORT") {
        if let Ok(p) = s.parse::<u16>() {
            c.publish_port = p;
        }
    }
    if let Ok(s) = std::env::var("SYNKD_PLAYLIST") {
        c.playlist_path = PathBuf::from(s);
    }
    for (name, value) in [
        ("heartbeat_period_s", c.heartbeat_period_s),
        ("cleanup_period_s", c.cleanup_period_s),
        ("publish_period_s", c.publish_period_s),
    ] {
        if value == 0 {
            anyhow::bail!("{} must be at least 1", name);
        }
    }
    Ok(c)
}

fn config_paths() -> Vec<PathBuf> {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    let mut out = Vec::new();
    if let Some(h) = home {
        out.push(h.join(".config/synkd/config.toml"));
    }
    out.push(PathBuf::from("/etc/synkd/config.toml"));
    out
}

fn first_config_file() -> Option<PathBuf> {
    config_paths().into_iter().find(|p| p.exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = Config::default();
        assert_eq!(c.heartbeat_period_s, 5);
        assert_eq!(c.resync_base_interval_s, 300);
        assert_eq!(c.resync_jitter_max_s, 60);
        assert_eq!(c.eviction_factor, 5);
        assert_eq!(c.discovery_port, 47100);
        assert_eq!(c.publish_port, 47101);
        assert_eq!(c.broadcast_addr, "255.255.255.255");
        assert_eq!(c.log_level, "info");
        assert!(c.hostname.is_none());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let c: Config = toml::from_str(
            r#"
            discovery_port = 5005
            heartbeat_period_s = 2
            hostname = "wall-3"
            "#,
        )
        .unwrap();
        assert_eq!(c.discovery_port, 5005);
        assert_eq!(c.heartbeat_period_s, 2);
        assert_eq!(c.hostname.as_deref(), Some("wall-3"));
        assert_eq!(c.publish_period_s, 5);
    }

    #[test]
    fn unknown_field_is_rejected() {
        assert!(toml::from_str::<Config>("no_such_field = 1").is_err());
    }
}
