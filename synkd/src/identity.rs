//! Resolve this node's identity: the hostname and address it announces.

use anyhow::Context as _;

use crate::config::Config;

/// What this node puts in its own heartbeats.
#[derive(Debug, Clone)]
pub struct NodeIdentity {
    pub hostname: String,
    pub address: String,
}

/// Resolve identity from config overrides, falling back to the OS. A node
/// without a resolvable identity cannot announce itself; failure is fatal at
/// startup.
pub fn resolve(cfg: &Config) -> anyhow::Result<NodeIdentity> {
    let hostname = match &cfg.hostname {
        Some(h) => h.clone(),
        None => hostname::get()
            .context("resolving local hostname")?
            .into_string()
            .map_err(|s| anyhow::anyhow!("hostname {:?} is not valid UTF-8", s))?,
    };
    let address = match &cfg.address {
        Some(a) => a.clone(),
        None => local_ip_address::local_ip()
            .context("resolving local address")?
            .to_string(),
    };
    Ok(NodeIdentity { hostname, address })
}
