//! Static network lookup table and RPC endpoint resolution.

use crate::config::schema::{MintBotConfig, NetworkConfig};

/// A network the bot knows how to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownNetwork {
    pub name: &'static str,
    pub chain_id: u64,
}

/// Networks with a fixed chain id.
pub const KNOWN_NETWORKS: &[KnownNetwork] = &[
    KnownNetwork { name: "ethereum", chain_id: 1 },
    KnownNetwork { name: "sepolia", chain_id: 11_155_111 },
    KnownNetwork { name: "polygon", chain_id: 137 },
    KnownNetwork { name: "polygon-amoy", chain_id: 80_002 },
    KnownNetwork { name: "arbitrum", chain_id: 42_161 },
    KnownNetwork { name: "arbitrum-sepolia", chain_id: 421_614 },
    KnownNetwork { name: "optimism", chain_id: 10 },
    KnownNetwork { name: "base", chain_id: 8_453 },
    KnownNetwork { name: "base-sepolia", chain_id: 84_532 },
];

/// Look up a network by name (case-insensitive).
pub fn lookup(name: &str) -> Option<&'static KnownNetwork> {
    let name = name.to_ascii_lowercase();
    KNOWN_NETWORKS.iter().find(|n| n.name == name)
}

/// Environment variable consulted when a network has no configured RPC URL,
/// e.g. `RPC_URL_ARBITRUM_SEPOLIA`.
pub fn rpc_env_var(network: &str) -> String {
    format!("RPC_URL_{}", network.to_ascii_uppercase().replace('-', "_"))
}

/// Resolve the endpoints for `network`: config table first, then the
/// `RPC_URL_<NETWORK>` variable provided by `env`.
pub fn resolve_endpoints<F>(config: &MintBotConfig, network: &str, env: F) -> Option<NetworkConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let key = network.to_ascii_lowercase();
    if let Some(entry) = config.networks.get(&key) {
        if !entry.rpc_url.trim().is_empty() {
            return Some(entry.clone());
        }
    }

    env(&rpc_env_var(&key))
        .filter(|url| !url.trim().is_empty())
        .map(|rpc_url| NetworkConfig {
            rpc_url,
            failover_urls: config
                .networks
                .get(&key)
                .map(|n| n.failover_urls.clone())
                .unwrap_or_default(),
        })
}
