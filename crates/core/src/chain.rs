use std::{
    collections::HashMap,
    fmt::{self, Display},
};

use alloy_chains::Chain;

use crate::error::DashboardError;

/// Indexer network code used when a key has no entry of its own.
pub const FALLBACK_INDEXER_CODE: &str = "eth";

const EXPLORER_TX_URL: &str = "https://explorer.pulsechain.com/tx/{hash}";

// key, display name, chain id, default rpc, indexer code
const DEFAULT_NETWORKS: &[(&str, &str, u64, &str, &str)] = &[
    ("pulsechain", "PulseChain", 0x89A, "https://rpc.pulsechain.com", "0x89a"),
    (
        "ethereum",
        "Ethereum",
        0x1,
        "https://mainnet.infura.io/v3/YOUR_INFURA_KEY",
        "eth",
    ),
    (
        "avalanche",
        "Avalanche",
        0xA86A,
        "https://api.avax.network/ext/bc/C/rpc",
        "avalanche",
    ),
    ("polygon", "Polygon", 0x89, "https://polygon-rpc.com", "polygon"),
    ("binance", "Binance", 0x38, "https://bsc-dataseed.binance.org", "bsc"),
];

/// Maps a network key to the wallet indexer's network code.
pub fn indexer_code_for(key: &str) -> &'static str {
    DEFAULT_NETWORKS
        .iter()
        .find(|(k, ..)| *k == key)
        .map_or(FALLBACK_INDEXER_CODE, |(.., code)| code)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Network {
    pub key: String,
    pub name: String,
    pub metadata: Chain,
    pub rpc_url: String,
    pub indexer_code: String,
    pub explorer_tx_url: String,
}

impl Network {
    pub fn new(key: &str, name: &str, chain_id: u64, rpc_url: &str) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            metadata: Chain::from_id(chain_id),
            rpc_url: rpc_url.to_string(),
            indexer_code: indexer_code_for(key).to_string(),
            explorer_tx_url: EXPLORER_TX_URL.to_string(),
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.metadata.id()
    }

    /// Chain id in the `0x`-prefixed form wallet providers expect.
    pub fn chain_id_hex(&self) -> String {
        format!("{:#x}", self.chain_id())
    }

    pub fn explorer_tx_link(&self, hash: &str) -> String {
        self.explorer_tx_url.replace("{hash}", hash)
    }

    #[cfg(test)]
    pub fn pulsechain() -> Self {
        Self::new("pulsechain", "PulseChain", 0x89A, "https://rpc.pulsechain.com")
    }

    #[cfg(test)]
    pub fn polygon() -> Self {
        Self::new("polygon", "Polygon", 0x89, "https://polygon-rpc.com")
    }
}

impl Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (id={})", self.name, self.chain_id())
    }
}

/// The static set of networks the dashboard can switch between.
#[derive(Debug, Clone)]
pub struct NetworkRegistry {
    networks: Vec<Network>,
}

impl NetworkRegistry {
    pub fn with_defaults() -> Self {
        Self::with_rpc_overrides(&HashMap::new())
    }

    pub fn with_rpc_overrides(overrides: &HashMap<String, String>) -> Self {
        let networks = DEFAULT_NETWORKS
            .iter()
            .map(|(key, name, chain_id, rpc_url, _)| {
                let rpc_url = overrides.get(*key).map_or(*rpc_url, String::as_str);
                Network::new(key, name, *chain_id, rpc_url)
            })
            .collect();
        Self { networks }
    }

    pub fn get(&self, key: &str) -> Result<&Network, DashboardError> {
        self.networks
            .iter()
            .find(|network| network.key == key)
            .ok_or_else(|| DashboardError::NetworkUnsupported(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Network> {
        self.networks.iter()
    }
}

impl Default for NetworkRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
