use std::{collections::HashMap, path::PathBuf, time::Duration};

use alloy::primitives::Address;
use color_eyre::eyre::{self, WrapErr as _};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Yaml},
};
use serde::{Deserialize, Serialize};

use crate::chain::NetworkRegistry;

pub const CONFIG_FILE: &str = "tokenboard.yaml";
pub const ENV_PREFIX: &str = "TOKENBOARD_";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Address handed out by the configured wallet provider
    pub wallet: Option<String>,

    /// Network that is active when the session starts
    pub network: String,

    pub indexer: IndexerConfig,

    pub http: HttpConfig,

    pub cache: CacheConfig,

    pub refresh: RefreshConfig,

    pub store: StoreConfig,

    /// RPC endpoint overrides keyed by network key
    pub rpc: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Base URL of the wallet indexer API
    pub url: String,

    /// API key for the wallet indexer
    pub api_key: String,

    /// Number of transfers fetched per feed resolve
    pub transfer_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(with = "humantime_serde")]
    pub price_ttl: Duration,

    #[serde(with = "humantime_serde")]
    pub holdings_ttl: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Ticks between two resolve cycles
    pub countdown: u32,

    #[serde(with = "humantime_serde")]
    pub tick: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wallet: None,
            network: "pulsechain".to_string(),
            indexer: IndexerConfig {
                url: "https://deep-index.moralis.io/api/v2.2".to_string(),
                api_key: String::new(),
                transfer_limit: 15,
            },
            http: HttpConfig {
                timeout: Duration::from_secs(10),
            },
            cache: CacheConfig {
                price_ttl: Duration::from_secs(60),
                holdings_ttl: Duration::from_secs(180),
            },
            refresh: RefreshConfig {
                countdown: 10,
                tick: Duration::from_secs(1),
            },
            store: StoreConfig {
                path: PathBuf::from("tokenboard-store.json"),
            },
            rpc: HashMap::new(),
        }
    }
}

impl Config {
    /// Load configuration from defaults, an optional config file and the environment
    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Yaml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn network_registry(&self) -> NetworkRegistry {
        NetworkRegistry::with_rpc_overrides(&self.rpc)
    }

    pub fn wallet_address(&self) -> eyre::Result<Option<Address>> {
        self.wallet
            .as_deref()
            .map(str::trim)
            .filter(|wallet| !wallet.is_empty())
            .map(|wallet| {
                wallet
                    .parse::<Address>()
                    .wrap_err_with(|| format!("invalid wallet address `{wallet}`"))
            })
            .transpose()
    }
}

mod humantime_serde {
    use std::time::Duration;

    use serde::{Deserialize as _, Deserializer, Serializer, de::Error as _};

    pub(super) fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&humantime::format_duration(*value).to_string())
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(d)?;
        humantime::parse_duration(&raw).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_survive_a_figment_round_trip() {
        let cfg: Config = Figment::from(Serialized::defaults(Config::default()))
            .extract()
            .expect("defaults must extract");

        assert_eq!(cfg.network, "pulsechain");
        assert_eq!(cfg.indexer.transfer_limit, 15);
        assert_eq!(cfg.http.timeout, Duration::from_secs(10));
        assert_eq!(cfg.cache.price_ttl, Duration::from_secs(60));
        assert_eq!(cfg.cache.holdings_ttl, Duration::from_secs(180));
        assert_eq!(cfg.refresh.countdown, 10);
        assert_eq!(cfg.refresh.tick, Duration::from_secs(1));
        assert!(cfg.wallet.is_none());
    }

    #[test]
    fn nested_values_can_be_overridden() {
        let cfg: Config = Figment::from(Serialized::defaults(Config::default()))
            .merge(Serialized::default("cache.holdings_ttl", "5m"))
            .merge(Serialized::default("refresh.countdown", 30))
            .extract()
            .expect("overrides must extract");

        assert_eq!(cfg.cache.holdings_ttl, Duration::from_secs(300));
        assert_eq!(cfg.refresh.countdown, 30);
    }

    #[test]
    fn wallet_address_is_validated() {
        let mut cfg = Config::default();
        assert!(cfg.wallet_address().expect("absent is fine").is_none());

        cfg.wallet = Some("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed".to_string());
        assert!(cfg.wallet_address().expect("valid address").is_some());

        cfg.wallet = Some("0xnot-an-address".to_string());
        assert!(cfg.wallet_address().is_err());
    }
}
