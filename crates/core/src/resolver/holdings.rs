use std::{sync::Arc, time::Duration};

use alloy::primitives::Address;
use tracing::{debug, instrument, warn};

use super::{Resolution, UNKNOWN_SYMBOL};
use crate::{
    cache::TtlCache,
    chain::Network,
    holding::{Holding, PLACEHOLDER_LOGO, non_negative, normalize_amount},
    indexer::{RawHolding, WalletIndexer},
};

pub struct HoldingsResolver {
    indexer: Arc<dyn WalletIndexer>,
    cache: TtlCache<Vec<Holding>>,
    ttl: Duration,
}

impl HoldingsResolver {
    pub fn new(indexer: Arc<dyn WalletIndexer>, ttl: Duration) -> Self {
        Self {
            indexer,
            cache: TtlCache::new(),
            ttl,
        }
    }

    /// Normalized token holdings of `wallet` on `network`, cached per
    /// wallet and network.
    #[instrument(skip_all, fields(network.key = %network.key))]
    pub async fn resolve(&self, network: &Network, wallet: Option<Address>) -> Resolution<Holding> {
        let Some(wallet) = wallet else {
            debug!("no wallet connected, skipping holdings");
            return Resolution::NoWallet;
        };

        let key = format!("{wallet}_{}", network.key);
        let indexer = Arc::clone(&self.indexer);
        let code = network.indexer_code.clone();
        let network_name = network.name.clone();

        let fetched = self
            .cache
            .get_or_fetch(&key, self.ttl, move || async move {
                let raw = indexer.holdings(wallet, &code).await?;
                Ok(raw
                    .into_iter()
                    .map(|raw| normalize_holding(raw, &network_name))
                    .collect::<Vec<_>>())
            })
            .await;

        match fetched {
            Ok(holdings) => {
                debug!(count = holdings.len(), "resolved holdings");
                Resolution::from_items(holdings)
            }
            Err(e) => {
                warn!(error = %e, %wallet, "holdings fetch failed");
                Resolution::Failed(e.into())
            }
        }
    }
}

/// Applies decimal normalization and display fallbacks to an indexer entry.
pub fn normalize_holding(raw: RawHolding, network: &str) -> Holding {
    let RawHolding {
        name,
        symbol,
        token_address,
        logo,
        balance,
        decimals,
        usd_price,
    } = raw;

    let symbol = symbol
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_SYMBOL.to_string());

    Holding {
        name: name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| symbol.clone()),
        symbol,
        address: token_address,
        logo: logo
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| PLACEHOLDER_LOGO.to_string()),
        balance: balance.map_or(0.0, |b| normalize_amount(&b, decimals)),
        usd_price: usd_price.map_or(0.0, non_negative),
        network: network.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{DashboardError, FetchError},
        indexer::MockWalletIndexer,
    };

    const WALLET: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
    const HOLDINGS_TTL: Duration = Duration::from_secs(180);

    fn wallet() -> Option<Address> {
        Some(WALLET.parse().expect("valid address"))
    }

    fn plsx() -> RawHolding {
        RawHolding {
            name: Some("PulseX".to_string()),
            symbol: Some("PLSX".to_string()),
            token_address: Some("0x95b303987a60c71504d99aa1b13b4da07b0790ab".to_string()),
            logo: None,
            balance: Some("2500000000000000000000".to_string()),
            decimals: None,
            usd_price: Some(0.00002),
        }
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let holding = normalize_holding(
            RawHolding {
                symbol: Some("HEX".to_string()),
                balance: Some("not-a-number".to_string()),
                decimals: Some(8),
                usd_price: Some(f64::NAN),
                ..RawHolding::default()
            },
            "PulseChain",
        );

        assert_eq!(holding.name, "HEX");
        assert_eq!(holding.logo, PLACEHOLDER_LOGO);
        assert_eq!(holding.balance, 0.0);
        assert_eq!(holding.usd_price, 0.0);
        assert_eq!(holding.usd_value(), 0.0);
    }

    #[tokio::test]
    async fn no_wallet_skips_the_indexer() {
        let mut indexer = MockWalletIndexer::new();
        indexer.expect_holdings().never();
        let resolver = HoldingsResolver::new(Arc::new(indexer), HOLDINGS_TTL);

        let resolved = resolver.resolve(&Network::pulsechain(), None).await;

        assert_eq!(resolved, Resolution::NoWallet);
    }

    #[tokio::test]
    async fn holdings_are_normalized_and_cached() {
        let mut indexer = MockWalletIndexer::new();
        indexer
            .expect_holdings()
            .withf(|_, code| code == "polygon")
            .times(1)
            .returning(|_, _| Ok(vec![plsx()]));
        let resolver = HoldingsResolver::new(Arc::new(indexer), HOLDINGS_TTL);

        let first = resolver.resolve(&Network::polygon(), wallet()).await;
        let second = resolver.resolve(&Network::polygon(), wallet()).await;

        assert_eq!(first, second);
        let holdings = first.items();
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].symbol, "PLSX");
        assert_eq!(holdings[0].balance, 2500.0);
        assert_eq!(holdings[0].network, "Polygon");
        assert!((holdings[0].usd_value() - 0.05).abs() < 1e-12);
    }

    #[tokio::test]
    async fn each_network_has_its_own_cache_entry() {
        let mut indexer = MockWalletIndexer::new();
        indexer
            .expect_holdings()
            .times(2)
            .returning(|_, _| Ok(vec![plsx()]));
        let resolver = HoldingsResolver::new(Arc::new(indexer), HOLDINGS_TTL);

        resolver.resolve(&Network::polygon(), wallet()).await;
        resolver.resolve(&Network::pulsechain(), wallet()).await;
    }

    #[tokio::test]
    async fn empty_wallet_differs_from_failed_fetch() {
        let mut empty = MockWalletIndexer::new();
        empty.expect_holdings().returning(|_, _| Ok(vec![]));
        let mut failing = MockWalletIndexer::new();
        failing.expect_holdings().returning(|_, code| {
            Err(FetchError::Status {
                endpoint: format!("indexer/{code}"),
                status: 401,
            })
        });

        let empty = HoldingsResolver::new(Arc::new(empty), HOLDINGS_TTL)
            .resolve(&Network::pulsechain(), wallet())
            .await;
        let failed = HoldingsResolver::new(Arc::new(failing), HOLDINGS_TTL)
            .resolve(&Network::pulsechain(), wallet())
            .await;

        assert_eq!(empty, Resolution::Empty);
        assert!(matches!(
            failed,
            Resolution::Failed(DashboardError::FetchFailed(FetchError::Status {
                status: 401,
                ..
            }))
        ));
    }
}
