//! One full resolve cycle: holdings, transfer feed and watchlist for a
//! session context.
use std::sync::Arc;

use alloy::primitives::Address;
use async_trait::async_trait;
use color_eyre::eyre;
use tracing::{debug, instrument, warn};

use crate::{
    chain::{Network, NetworkRegistry},
    config::Config,
    holding::Holding,
    http,
    indexer::{MoralisClient, WalletIndexer},
    onchain::{RpcBalanceReader, TokenBalanceReader},
    price::{HttpPriceSource, PriceResolver, PriceSource},
    render::Frame,
    resolver::{HoldingsResolver, Resolution, TransferFeedResolver, WatchlistResolver},
    session::SessionContext,
    store::TokenStore,
    transfer::TransferRecord,
};

#[async_trait]
pub trait CycleResolver: Send + Sync {
    /// Resolves everything a frame shows for `context`. Never fails: problems
    /// end up as failed outcomes inside the frame.
    async fn resolve(&self, context: &SessionContext) -> Frame;
}

pub struct Dashboard {
    registry: NetworkRegistry,
    holdings: HoldingsResolver,
    transfers: TransferFeedResolver,
    watchlist: WatchlistResolver,
    tokens: TokenStore,
}

impl Dashboard {
    pub fn new(
        registry: NetworkRegistry,
        holdings: HoldingsResolver,
        transfers: TransferFeedResolver,
        watchlist: WatchlistResolver,
        tokens: TokenStore,
    ) -> Self {
        Self {
            registry,
            holdings,
            transfers,
            watchlist,
            tokens,
        }
    }

    /// Wires the HTTP and RPC backed sources described by `config`.
    pub fn from_config(config: &Config, tokens: TokenStore) -> eyre::Result<Self> {
        let http = http::client(config.http.timeout)?;

        let indexer: Arc<dyn WalletIndexer> =
            Arc::new(MoralisClient::new(http.clone(), &config.indexer));
        let prices: Arc<dyn PriceSource> = Arc::new(HttpPriceSource::new(http));
        let balances: Arc<dyn TokenBalanceReader> =
            Arc::new(RpcBalanceReader::new(config.http.timeout));

        if config.indexer.api_key.is_empty() {
            warn!("no indexer api key configured, holdings and transfers will fail");
        }

        Ok(Self::new(
            config.network_registry(),
            HoldingsResolver::new(Arc::clone(&indexer), config.cache.holdings_ttl),
            TransferFeedResolver::new(indexer, config.indexer.transfer_limit),
            WatchlistResolver::new(
                PriceResolver::new(prices, config.cache.price_ttl),
                balances,
            ),
            tokens,
        ))
    }

    pub fn registry(&self) -> &NetworkRegistry {
        &self.registry
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub async fn holdings(&self, network: &Network, wallet: Option<Address>) -> Resolution<Holding> {
        self.holdings.resolve(network, wallet).await
    }

    pub async fn transfers(
        &self,
        network: &Network,
        wallet: Option<Address>,
    ) -> Resolution<TransferRecord> {
        self.transfers.resolve(network, wallet).await
    }

    pub async fn watchlist(&self, network: &Network, wallet: Option<Address>) -> Vec<Holding> {
        let tokens = self.tokens.load_or_featured().await;
        self.watchlist.resolve(network, wallet, &tokens).await
    }
}

#[async_trait]
impl CycleResolver for Dashboard {
    #[instrument(name = "resolve_cycle", skip_all, fields(generation = context.generation, network.key = %context.network))]
    async fn resolve(&self, context: &SessionContext) -> Frame {
        let network = match self.registry.get(&context.network) {
            Ok(network) => network.clone(),
            Err(e) => {
                warn!(error = %e, "cannot resolve for unknown network");
                return Frame::unresolved(context.clone(), e);
            }
        };

        let (holdings, transfers, watchlist) = tokio::join!(
            self.holdings(&network, context.wallet),
            self.transfers(&network, context.wallet),
            self.watchlist(&network, context.wallet),
        );

        let frame = Frame::new(context.clone(), Some(network), holdings, transfers, watchlist);
        debug!(total_usd = frame.total_usd, "resolve cycle complete");
        frame
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::{
        error::{DashboardError, FetchError},
        indexer::{MockWalletIndexer, RawHolding},
        onchain::MockTokenBalanceReader,
        price::MockPriceSource,
        render::FRAME_VERSION,
        store::MemoryStore,
    };

    const WALLET: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

    fn dashboard(indexer: MockWalletIndexer) -> Dashboard {
        let indexer: Arc<dyn WalletIndexer> = Arc::new(indexer);
        let mut prices = MockPriceSource::new();
        prices
            .expect_price_document()
            .returning(|_| Ok(json!({"pls": {"usd": 0.0001}})));
        let mut balances = MockTokenBalanceReader::new();
        balances.expect_balance_of().never();

        Dashboard::new(
            NetworkRegistry::with_defaults(),
            HoldingsResolver::new(Arc::clone(&indexer), Duration::from_secs(180)),
            TransferFeedResolver::new(indexer, 15),
            WatchlistResolver::new(
                PriceResolver::new(Arc::new(prices), Duration::from_secs(60)),
                Arc::new(balances),
            ),
            TokenStore::new(Arc::new(MemoryStore::default())),
        )
    }

    #[tokio::test]
    async fn holdings_and_transfers_fail_independently() {
        let mut indexer = MockWalletIndexer::new();
        indexer.expect_holdings().returning(|_, _| {
            Ok(vec![RawHolding {
                symbol: Some("PLS".to_string()),
                balance: Some("3000000000000000000".to_string()),
                usd_price: Some(2.0),
                ..RawHolding::default()
            }])
        });
        indexer.expect_transfers().returning(|_, _, _| {
            Err(FetchError::Timeout {
                endpoint: "indexer".to_string(),
            })
        });
        let dashboard = dashboard(indexer);

        let context = SessionContext {
            generation: 7,
            network: "pulsechain".to_string(),
            wallet: Some(WALLET.parse().expect("valid address")),
        };
        let frame = dashboard.resolve(&context).await;

        assert_eq!(frame.version, FRAME_VERSION);
        assert_eq!(frame.context, context);
        assert_eq!(frame.holdings.items().len(), 1);
        assert_eq!(frame.total_usd, 6.0);
        assert!(matches!(frame.transfers, Resolution::Failed(_)));
        // INC, PLSX and PLS from the featured list
        assert_eq!(frame.watchlist.len(), 3);
    }

    #[tokio::test]
    async fn unknown_network_yields_failed_frame() {
        let mut indexer = MockWalletIndexer::new();
        indexer.expect_holdings().never();
        indexer.expect_transfers().never();
        let dashboard = dashboard(indexer);

        let frame = dashboard
            .resolve(&SessionContext {
                generation: 1,
                network: "solana".to_string(),
                wallet: Some(WALLET.parse().expect("valid address")),
            })
            .await;

        assert!(frame.network.is_none());
        assert_eq!(
            frame.holdings,
            Resolution::Failed(DashboardError::NetworkUnsupported("solana".to_string()))
        );
        assert_eq!(frame.total_usd, 0.0);
    }
}
