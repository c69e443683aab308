use std::sync::Arc;

use alloy::primitives::Address;
use futures::future::join_all;
use tracing::{instrument, warn};

use crate::{
    chain::Network,
    holding::{Holding, PLACEHOLDER_LOGO},
    onchain::TokenBalanceReader,
    price::PriceResolver,
    store::TrackedToken,
};

/// Prices (and, where a contract address is known, balances) for the user's
/// token list.
pub struct WatchlistResolver {
    prices: PriceResolver,
    balances: Arc<dyn TokenBalanceReader>,
}

impl WatchlistResolver {
    pub fn new(prices: PriceResolver, balances: Arc<dyn TokenBalanceReader>) -> Self {
        Self { prices, balances }
    }

    #[instrument(skip_all, fields(network.key = %network.key, tokens = tokens.len()))]
    pub async fn resolve(
        &self,
        network: &Network,
        wallet: Option<Address>,
        tokens: &[TrackedToken],
    ) -> Vec<Holding> {
        join_all(
            tokens
                .iter()
                .map(|token| self.resolve_token(network, wallet, token)),
        )
        .await
    }

    async fn resolve_token(
        &self,
        network: &Network,
        wallet: Option<Address>,
        token: &TrackedToken,
    ) -> Holding {
        let (usd_price, balance) = tokio::join!(
            self.prices.price_of(token),
            self.balance_of(network, wallet, token)
        );

        Holding {
            symbol: token.symbol.clone(),
            name: if token.name.trim().is_empty() {
                token.symbol.clone()
            } else {
                token.name.clone()
            },
            address: token.address.clone(),
            logo: token
                .logo
                .clone()
                .unwrap_or_else(|| PLACEHOLDER_LOGO.to_string()),
            balance,
            usd_price,
            network: token.chain.clone(),
        }
    }

    async fn balance_of(
        &self,
        network: &Network,
        wallet: Option<Address>,
        token: &TrackedToken,
    ) -> f64 {
        let (Some(owner), Some(contract)) = (wallet, token.address.as_deref()) else {
            return 0.0;
        };

        let Ok(contract) = contract.trim().parse::<Address>() else {
            warn!(token.symbol = %token.symbol, contract, "token has an invalid contract address");
            return 0.0;
        };

        self.balances
            .balance_of(network, contract, owner)
            .await
            .unwrap_or_else(|e| {
                warn!(token.symbol = %token.symbol, error = %e, "on-chain balance read failed, reporting 0");
                0.0
            })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::{error::FetchError, onchain::MockTokenBalanceReader, price::MockPriceSource};

    const WALLET: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
    const HEX_CONTRACT: &str = "0x2b591e99afe9f32eaa6214f7b7629768c40eeb39";

    fn price_resolver() -> PriceResolver {
        let mut source = MockPriceSource::new();
        source
            .expect_price_document()
            .returning(|_| Ok(json!({"priceUSD": 0.5})));
        PriceResolver::new(Arc::new(source), Duration::from_secs(60))
    }

    fn hex_token() -> TrackedToken {
        TrackedToken::custom(
            "HEX",
            "https://gopulse.com/api/token/HEX",
            "PulseChain",
            Some(HEX_CONTRACT.to_string()),
        )
        .expect("valid token")
    }

    #[tokio::test]
    async fn balances_are_read_only_for_tokens_with_a_contract() {
        let mut balances = MockTokenBalanceReader::new();
        balances
            .expect_balance_of()
            .times(1)
            .returning(|_, _, _| Ok(12.0));
        let resolver = WatchlistResolver::new(price_resolver(), Arc::new(balances));

        let holdings = resolver
            .resolve(
                &Network::pulsechain(),
                Some(WALLET.parse().expect("valid address")),
                &[TrackedToken::featured("PLS"), hex_token()],
            )
            .await;

        assert_eq!(holdings.len(), 2);
        assert_eq!(holdings[0].balance, 0.0);
        assert_eq!(holdings[0].usd_price, 0.5);
        assert_eq!(holdings[1].balance, 12.0);
        assert_eq!(holdings[1].usd_value(), 6.0);
        assert_eq!(holdings[1].logo, PLACEHOLDER_LOGO);
    }

    #[tokio::test]
    async fn failed_balance_read_reports_zero() {
        let mut balances = MockTokenBalanceReader::new();
        balances.expect_balance_of().returning(|network, _, _| {
            Err(FetchError::Timeout {
                endpoint: network.rpc_url.clone(),
            })
        });
        let resolver = WatchlistResolver::new(price_resolver(), Arc::new(balances));

        let holdings = resolver
            .resolve(
                &Network::pulsechain(),
                Some(WALLET.parse().expect("valid address")),
                &[hex_token()],
            )
            .await;

        assert_eq!(holdings[0].balance, 0.0);
        assert_eq!(holdings[0].usd_price, 0.5);
    }

    #[tokio::test]
    async fn without_wallet_no_balance_is_read() {
        let mut balances = MockTokenBalanceReader::new();
        balances.expect_balance_of().never();
        let resolver = WatchlistResolver::new(price_resolver(), Arc::new(balances));

        let holdings = resolver
            .resolve(&Network::pulsechain(), None, &[hex_token()])
            .await;

        assert_eq!(holdings[0].balance, 0.0);
    }
}
