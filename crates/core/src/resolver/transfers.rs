use std::sync::Arc;

use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use tracing::{debug, instrument, warn};

use super::{Resolution, UNKNOWN_SYMBOL};
use crate::{
    chain::Network,
    holding::normalize_amount,
    indexer::{RawTransfer, WalletIndexer},
    transfer::{Direction, TransferRecord},
};

/// Recent transfer history. Not cached: every cycle fetches a fresh feed.
pub struct TransferFeedResolver {
    indexer: Arc<dyn WalletIndexer>,
    limit: usize,
}

impl TransferFeedResolver {
    pub fn new(indexer: Arc<dyn WalletIndexer>, limit: usize) -> Self {
        Self { indexer, limit }
    }

    /// The `limit` most recent transfers of `wallet`, newest first.
    #[instrument(skip_all, fields(network.key = %network.key))]
    pub async fn resolve(
        &self,
        network: &Network,
        wallet: Option<Address>,
    ) -> Resolution<TransferRecord> {
        let Some(wallet) = wallet else {
            debug!("no wallet connected, skipping transfers");
            return Resolution::NoWallet;
        };

        match self
            .indexer
            .transfers(wallet, &network.indexer_code, self.limit)
            .await
        {
            Ok(raw) => {
                let mut records = raw
                    .into_iter()
                    .map(|raw| to_transfer_record(raw, &wallet))
                    .collect::<Vec<_>>();
                records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
                records.truncate(self.limit);

                debug!(count = records.len(), "resolved transfers");
                Resolution::from_items(records)
            }
            Err(e) => {
                warn!(error = %e, %wallet, "transfer fetch failed");
                Resolution::Failed(e.into())
            }
        }
    }
}

pub fn to_transfer_record(raw: RawTransfer, wallet: &Address) -> TransferRecord {
    let direction = raw
        .to_address
        .as_deref()
        .map_or(Direction::Outbound, |to| Direction::for_wallet(wallet, to));

    let timestamp = raw
        .block_timestamp
        .as_deref()
        .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
        .map_or(DateTime::<Utc>::UNIX_EPOCH, |ts| ts.with_timezone(&Utc));

    TransferRecord {
        direction,
        symbol: raw
            .token_symbol
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_SYMBOL.to_string()),
        amount: raw
            .value
            .map_or(0.0, |value| normalize_amount(&value, raw.token_decimals)),
        timestamp,
        tx_hash: raw.transaction_hash.unwrap_or_default(),
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
    const OTHER: &str = "0x0000000000000000000000000000000000000bee";

    fn wallet() -> Address {
        WALLET.parse().expect("valid address")
    }

    fn raw(to: &str, symbol: &str, value: &str, ts: &str, hash: &str) -> RawTransfer {
        RawTransfer {
            to_address: Some(to.to_string()),
            from_address: Some(OTHER.to_string()),
            value: Some(value.to_string()),
            token_symbol: Some(symbol.to_string()),
            token_decimals: Some(6),
            block_timestamp: Some(ts.to_string()),
            transaction_hash: Some(hash.to_string()),
        }
    }

    #[tokio::test]
    async fn feed_is_newest_first_with_directions() {
        let mut indexer = MockWalletIndexer::new();
        indexer
            .expect_transfers()
            .withf(|_, code, limit| code == "0x89a" && *limit == 15)
            .times(1)
            .returning(|_, _, _| {
                Ok(vec![
                    raw(OTHER, "USDC", "1000000", "2024-05-01T10:00:00.000Z", "0x01"),
                    raw(&WALLET.to_lowercase(), "DAI", "2500000", "2024-05-03T10:00:00.000Z", "0x03"),
                    raw(OTHER, "USDC", "500000", "2024-05-02T10:00:00.000Z", "0x02"),
                ])
            });
        let resolver = TransferFeedResolver::new(Arc::new(indexer), 15);

        let feed = resolver.resolve(&Network::pulsechain(), Some(wallet())).await;
        let records = feed.items();

        let hashes = records.iter().map(|r| r.tx_hash.as_str()).collect::<Vec<_>>();
        assert_eq!(hashes, ["0x03", "0x02", "0x01"]);
        assert_eq!(records[0].direction, Direction::Inbound);
        assert_eq!(records[0].amount, 2.5);
        assert_eq!(records[1].direction, Direction::Outbound);
    }

    #[tokio::test]
    async fn feed_failure_yields_failed_outcome() {
        let mut indexer = MockWalletIndexer::new();
        indexer.expect_transfers().returning(|_, _, _| {
            Err(FetchError::Decode {
                endpoint: "indexer".to_string(),
                message: "expected object".to_string(),
            })
        });
        let resolver = TransferFeedResolver::new(Arc::new(indexer), 15);

        let feed = resolver.resolve(&Network::pulsechain(), Some(wallet())).await;

        assert!(feed.is_no_data());
        assert!(matches!(feed, Resolution::Failed(DashboardError::FetchFailed(_))));
    }

    #[test]
    fn malformed_transfer_fields_get_safe_defaults() {
        let record = to_transfer_record(
            RawTransfer {
                value: Some("oops".to_string()),
                block_timestamp: Some("yesterday".to_string()),
                ..RawTransfer::default()
            },
            &wallet(),
        );

        assert_eq!(record.direction, Direction::Outbound);
        assert_eq!(record.symbol, UNKNOWN_SYMBOL);
        assert_eq!(record.amount, 0.0);
        assert_eq!(record.timestamp, DateTime::<Utc>::UNIX_EPOCH);
    }
}
