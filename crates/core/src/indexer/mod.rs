//! Client for the wallet indexing API (holdings and transfer history by
//! wallet and network).
use alloy::primitives::Address;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::{config::IndexerConfig, error::FetchError, http};

pub use dto::{RawHolding, RawTransfer, TransferPage};
mod dto;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WalletIndexer: Send + Sync {
    /// All fungible-token holdings of `wallet` on the network with indexer code `network_code`.
    async fn holdings(
        &self,
        wallet: Address,
        network_code: &str,
    ) -> Result<Vec<RawHolding>, FetchError>;

    /// The most recent `limit` token transfers involving `wallet`.
    async fn transfers(
        &self,
        wallet: Address,
        network_code: &str,
        limit: usize,
    ) -> Result<Vec<RawTransfer>, FetchError>;
}

#[derive(Debug, Clone)]
pub struct MoralisClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl MoralisClient {
    pub fn new(http: reqwest::Client, cfg: &IndexerConfig) -> Self {
        Self {
            http,
            base_url: cfg.url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let request = self
            .http
            .get(url)
            .query(query)
            .header("X-API-Key", &self.api_key);
        http::get_json(request, url).await
    }
}

#[async_trait]
impl WalletIndexer for MoralisClient {
    #[instrument(skip(self, wallet), fields(%wallet))]
    async fn holdings(
        &self,
        wallet: Address,
        network_code: &str,
    ) -> Result<Vec<RawHolding>, FetchError> {
        let url = format!("{}/{wallet}/erc20", self.base_url);
        let holdings: Vec<RawHolding> = self
            .get_json(&url, &[("chain", network_code.to_string())])
            .await?;

        debug!(count = holdings.len(), "fetched holdings from indexer");
        Ok(holdings)
    }

    #[instrument(skip(self, wallet), fields(%wallet))]
    async fn transfers(
        &self,
        wallet: Address,
        network_code: &str,
        limit: usize,
    ) -> Result<Vec<RawTransfer>, FetchError> {
        let url = format!("{}/{wallet}/erc20/transfers", self.base_url);
        let page: TransferPage = self
            .get_json(
                &url,
                &[("chain", network_code.to_string()), ("limit", limit.to_string())],
            )
            .await?;

        debug!(count = page.result.len(), "fetched transfers from indexer");
        Ok(page.result)
    }
}
