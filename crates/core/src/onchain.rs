//! ERC-20 balance reads straight from a network's RPC endpoint.
use std::time::Duration;

use alloy::{
    primitives::{Address, U256},
    providers::ProviderBuilder,
    sol,
    transports::http::reqwest::Url,
};
use async_trait::async_trait;
use num_bigint::BigUint;
use tracing::{debug, instrument};

use crate::{chain::Network, error::FetchError, holding::scale_units};

// Taken from https://github.com/OpenZeppelin/openzeppelin-contracts/blob/3790c59623e99cb0272ddf84e6a17a5979d06b35/contracts/token/ERC20/IERC20.sol
sol!(
    #[sol(rpc)]
    contract IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function decimals() external view returns (uint8);
    }
);

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenBalanceReader: Send + Sync {
    /// Decimal-adjusted balance of `owner` in the token contract at `token`.
    async fn balance_of(
        &self,
        network: &Network,
        token: Address,
        owner: Address,
    ) -> Result<f64, FetchError>;
}

#[derive(Debug, Clone)]
pub struct RpcBalanceReader {
    timeout: Duration,
}

impl RpcBalanceReader {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl TokenBalanceReader for RpcBalanceReader {
    #[instrument(skip_all, fields(network.key = %network.key, %token, %owner))]
    async fn balance_of(
        &self,
        network: &Network,
        token: Address,
        owner: Address,
    ) -> Result<f64, FetchError> {
        let rpc_error = |message: String| FetchError::Rpc {
            endpoint: network.rpc_url.clone(),
            message,
        };

        let url = network
            .rpc_url
            .parse::<Url>()
            .map_err(|e| rpc_error(format!("invalid rpc url: {e}")))?;
        let provider = ProviderBuilder::new().connect_http(url);
        let contract = IERC20::new(token, provider);

        let read = async {
            let raw: U256 = contract
                .balanceOf(owner)
                .call()
                .await
                .map_err(|e| rpc_error(e.to_string()))?;
            let decimals: u8 = contract
                .decimals()
                .call()
                .await
                .map_err(|e| rpc_error(e.to_string()))?;
            Ok::<_, FetchError>((raw, decimals))
        };

        let (raw, decimals) = tokio::time::timeout(self.timeout, read)
            .await
            .map_err(|_| FetchError::Timeout {
                endpoint: network.rpc_url.clone(),
            })??;

        let raw = BigUint::from_bytes_be(&raw.to_be_bytes::<32usize>());
        let balance = scale_units(&raw, u32::from(decimals));
        debug!(balance, decimals, "read on-chain token balance");
        Ok(balance)
    }
}
