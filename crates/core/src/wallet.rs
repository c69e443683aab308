//! Wallet provider seam and the connect / switch-network flows built on it.
use alloy::primitives::Address;
use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::{
    chain::Network,
    error::DashboardError,
    render::Notice,
    session::{Session, SessionContext},
};

/// Provider error code for a user rejecting a request.
pub const USER_REJECTED_CODE: i64 = 4001;
/// Provider error code for a chain the wallet does not know yet.
pub const UNRECOGNIZED_CHAIN_CODE: i64 = 4902;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("user rejected the request")]
    UserRejected,
    #[error("no wallet provider")]
    ProviderAbsent,
    #[error("chain is not known to the wallet")]
    UnrecognizedChain,
    #[error("wallet error: {0}")]
    Other(String),
}

impl WalletError {
    pub fn from_code(code: i64, message: impl Into<String>) -> Self {
        match code {
            USER_REJECTED_CODE => Self::UserRejected,
            UNRECOGNIZED_CHAIN_CODE => Self::UnrecognizedChain,
            _ => Self::Other(message.into()),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError>;

    /// `chain_id` is the `0x`-prefixed hex chain id.
    async fn switch_network(&self, chain_id: &str) -> Result<(), WalletError>;

    async fn add_network(&self, network: &Network) -> Result<(), WalletError>;
}

/// Provider backed by an address from configuration. Network requests are
/// accepted as-is.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredWallet {
    address: Option<Address>,
}

impl ConfiguredWallet {
    pub fn new(address: Option<Address>) -> Self {
        Self { address }
    }
}

#[async_trait]
impl WalletProvider for ConfiguredWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        self.address
            .map(|address| vec![address])
            .ok_or(WalletError::ProviderAbsent)
    }

    async fn switch_network(&self, _chain_id: &str) -> Result<(), WalletError> {
        Ok(())
    }

    async fn add_network(&self, _network: &Network) -> Result<(), WalletError> {
        Ok(())
    }
}

/// Asks the provider for accounts and makes the first one the session wallet.
#[instrument(skip_all)]
pub async fn connect(
    session: &Session,
    provider: &dyn WalletProvider,
) -> Result<SessionContext, DashboardError> {
    let accounts = provider.request_accounts().await.map_err(|e| match e {
        WalletError::ProviderAbsent => DashboardError::ProviderAbsent,
        WalletError::UserRejected => DashboardError::UserRejected,
        other => {
            warn!(error = %other, "account request failed");
            DashboardError::UserRejected
        }
    })?;

    let Some(wallet) = accounts.first() else {
        info!("wallet returned no accounts");
        return Err(DashboardError::UserRejected);
    };

    Ok(session.connect_wallet(*wallet))
}

/// Switches the session to `key` and asks the provider to follow.
///
/// The session switches even when the provider refuses or is missing; the
/// outcome of the provider request is reported through the returned notices.
#[instrument(skip(session, provider))]
pub async fn switch_network(
    session: &Session,
    provider: &dyn WalletProvider,
    key: &str,
) -> Result<(SessionContext, Vec<Notice>), DashboardError> {
    let network = session.registry().get(key)?.clone();
    let ctx = session.switch_network(key)?;
    let mut notices = vec![Notice::NetworkSwitched {
        network: network.name.clone(),
    }];

    match provider.switch_network(&network.chain_id_hex()).await {
        Ok(()) => debug!("provider switched network"),
        Err(WalletError::UnrecognizedChain) => {
            debug!("provider does not know the chain, requesting addition");
            if let Err(e) = provider.add_network(&network).await {
                warn!(error = %e, "provider failed to add network");
            }
        }
        Err(WalletError::ProviderAbsent) => notices.push(Notice::FallbackRpc {
            network: network.name.clone(),
        }),
        Err(WalletError::UserRejected) => {
            notices.push(Notice::Problem(DashboardError::UserRejected))
        }
        Err(e) => warn!(error = %e, "provider network switch failed"),
    }

    Ok((ctx, notices))
}
