//! The render contract: one versioned [`Frame`] per resolve cycle plus
//! countdown ticks and one-shot notices.
use std::fmt::{self, Display};

use alloy::primitives::Address;
use chrono::{DateTime, Utc};

use crate::{
    chain::Network,
    error::DashboardError,
    holding::Holding,
    resolver::Resolution,
    session::SessionContext,
    transfer::TransferRecord,
};

/// Bumped whenever the shape of [`Frame`] changes.
pub const FRAME_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub version: u32,
    /// Session the frame was resolved for
    pub context: SessionContext,
    /// `None` when the context named a network the registry does not know
    pub network: Option<Network>,
    pub holdings: Resolution<Holding>,
    pub transfers: Resolution<TransferRecord>,
    pub watchlist: Vec<Holding>,
    pub total_usd: f64,
    pub updated_at: DateTime<Utc>,
}

impl Frame {
    pub fn new(
        context: SessionContext,
        network: Option<Network>,
        holdings: Resolution<Holding>,
        transfers: Resolution<TransferRecord>,
        watchlist: Vec<Holding>,
    ) -> Self {
        let total_usd = holdings.items().iter().map(Holding::usd_value).sum();
        Self {
            version: FRAME_VERSION,
            context,
            network,
            holdings,
            transfers,
            watchlist,
            total_usd,
            updated_at: Utc::now(),
        }
    }

    /// Frame for a context whose network could not be resolved.
    pub fn unresolved(context: SessionContext, error: DashboardError) -> Self {
        let (holdings, transfers) = if context.wallet.is_some() {
            (
                Resolution::Failed(error.clone()),
                Resolution::Failed(error),
            )
        } else {
            (Resolution::NoWallet, Resolution::NoWallet)
        };
        Self::new(context, None, holdings, transfers, Vec::new())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    WalletConnected(Address),
    WalletDisconnected,
    NetworkSwitched { network: String },
    /// The wallet provider is absent; reads go through the configured RPC
    FallbackRpc { network: String },
    TokenAdded { symbol: String },
    Problem(DashboardError),
}

impl Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WalletConnected(wallet) => write!(f, "connected wallet {wallet}"),
            Self::WalletDisconnected => write!(f, "wallet disconnected"),
            Self::NetworkSwitched { network } => write!(f, "switched to {network}"),
            Self::FallbackRpc { network } => {
                write!(f, "no wallet provider, using fallback RPC for {network}")
            }
            Self::TokenAdded { symbol } => write!(f, "added {symbol} to the token list"),
            Self::Problem(DashboardError::UserRejected) => {
                write!(f, "request was rejected in the wallet")
            }
            Self::Problem(DashboardError::ProviderAbsent) => {
                write!(f, "no wallet provider found, install one to connect")
            }
            Self::Problem(e) => write!(f, "{e}"),
        }
    }
}

pub trait Renderer: Send + Sync {
    fn render(&self, frame: &Frame);

    fn countdown(&self, remaining: u32);

    fn notice(&self, notice: &Notice);
}
