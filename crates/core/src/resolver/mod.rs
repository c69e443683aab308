//! Resolvers turn a wallet/network pair into domain data. They never fail
//! towards their caller: failures are logged and reported as a
//! [`Resolution::Failed`] outcome that renders like an empty one.
use crate::error::DashboardError;

pub use holdings::{HoldingsResolver, normalize_holding};
pub use transfers::{TransferFeedResolver, to_transfer_record};
pub use watchlist::WatchlistResolver;

mod holdings;
mod transfers;
mod watchlist;

/// Symbol shown for tokens whose source omits one.
pub const UNKNOWN_SYMBOL: &str = "UNKNOWN";

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<T> {
    /// Nothing was fetched because no wallet is connected
    NoWallet,
    /// The source answered with no entries
    Empty,
    Loaded(Vec<T>),
    /// The source could not be queried; the error has already been logged
    Failed(DashboardError),
}

impl<T> Resolution<T> {
    pub fn from_items(items: Vec<T>) -> Self {
        if items.is_empty() {
            Self::Empty
        } else {
            Self::Loaded(items)
        }
    }

    pub fn items(&self) -> &[T] {
        match self {
            Self::Loaded(items) => items,
            Self::NoWallet | Self::Empty | Self::Failed(_) => &[],
        }
    }

    /// Whether the outcome renders as "no data", regardless of why.
    pub fn is_no_data(&self) -> bool {
        self.items().is_empty()
    }

    /// The condition behind an outcome without items.
    pub fn condition(&self) -> Option<DashboardError> {
        match self {
            Self::Loaded(_) => None,
            Self::NoWallet => Some(DashboardError::NoWallet),
            Self::Empty => Some(DashboardError::EmptyResult),
            Self::Failed(e) => Some(e.clone()),
        }
    }
}
