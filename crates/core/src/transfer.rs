use std::fmt::Display;

use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chain::Network;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Inbound,
    Outbound,
}

impl Direction {
    /// A transfer is inbound when its recipient is the wallet, compared
    /// case-insensitively. Unparseable recipients count as outbound.
    pub fn for_wallet(wallet: &Address, to_address: &str) -> Self {
        match to_address.trim().parse::<Address>() {
            Ok(to) if to == *wallet => Self::Inbound,
            _ => Self::Outbound,
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Inbound => write!(f, "IN"),
            Direction::Outbound => write!(f, "OUT"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub direction: Direction,
    pub symbol: String,
    pub amount: f64,
    pub timestamp: DateTime<Utc>,
    pub tx_hash: String,
}

impl TransferRecord {
    pub fn explorer_url(&self, network: &Network) -> String {
        network.explorer_tx_link(&self.tx_hash)
    }
}

impl Display for TransferRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} at {}",
            self.direction,
            self.amount,
            self.symbol,
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        )
    }
}
