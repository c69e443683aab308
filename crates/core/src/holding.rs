use std::{fmt::Display, str::FromStr as _};

use num_bigint::BigUint;
use num_traits::ToPrimitive as _;
use serde::{Deserialize, Serialize};

/// Decimals assumed when a source does not report them.
pub const DEFAULT_DECIMALS: u32 = 18;

pub const PLACEHOLDER_LOGO: &str = "https://via.placeholder.com/32";

/// A wallet's balance of one token on one network, decimal-normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    pub name: String,
    pub address: Option<String>,
    pub logo: String,
    pub balance: f64,
    pub usd_price: f64,
    pub network: String,
}

impl Holding {
    pub fn usd_value(&self) -> f64 {
        self.balance * self.usd_price
    }
}

impl Display for Holding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} - {}: {:.4} {} (${:.2}) on {}",
            self.symbol,
            self.name,
            self.balance,
            self.symbol,
            self.usd_value(),
            self.network
        )
    }
}

/// Scales a raw integer amount down by `10^decimals`.
pub fn scale_units(raw: &BigUint, decimals: u32) -> f64 {
    let value = raw.to_f64().unwrap_or(0.0);
    let exp = i32::try_from(decimals).unwrap_or(i32::MAX);
    non_negative(value / 10f64.powi(exp))
}

/// Normalizes a raw integer amount string, defaulting decimals to 18 and
/// malformed amounts to zero.
pub fn normalize_amount(raw: &str, decimals: Option<u32>) -> f64 {
    match BigUint::from_str(raw.trim()) {
        Ok(raw) => scale_units(&raw, decimals.unwrap_or(DEFAULT_DECIMALS)),
        Err(_) => 0.0,
    }
}

/// Clamps anything that is not a finite, non-negative number to zero.
pub fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}
