//! Wire shapes of the wallet indexer. Numeric fields are accepted either as
//! JSON numbers or numeric strings; anything else reads as missing.
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawHolding {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub token_address: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub balance: Option<String>,
    #[serde(default, deserialize_with = "lenient::unsigned")]
    pub decimals: Option<u32>,
    #[serde(
        default,
        rename = "usdPrice",
        alias = "usd_price",
        deserialize_with = "lenient::float"
    )]
    pub usd_price: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransferPage {
    #[serde(default)]
    pub result: Vec<RawTransfer>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawTransfer {
    #[serde(default)]
    pub to_address: Option<String>,
    #[serde(default)]
    pub from_address: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub value: Option<String>,
    #[serde(default)]
    pub token_symbol: Option<String>,
    #[serde(
        default,
        alias = "token_decimal",
        deserialize_with = "lenient::unsigned"
    )]
    pub token_decimals: Option<u32>,
    #[serde(default)]
    pub block_timestamp: Option<String>,
    #[serde(default)]
    pub transaction_hash: Option<String>,
}

mod lenient {
    use serde::{Deserialize as _, Deserializer};
    use serde_json::Value;

    pub(super) fn string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    }

    pub(super) fn unsigned<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        })
    }

    pub(super) fn float<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        })
    }
}
