//! Per-token USD prices from the token's own price API document.
use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::{cache::TtlCache, error::FetchError, http, store::TrackedToken};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetches the raw JSON document served at `url`.
    async fn price_document(&self, url: &str) -> Result<Value, FetchError>;
}

#[derive(Debug, Clone)]
pub struct HttpPriceSource {
    http: reqwest::Client,
}

impl HttpPriceSource {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl PriceSource for HttpPriceSource {
    async fn price_document(&self, url: &str) -> Result<Value, FetchError> {
        http::get_json(self.http.get(url), url).await
    }
}

/// Pulls a USD price out of a price document of unknown shape.
///
/// Candidates, first usable one wins:
/// 1. `<lowercase symbol>.usd`
/// 2. `priceUSD`
/// 3. `usd` of the first value in the document
///
/// A candidate is usable when it is a positive finite number (or a string
/// holding one). Defaults to 0.
pub fn extract_usd_price(doc: &Value, symbol: &str) -> f64 {
    let by_symbol = doc
        .get(symbol.to_lowercase())
        .and_then(|entry| entry.get("usd"))
        .and_then(usable_price);
    let top_level = || doc.get("priceUSD").and_then(usable_price);
    let first_value = || {
        doc.as_object()
            .and_then(|fields| fields.values().next())
            .and_then(|entry| entry.get("usd"))
            .and_then(usable_price)
    };

    by_symbol.or_else(top_level).or_else(first_value).unwrap_or(0.0)
}

fn usable_price(value: &Value) -> Option<f64> {
    let price = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    (price.is_finite() && price > 0.0).then_some(price)
}

pub struct PriceResolver {
    source: Arc<dyn PriceSource>,
    cache: TtlCache<f64>,
    ttl: Duration,
}

impl PriceResolver {
    pub fn new(source: Arc<dyn PriceSource>, ttl: Duration) -> Self {
        Self {
            source,
            cache: TtlCache::new(),
            ttl,
        }
    }

    /// USD unit price of `token`, cached per symbol. Failures read as 0 and
    /// are retried on the next call.
    #[instrument(skip_all, fields(token.symbol = %token.symbol))]
    pub async fn price_of(&self, token: &TrackedToken) -> f64 {
        let source = Arc::clone(&self.source);
        let url = token.api.clone();
        let symbol = token.symbol.clone();

        let price = self
            .cache
            .get_or_fetch(&token.symbol, self.ttl, move || async move {
                let doc = source.price_document(&url).await?;
                Ok(extract_usd_price(&doc, &symbol))
            })
            .await;

        match price {
            Ok(price) => {
                debug!(price, "resolved token price");
                price
            }
            Err(e) => {
                warn!(error = %e, "price fetch failed, reporting 0");
                0.0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn token(symbol: &str) -> TrackedToken {
        TrackedToken::featured(symbol)
    }

    #[test]
    fn symbol_keyed_price_wins() {
        let doc = json!({"pls": {"usd": 0.0001}, "priceUSD": 5.0});
        assert_eq!(extract_usd_price(&doc, "PLS"), 0.0001);
    }

    #[test]
    fn price_usd_is_used_when_symbol_field_is_missing() {
        let doc = json!({"name": "PulseX", "priceUSD": 0.00003});
        assert_eq!(extract_usd_price(&doc, "PLSX"), 0.00003);
    }

    #[test]
    fn first_value_usd_is_last_resort() {
        let doc = json!({"pulsechain": {"usd": 2.5}});
        assert_eq!(extract_usd_price(&doc, "PLS"), 2.5);
    }

    #[test]
    fn first_value_follows_document_order() {
        let doc = json!({"zeta": {"eur": 1.0}, "alpha": {"usd": 3.0}});
        assert_eq!(extract_usd_price(&doc, "INC"), 0.0);
    }

    #[test]
    fn zero_candidates_fall_through() {
        let doc = json!({"inc": {"usd": 0}, "priceUSD": "1.75"});
        assert_eq!(extract_usd_price(&doc, "INC"), 1.75);
    }

    #[test]
    fn unrecognized_document_defaults_to_zero() {
        assert_eq!(extract_usd_price(&json!([1, 2, 3]), "INC"), 0.0);
        assert_eq!(extract_usd_price(&json!({"priceUSD": "n/a"}), "INC"), 0.0);
        assert_eq!(extract_usd_price(&json!({"priceUSD": -4.0}), "INC"), 0.0);
    }

    #[tokio::test]
    async fn prices_are_cached_per_symbol() {
        let mut source = MockPriceSource::new();
        source
            .expect_price_document()
            .withf(|url| url == "https://gopulse.com/api/token/PLS")
            .times(1)
            .returning(|_| Ok(json!({"priceUSD": 0.00004})));
        source
            .expect_price_document()
            .withf(|url| url == "https://gopulse.com/api/token/INC")
            .times(1)
            .returning(|_| Ok(json!({"inc": {"usd": 1.2}})));

        let resolver = PriceResolver::new(Arc::new(source), Duration::from_secs(60));

        assert_eq!(resolver.price_of(&token("PLS")).await, 0.00004);
        assert_eq!(resolver.price_of(&token("PLS")).await, 0.00004);
        assert_eq!(resolver.price_of(&token("INC")).await, 1.2);
    }

    #[tokio::test]
    async fn failed_fetch_reads_as_zero_and_is_retried() {
        let mut source = MockPriceSource::new();
        let mut seq = mockall::Sequence::new();
        source
            .expect_price_document()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|url| {
                Err(FetchError::Status {
                    endpoint: url.to_string(),
                    status: 502,
                })
            });
        source
            .expect_price_document()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(json!({"priceUSD": 0.5})));

        let resolver = PriceResolver::new(Arc::new(source), Duration::from_secs(60));

        assert_eq!(resolver.price_of(&token("PLSX")).await, 0.0);
        assert_eq!(resolver.price_of(&token("PLSX")).await, 0.5);
    }

    #[tokio::test(start_paused = true)]
    async fn unanswered_price_api_reads_as_zero() {
        let endpoint = crate::http::hung_endpoint().await;
        let http = crate::http::client(Duration::from_secs(10)).expect("client");
        let resolver = PriceResolver::new(
            Arc::new(HttpPriceSource::new(http)),
            Duration::from_secs(60),
        );
        let token = TrackedToken::custom("HEX", &endpoint, "PulseChain", None).expect("valid token");

        let started = tokio::time::Instant::now();
        assert_eq!(resolver.price_of(&token).await, 0.0);
        assert!(started.elapsed() >= Duration::from_secs(10));
    }
}
