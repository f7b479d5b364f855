//! CoinGecko simple price client

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

use super::{http_client, QuoteProvider, SourceError};
use crate::types::Asset;

const COINGECKO_REST_URL: &str = "https://api.coingecko.com/api/v3/simple/price";

/// Ticker -> CoinGecko coin id
fn coin_id(asset: &Asset) -> Option<&'static str> {
    let id = match asset.as_str() {
        "BTC" => "bitcoin",
        "ETH" => "ethereum",
        "LTC" => "litecoin",
        "BCH" => "bitcoin-cash",
        "XLM" => "stellar",
        "ADA" => "cardano",
        "DASH" => "dash",
        "ZEC" => "zcash",
        "XMR" => "monero",
        "BNB" => "binancecoin",
        "FCT" => "factom",
        _ => return None,
    };
    Some(id)
}

/// `{"bitcoin": {"usd": 43000.1}}`
type SimplePrice = HashMap<String, HashMap<String, f64>>;

#[derive(Debug, Clone)]
pub struct CoinGeckoSource {
    client: reqwest::Client,
}

impl CoinGeckoSource {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
        })
    }

    fn extract(body: &SimplePrice, id: &str) -> Result<f64, SourceError> {
        body.get(id)
            .and_then(|prices| prices.get("usd"))
            .copied()
            .ok_or_else(|| SourceError::Response(format!("no usd price for {id}")))
    }
}

#[async_trait]
impl QuoteProvider for CoinGeckoSource {
    fn name(&self) -> &str {
        "CoinGecko"
    }

    fn supports(&self, asset: &Asset) -> bool {
        coin_id(asset).is_some()
    }

    async fn fetch_quote(&self, asset: &Asset) -> Result<f64, SourceError> {
        let id = coin_id(asset).ok_or_else(|| SourceError::Unsupported {
            provider: self.name().to_string(),
            asset: asset.clone(),
        })?;

        let body: SimplePrice = self
            .client
            .get(COINGECKO_REST_URL)
            .query(&[("ids", id), ("vs_currencies", "usd")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Self::extract(&body, id)
    }
}
