//! Coinbase spot price client
//!
//! Uses the public v2 prices endpoint, one request per asset.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::{http_client, parse_price, QuoteProvider, SourceError};
use crate::types::Asset;

const COINBASE_REST_URL: &str = "https://api.coinbase.com/v2/prices";

const SUPPORTED: &[&str] = &[
    "BTC", "ETH", "LTC", "BCH", "XLM", "ADA", "DASH", "ZEC", "EUR", "GBP", "JPY", "CAD", "CHF",
    "XAU",
];

#[derive(Debug, Deserialize)]
struct SpotResponse {
    data: SpotData,
}

#[derive(Debug, Deserialize)]
struct SpotData {
    amount: String,
    #[serde(default)]
    currency: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CoinbaseSource {
    client: reqwest::Client,
}

impl CoinbaseSource {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
        })
    }

    fn spot_url(asset: &Asset) -> String {
        format!("{}/{}-USD/spot", COINBASE_REST_URL, asset)
    }

    fn parse(body: SpotResponse) -> Result<f64, SourceError> {
        if let Some(currency) = body.data.currency.as_deref() {
            if currency != "USD" {
                return Err(SourceError::Response(format!(
                    "quoted in {currency} instead of USD"
                )));
            }
        }
        parse_price(&body.data.amount)
    }
}

#[async_trait]
impl QuoteProvider for CoinbaseSource {
    fn name(&self) -> &str {
        "Coinbase"
    }

    fn supports(&self, asset: &Asset) -> bool {
        SUPPORTED.contains(&asset.as_str())
    }

    async fn fetch_quote(&self, asset: &Asset) -> Result<f64, SourceError> {
        let body: SpotResponse = self
            .client
            .get(Self::spot_url(asset))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Self::parse(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_spot_url() {
        assert_eq!(
            CoinbaseSource::spot_url(&Asset::new("btc")),
            "https://api.coinbase.com/v2/prices/BTC-USD/spot"
        );
    }

    #[test]
    fn parses_spot_body() {
        let body: SpotResponse = serde_json::from_str(
            r#"{"data":{"amount":"43012.55","base":"BTC","currency":"USD"}}"#,
        )
        .unwrap();
        assert_eq!(CoinbaseSource::parse(body), Ok(43012.55));
    }

    #[test]
    fn rejects_foreign_currency() {
        let body: SpotResponse =
            serde_json::from_str(r#"{"data":{"amount":"1.0","currency":"EUR"}}"#).unwrap();
        assert!(matches!(
            CoinbaseSource::parse(body),
            Err(SourceError::Response(_))
        ));
    }
}
