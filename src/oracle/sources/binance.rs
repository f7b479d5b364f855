//! Binance ticker price client
//!
//! USDT pairs are taken as USD.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::{http_client, parse_price, QuoteProvider, SourceError};
use crate::types::Asset;

const BINANCE_REST_URL: &str = "https://api.binance.com/api/v3/ticker/price";

const SUPPORTED: &[&str] = &[
    "BTC", "ETH", "LTC", "BCH", "XLM", "ADA", "DASH", "ZEC", "BNB", "XMR", "EUR", "GBP",
];

#[derive(Debug, Deserialize)]
struct TickerPrice {
    symbol: String,
    price: String,
}

#[derive(Debug, Clone)]
pub struct BinanceSource {
    client: reqwest::Client,
}

impl BinanceSource {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
        })
    }

    fn trading_pair(asset: &Asset) -> String {
        format!("{}USDT", asset)
    }
}

#[async_trait]
impl QuoteProvider for BinanceSource {
    fn name(&self) -> &str {
        "Binance"
    }

    fn supports(&self, asset: &Asset) -> bool {
        SUPPORTED.contains(&asset.as_str())
    }

    async fn fetch_quote(&self, asset: &Asset) -> Result<f64, SourceError> {
        let symbol = Self::trading_pair(asset);
        let ticker: TickerPrice = self
            .client
            .get(BINANCE_REST_URL)
            .query(&[("symbol", symbol.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if ticker.symbol != symbol {
            return Err(SourceError::Response(format!(
                "asked for {symbol}, got {}",
                ticker.symbol
            )));
        }
        parse_price(&ticker.price)
    }
}
