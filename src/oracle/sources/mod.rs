//! Price source implementations (FixedUSD, Coinbase, Binance, CoinGecko)

mod binance;
mod coinbase;
mod coingecko;
mod fixed;

pub use binance::BinanceSource;
pub use coinbase::CoinbaseSource;
pub use coingecko::CoinGeckoSource;
pub use fixed::{FixedUsd, FIXED_USD};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::types::Asset;

/// Why a single (source, asset) quote could not be produced
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SourceError {
    #[error("{provider} does not quote {asset}")]
    Unsupported { provider: String, asset: Asset },
    #[error("request failed: {0}")]
    Http(String),
    #[error("API returned status {0}")]
    Status(u16),
    #[error("unexpected response: {0}")]
    Response(String),
    #[error("unusable price {0}")]
    InvalidPrice(f64),
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => SourceError::Status(status.as_u16()),
            None => SourceError::Http(e.to_string()),
        }
    }
}

/// Trait for price quote providers
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Get the source name
    fn name(&self) -> &str;

    /// Whether this source can quote `asset` at all
    fn supports(&self, asset: &Asset) -> bool;

    /// Fetch the current USD price of `asset`
    async fn fetch_quote(&self, asset: &Asset) -> Result<f64, SourceError>;
}

/// Shared HTTP client for the REST sources
pub(crate) fn http_client(timeout: Duration) -> anyhow::Result<reqwest::Client> {
    use anyhow::Context;

    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("priority-compare/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to create HTTP client")
}

/// Parse a price field that APIs send as a decimal string
pub(crate) fn parse_price(raw: &str) -> Result<f64, SourceError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| SourceError::Response(format!("not a number: {raw:?}")))
}
